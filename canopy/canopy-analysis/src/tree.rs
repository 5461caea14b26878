//! Label and children extraction.
//!
//! [`children`] and [`label`] are the only view the distance and clustering
//! algorithms have of a program tree. Two nodes are equal for distance
//! purposes iff their labels are equal.

use canopy_core::ast::{Actor, EventListener, Expression, GeneralAst, Statement};

/// Borrowed view of any node in a [`GeneralAst`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode<'a> {
    Ast(&'a GeneralAst),
    Actor(&'a Actor),
    EventListener(&'a EventListener),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

impl<'a> From<&'a GeneralAst> for TreeNode<'a> {
    fn from(ast: &'a GeneralAst) -> Self {
        TreeNode::Ast(ast)
    }
}

impl<'a> From<&'a Statement> for TreeNode<'a> {
    fn from(statement: &'a Statement) -> Self {
        TreeNode::Statement(statement)
    }
}

impl<'a> From<&'a Expression> for TreeNode<'a> {
    fn from(expression: &'a Expression) -> Self {
        TreeNode::Expression(expression)
    }
}

/// Direct children of a node, in order.
pub fn children<'a>(node: &TreeNode<'a>) -> Vec<TreeNode<'a>> {
    match *node {
        TreeNode::Ast(ast) => ast.actors().iter().map(TreeNode::Actor).collect(),
        TreeNode::Actor(actor) => actor
            .event_listeners
            .iter()
            .map(TreeNode::EventListener)
            .chain(actor.function_declarations.iter().map(TreeNode::Statement))
            .collect(),
        TreeNode::EventListener(listener) => listener
            .condition
            .parameters
            .iter()
            .map(TreeNode::Expression)
            .chain(std::iter::once(TreeNode::Statement(&listener.action)))
            .collect(),
        TreeNode::Statement(statement) => statement_children(statement),
        TreeNode::Expression(expression) => match expression {
            Expression::Literal { .. } | Expression::Variable { .. } => Vec::new(),
            Expression::Operator { operands, .. } => {
                operands.iter().map(TreeNode::Expression).collect()
            }
            Expression::FunctionCall { arguments, .. } => {
                arguments.iter().map(TreeNode::Expression).collect()
            }
        },
    }
}

fn statement_children(statement: &Statement) -> Vec<TreeNode<'_>> {
    match statement {
        Statement::Sequence { statements } => statements.iter().map(TreeNode::Statement).collect(),
        Statement::Condition {
            condition,
            when_true,
            when_false,
        } => condition
            .iter()
            .map(TreeNode::Expression)
            .chain([TreeNode::Statement(when_true), TreeNode::Statement(when_false)])
            .collect(),
        Statement::Loop { condition, body } => condition
            .iter()
            .map(TreeNode::Expression)
            .chain(std::iter::once(TreeNode::Statement(body)))
            .collect(),
        Statement::FunctionDeclaration { body, .. } => vec![TreeNode::Statement(body)],
        Statement::FunctionCall { arguments, .. } => {
            arguments.iter().map(TreeNode::Expression).collect()
        }
        Statement::Assignment { value, .. } => vec![TreeNode::Expression(value)],
        Statement::VariableDeclaration { value, .. } => {
            value.iter().map(TreeNode::Expression).collect()
        }
    }
}

/// Semantic identity of a node: category, kind and distinguishing fields.
///
/// Calls label by name, literals by type and value, variable declarations by
/// name and declared type; loops, conditions and sequences by kind only.
pub fn label(node: &TreeNode<'_>) -> String {
    match *node {
        TreeNode::Ast(_) => "ast".to_string(),
        TreeNode::Actor(_) => "actor".to_string(),
        TreeNode::EventListener(listener) => format!("eventListener:{}", listener.condition.event),
        TreeNode::Statement(statement) => match statement {
            Statement::Sequence { .. } | Statement::Condition { .. } | Statement::Loop { .. } => {
                format!("statement:{}", statement.kind())
            }
            Statement::FunctionDeclaration {
                name,
                parameter_names,
                ..
            } => format!(
                "statement:functionDeclaration:{}({})",
                name,
                parameter_names.join(",")
            ),
            Statement::FunctionCall { name, .. } => format!("statement:functionCall:{}", name),
            Statement::Assignment { variable, .. } => format!("statement:assignment:{}", variable),
            Statement::VariableDeclaration {
                name,
                declared_type,
                ..
            } => format!(
                "statement:variableDeclaration:{}:{}",
                name,
                declared_type.as_deref().unwrap_or("")
            ),
        },
        TreeNode::Expression(expression) => match expression {
            Expression::Literal {
                literal_type,
                value,
            } => format!("expression:literal:{}:{}", literal_type, value),
            Expression::Variable { name } => format!("expression:variable:{}", name),
            Expression::Operator { operator, .. } => format!("expression:operator:{}", operator),
            Expression::FunctionCall { name, .. } => format!("expression:functionCall:{}", name),
        },
    }
}

/// Number of nodes in the subtree rooted at `node`
pub fn subtree_size(node: &TreeNode<'_>) -> usize {
    let mut size = 0;
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        size += 1;
        stack.extend(children(&current));
    }
    size
}

/// Number of nodes in a whole program, including the root
pub fn tree_size(ast: &GeneralAst) -> usize {
    subtree_size(&TreeNode::Ast(ast))
}
