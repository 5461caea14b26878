//! Generalized program tree.
//!
//! A [`GeneralAst`] is the notation-agnostic representation of a student
//! program: an ordered list of actors, each holding event listeners and
//! function declarations. Trees are produced once by an upstream translation
//! step and treated as immutable values by everything in this workspace.
//!
//! The serde representation uses camelCase field names and a `"kind"` tag on
//! statements and expressions, so an unknown node kind is rejected while
//! deserializing instead of reaching the analysis code.
//!
//! # Examples
//!
//! ```
//! use canopy_core::ast::{Actor, EventListener, Expression, GeneralAst, Statement};
//!
//! let ast = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
//!     "greenFlag",
//!     vec![],
//!     Statement::sequence(vec![
//!         Statement::call("move", vec![Expression::literal("number", "10")]),
//!         Statement::repeat(None, Statement::call("turn", vec![])),
//!     ]),
//! ))]);
//!
//! assert_eq!(ast.actors().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Ordered sequence of actors making up one submitted program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneralAst(pub Vec<Actor>);

impl GeneralAst {
    pub fn new(actors: Vec<Actor>) -> Self {
        Self(actors)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.0
    }

    /// True when the program has no actors at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of nodes, counting the program root, actors, listeners and
    /// every statement and expression
    pub fn node_count(&self) -> usize {
        1 + self
            .0
            .iter()
            .map(|actor| {
                let listeners: usize = actor
                    .event_listeners
                    .iter()
                    .map(|listener| {
                        1 + listener
                            .condition
                            .parameters
                            .iter()
                            .map(Expression::node_count)
                            .sum::<usize>()
                            + listener.action.node_count()
                    })
                    .sum();
                let declarations: usize = actor
                    .function_declarations
                    .iter()
                    .map(Statement::node_count)
                    .sum();
                1 + listeners + declarations
            })
            .sum::<usize>()
    }
}

impl From<Vec<Actor>> for GeneralAst {
    fn from(actors: Vec<Actor>) -> Self {
        Self(actors)
    }
}

/// A sprite/object in the program together with its scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub event_listeners: Vec<EventListener>,
    /// Each entry is a [`Statement::FunctionDeclaration`]
    pub function_declarations: Vec<Statement>,
}

impl Actor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: EventListener) -> Self {
        self.event_listeners.push(listener);
        self
    }

    /// Add a top-level function declaration
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        parameter_names: Vec<String>,
        body: Statement,
    ) -> Self {
        self.function_declarations
            .push(Statement::function_declaration(name, parameter_names, body));
        self
    }
}

/// A script triggered by an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListener {
    pub condition: EventCondition,
    pub action: Statement,
}

impl EventListener {
    pub fn new(event: impl Into<String>, parameters: Vec<Expression>, action: Statement) -> Self {
        Self {
            condition: EventCondition {
                event: event.into(),
                parameters,
            },
            action,
        }
    }
}

/// The event an [`EventListener`] reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCondition {
    pub event: String,
    pub parameters: Vec<Expression>,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Statement {
    Sequence {
        statements: Vec<Statement>,
    },
    Condition {
        condition: Option<Expression>,
        when_true: Box<Statement>,
        when_false: Box<Statement>,
    },
    Loop {
        condition: Option<Expression>,
        body: Box<Statement>,
    },
    FunctionDeclaration {
        name: String,
        parameter_names: Vec<String>,
        body: Box<Statement>,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
    },
    Assignment {
        variable: String,
        value: Expression,
    },
    VariableDeclaration {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        declared_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
    },
}

impl Statement {
    pub fn sequence(statements: Vec<Statement>) -> Self {
        Self::Sequence { statements }
    }

    pub fn condition(
        condition: Option<Expression>,
        when_true: Statement,
        when_false: Statement,
    ) -> Self {
        Self::Condition {
            condition,
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        }
    }

    /// Build a [`Statement::Loop`]
    pub fn repeat(condition: Option<Expression>, body: Statement) -> Self {
        Self::Loop {
            condition,
            body: Box::new(body),
        }
    }

    pub fn function_declaration(
        name: impl Into<String>,
        parameter_names: Vec<String>,
        body: Statement,
    ) -> Self {
        Self::FunctionDeclaration {
            name: name.into(),
            parameter_names,
            body: Box::new(body),
        }
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::FunctionCall {
            name: name.into(),
            arguments,
        }
    }

    pub fn assign(variable: impl Into<String>, value: Expression) -> Self {
        Self::Assignment {
            variable: variable.into(),
            value,
        }
    }

    pub fn declare(
        name: impl Into<String>,
        declared_type: Option<String>,
        value: Option<Expression>,
    ) -> Self {
        Self::VariableDeclaration {
            name: name.into(),
            declared_type,
            value,
        }
    }

    /// Nodes in this statement subtree
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Sequence { statements } => {
                statements.iter().map(Statement::node_count).sum::<usize>()
            }
            Self::Condition {
                condition,
                when_true,
                when_false,
            } => {
                condition.as_ref().map_or(0, Expression::node_count)
                    + when_true.node_count()
                    + when_false.node_count()
            }
            Self::Loop { condition, body } => {
                condition.as_ref().map_or(0, Expression::node_count) + body.node_count()
            }
            Self::FunctionDeclaration { body, .. } => body.node_count(),
            Self::FunctionCall { arguments, .. } => {
                arguments.iter().map(Expression::node_count).sum::<usize>()
            }
            Self::Assignment { value, .. } => value.node_count(),
            Self::VariableDeclaration { value, .. } => {
                value.as_ref().map_or(0, Expression::node_count)
            }
        }
    }

    /// Name of the variant, as used in serialized trees and labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sequence { .. } => "sequence",
            Self::Condition { .. } => "condition",
            Self::Loop { .. } => "loop",
            Self::FunctionDeclaration { .. } => "functionDeclaration",
            Self::FunctionCall { .. } => "functionCall",
            Self::Assignment { .. } => "assignment",
            Self::VariableDeclaration { .. } => "variableDeclaration",
        }
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Expression {
    Literal {
        #[serde(rename = "type")]
        literal_type: String,
        value: String,
    },
    Variable {
        name: String,
    },
    Operator {
        operator: String,
        operands: Vec<Expression>,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn literal(literal_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Literal {
            literal_type: literal_type.into(),
            value: value.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    pub fn operator(operator: impl Into<String>, operands: Vec<Expression>) -> Self {
        Self::Operator {
            operator: operator.into(),
            operands,
        }
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::FunctionCall {
            name: name.into(),
            arguments,
        }
    }

    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Literal { .. } | Self::Variable { .. } => 0,
            Self::Operator { operands: children, .. }
            | Self::FunctionCall { arguments: children, .. } => {
                children.iter().map(Expression::node_count).sum::<usize>()
            }
        }
    }

    /// Name of the variant, as used in serialized trees and labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Variable { .. } => "variable",
            Self::Operator { .. } => "operator",
            Self::FunctionCall { .. } => "functionCall",
        }
    }
}
