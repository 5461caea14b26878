//! Early-terminable depth-first traversal over the generalized tree.
//!
//! Implement [`AstVisitor`] and hand it to one of the walk functions. Every
//! callback returns a [`WalkAction`]; a [`WalkAction::Stop`] is propagated out
//! of every enclosing call so the walk ends immediately.
//!
//! Traversal is pre-order:
//! - `condition`: condition expression (if any), `when_true`, `when_false`
//! - `loop`: condition (if any), body
//! - `sequence`: children in order
//! - `functionDeclaration`: body, only when
//!   [`WalkOptions::walk_function_declarations`] is set
//! - statement-level `functionCall`: argument expressions
//! - `assignment` / `variableDeclaration`: value expression
//!
//! # Examples
//!
//! ```
//! use canopy_analysis::walker::{AstVisitor, WalkAction, walk_ast};
//! use canopy_core::ast::{Actor, EventListener, GeneralAst, Statement};
//!
//! struct StatementCounter(usize);
//!
//! impl AstVisitor for StatementCounter {
//!     fn visit_statement(&mut self, _statement: &Statement) -> WalkAction {
//!         self.0 += 1;
//!         WalkAction::Continue
//!     }
//! }
//!
//! let ast = GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(
//!     "greenFlag",
//!     vec![],
//!     Statement::sequence(vec![Statement::call("move", vec![])]),
//! ))]);
//!
//! let mut counter = StatementCounter(0);
//! walk_ast(&ast, &mut counter);
//! assert_eq!(counter.0, 2);
//! ```

use canopy_core::ast::{Expression, GeneralAst, Statement};

/// Signal returned by every visitor callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Keep walking
    Continue,
    /// Terminate the whole walk
    Stop,
}

impl WalkAction {
    pub fn is_stop(self) -> bool {
        self == WalkAction::Stop
    }
}

/// Callbacks invoked on every visited node.
///
/// Both methods default to [`WalkAction::Continue`], so a visitor only
/// overrides the node category it cares about.
pub trait AstVisitor {
    fn visit_statement(&mut self, _statement: &Statement) -> WalkAction {
        WalkAction::Continue
    }

    fn visit_expression(&mut self, _expression: &Expression) -> WalkAction {
        WalkAction::Continue
    }
}

/// Traversal options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descend into nested function declaration bodies
    pub walk_function_declarations: bool,
}

impl WalkOptions {
    pub fn including_function_declarations() -> Self {
        Self {
            walk_function_declarations: true,
        }
    }
}

/// Walk every expression in a list, stopping on the first `Stop`
fn walk_expressions<V: AstVisitor + ?Sized>(
    expressions: &[Expression],
    visitor: &mut V,
) -> WalkAction {
    for expression in expressions {
        if walk_expression(expression, visitor).is_stop() {
            return WalkAction::Stop;
        }
    }
    WalkAction::Continue
}

/// Walk an expression subtree.
pub fn walk_expression<V: AstVisitor + ?Sized>(
    expression: &Expression,
    visitor: &mut V,
) -> WalkAction {
    if visitor.visit_expression(expression).is_stop() {
        return WalkAction::Stop;
    }

    match expression {
        Expression::Literal { .. } | Expression::Variable { .. } => WalkAction::Continue,
        Expression::Operator { operands, .. } => walk_expressions(operands, visitor),
        Expression::FunctionCall { arguments, .. } => walk_expressions(arguments, visitor),
    }
}

/// Walk a statement subtree.
pub fn walk_statement<V: AstVisitor + ?Sized>(
    statement: &Statement,
    visitor: &mut V,
    options: WalkOptions,
) -> WalkAction {
    if visitor.visit_statement(statement).is_stop() {
        return WalkAction::Stop;
    }

    match statement {
        Statement::Sequence { statements } => {
            for child in statements {
                if walk_statement(child, visitor, options).is_stop() {
                    return WalkAction::Stop;
                }
            }
            WalkAction::Continue
        }
        Statement::Condition {
            condition,
            when_true,
            when_false,
        } => {
            if let Some(condition) = condition {
                if walk_expression(condition, visitor).is_stop() {
                    return WalkAction::Stop;
                }
            }
            if walk_statement(when_true, visitor, options).is_stop() {
                return WalkAction::Stop;
            }
            walk_statement(when_false, visitor, options)
        }
        Statement::Loop { condition, body } => {
            if let Some(condition) = condition {
                if walk_expression(condition, visitor).is_stop() {
                    return WalkAction::Stop;
                }
            }
            walk_statement(body, visitor, options)
        }
        Statement::FunctionDeclaration { body, .. } => {
            if options.walk_function_declarations {
                walk_statement(body, visitor, options)
            } else {
                WalkAction::Continue
            }
        }
        Statement::FunctionCall { arguments, .. } => walk_expressions(arguments, visitor),
        Statement::Assignment { value, .. } => walk_expression(value, visitor),
        Statement::VariableDeclaration { value, .. } => match value {
            Some(value) => walk_expression(value, visitor),
            None => WalkAction::Continue,
        },
    }
}

/// Walk a whole program with default options.
///
/// Nested declarations are not descended into, but top-level declarations
/// always are.
pub fn walk_ast<V: AstVisitor + ?Sized>(ast: &GeneralAst, visitor: &mut V) -> WalkAction {
    walk_ast_with(ast, visitor, WalkOptions::default())
}

/// Walk a whole program.
///
/// For each actor: every event listener's condition parameters, then its
/// action; then every top-level function declaration, whose body is walked
/// regardless of `options`.
///
/// # Panics
///
/// If an actor's `function_declarations` holds anything other than a
/// [`Statement::FunctionDeclaration`].
pub fn walk_ast_with<V: AstVisitor + ?Sized>(
    ast: &GeneralAst,
    visitor: &mut V,
    options: WalkOptions,
) -> WalkAction {
    for actor in ast.actors() {
        for listener in &actor.event_listeners {
            if walk_expressions(&listener.condition.parameters, visitor).is_stop() {
                return WalkAction::Stop;
            }
            if walk_statement(&listener.action, visitor, options).is_stop() {
                return WalkAction::Stop;
            }
        }

        for declaration in &actor.function_declarations {
            let action = match declaration {
                Statement::FunctionDeclaration { body, .. } => {
                    if visitor.visit_statement(declaration).is_stop() {
                        return WalkAction::Stop;
                    }
                    walk_statement(body, visitor, options)
                }
                other => panic!(
                    "actor function declaration list holds a `{}` statement",
                    other.kind()
                ),
            };
            if action.is_stop() {
                return WalkAction::Stop;
            }
        }
    }

    WalkAction::Continue
}
