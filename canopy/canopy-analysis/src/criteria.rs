//! Named boolean predicates over a program tree.
//!
//! Every criterion is a single walk whose visitor stops at the first node of
//! the target shape. Nested function declarations are walked too, so a
//! criterion answers "is such a node reachable anywhere in the program".

use crate::walker::{AstVisitor, WalkAction, WalkOptions, walk_ast_with};
use canopy_core::ast::{Expression, GeneralAst, Statement};
use canopy_core::error::{CanopyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The available criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    /// A statement- or expression-level call to the named function
    CallsFunction,
    ContainsLoop,
    ContainsCondition,
    ContainsFunctionDeclaration,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::CallsFunction,
        Criterion::ContainsLoop,
        Criterion::ContainsCondition,
        Criterion::ContainsFunctionDeclaration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::CallsFunction => "callsFunction",
            Criterion::ContainsLoop => "containsLoop",
            Criterion::ContainsCondition => "containsCondition",
            Criterion::ContainsFunctionDeclaration => "containsFunctionDeclaration",
        }
    }

    /// Whether the criterion needs a `function_name` input
    pub fn requires_function_name(&self) -> bool {
        matches!(self, Criterion::CallsFunction)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Criterion {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CanopyError::invalid_input(format!("Unknown criterion '{}'", s)))
    }
}

/// Parameters for a criterion
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
}

impl CriterionInput {
    pub fn function_name(name: impl Into<String>) -> Self {
        Self {
            function_name: Some(name.into()),
        }
    }
}

/// A criterion together with its input, as issued in a batch request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionRequest {
    pub criterion: Criterion,
    #[serde(default)]
    pub input: CriterionInput,
}

impl CriterionRequest {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            input: CriterionInput::default(),
        }
    }

    pub fn calls_function(name: impl Into<String>) -> Self {
        Self {
            criterion: Criterion::CallsFunction,
            input: CriterionInput::function_name(name),
        }
    }
}

/// Outcome of one criterion on one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: Criterion,
    pub output: bool,
}

/// Visitor that stops on the first statement or expression matching a predicate
struct ShapeFinder<S, E>
where
    S: Fn(&Statement) -> bool,
    E: Fn(&Expression) -> bool,
{
    statement_matches: S,
    expression_matches: E,
    found: bool,
}

impl<S, E> AstVisitor for ShapeFinder<S, E>
where
    S: Fn(&Statement) -> bool,
    E: Fn(&Expression) -> bool,
{
    fn visit_statement(&mut self, statement: &Statement) -> WalkAction {
        if (self.statement_matches)(statement) {
            self.found = true;
            return WalkAction::Stop;
        }
        WalkAction::Continue
    }

    fn visit_expression(&mut self, expression: &Expression) -> WalkAction {
        if (self.expression_matches)(expression) {
            self.found = true;
            return WalkAction::Stop;
        }
        WalkAction::Continue
    }
}

fn find_shape<S, E>(ast: &GeneralAst, statement_matches: S, expression_matches: E) -> bool
where
    S: Fn(&Statement) -> bool,
    E: Fn(&Expression) -> bool,
{
    let mut finder = ShapeFinder {
        statement_matches,
        expression_matches,
        found: false,
    };
    walk_ast_with(ast, &mut finder, WalkOptions::including_function_declarations());
    finder.found
}

/// True if a function call named `name` is reachable
pub fn calls_function(ast: &GeneralAst, name: &str) -> bool {
    find_shape(
        ast,
        |s| matches!(s, Statement::FunctionCall { name: called, .. } if called == name),
        |e| matches!(e, Expression::FunctionCall { name: called, .. } if called == name),
    )
}

pub fn contains_loop(ast: &GeneralAst) -> bool {
    find_shape(ast, |s| matches!(s, Statement::Loop { .. }), |_| false)
}

pub fn contains_condition(ast: &GeneralAst) -> bool {
    find_shape(ast, |s| matches!(s, Statement::Condition { .. }), |_| false)
}

pub fn contains_function_declaration(ast: &GeneralAst) -> bool {
    find_shape(
        ast,
        |s| matches!(s, Statement::FunctionDeclaration { .. }),
        |_| false,
    )
}

/// Evaluate a single criterion against a tree.
///
/// # Errors
///
/// Returns [`CanopyError::InvalidCriterionInput`] when a required parameter
/// is missing.
///
/// # Panics
///
/// On a malformed tree, see [`walk_ast_with`].
pub fn evaluate(ast: &GeneralAst, criterion: Criterion, input: &CriterionInput) -> Result<bool> {
    match criterion {
        Criterion::CallsFunction => {
            let name = input.function_name.as_deref().ok_or_else(|| {
                CanopyError::invalid_criterion_input(criterion.as_str(), "functionName")
            })?;
            Ok(calls_function(ast, name))
        }
        Criterion::ContainsLoop => Ok(contains_loop(ast)),
        Criterion::ContainsCondition => Ok(contains_condition(ast)),
        Criterion::ContainsFunctionDeclaration => Ok(contains_function_declaration(ast)),
    }
}

/// Evaluate a request, pairing the output with its criterion
pub fn evaluate_request(ast: &GeneralAst, request: &CriterionRequest) -> Result<CriterionResult> {
    Ok(CriterionResult {
        criterion: request.criterion,
        output: evaluate(ast, request.criterion, &request.input)?,
    })
}

/// Serial reference evaluation of every criterion against every tree
pub fn evaluate_all(
    trees: &[GeneralAst],
    criteria: &[CriterionRequest],
) -> Result<Vec<Vec<CriterionResult>>> {
    trees
        .iter()
        .map(|tree| {
            criteria
                .iter()
                .map(|request| evaluate_request(tree, request))
                .collect()
        })
        .collect()
}
