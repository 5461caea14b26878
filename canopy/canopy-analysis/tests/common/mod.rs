//! Shared fixtures and proptest strategies for integration tests.
#![allow(dead_code)]

use canopy_core::ast::{Actor, EventListener, Expression, GeneralAst, Statement};
use proptest::prelude::*;

const NAMES: &[&str] = &["move", "turn", "say", "jump", "wait"];
const EVENTS: &[&str] = &["start", "click", "keyPressed"];

/// One actor with a single listener running `action`
pub fn program(event: &str, action: Statement) -> GeneralAst {
    GeneralAst::new(vec![Actor::new().with_listener(EventListener::new(event, vec![], action))])
}

/// A small, varied class of submissions
pub fn sample_trees() -> Vec<GeneralAst> {
    let number = |value: &str| Expression::literal("number", value);
    vec![
        program("start", Statement::call("move", vec![number("10")])),
        program("start", Statement::call("move", vec![number("20")])),
        program(
            "start",
            Statement::repeat(
                Some(Expression::operator("<", vec![Expression::variable("i"), number("5")])),
                Statement::sequence(vec![
                    Statement::call("move", vec![]),
                    Statement::assign(
                        "i",
                        Expression::operator("+", vec![Expression::variable("i"), number("1")]),
                    ),
                ]),
            ),
        ),
        program(
            "click",
            Statement::condition(
                Some(Expression::call("touching", vec![Expression::literal("string", "edge")])),
                Statement::call("turn", vec![number("180")]),
                Statement::sequence(vec![]),
            ),
        ),
        GeneralAst::new(vec![
            Actor::new()
                .with_listener(EventListener::new(
                    "start",
                    vec![],
                    Statement::call("dance", vec![]),
                ))
                .with_function(
                    "dance",
                    vec![],
                    Statement::sequence(vec![
                        Statement::call("turn", vec![]),
                        Statement::call("say", vec![]),
                    ]),
                ),
        ]),
        GeneralAst::default(),
    ]
}

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES).prop_map(str::to_string)
}

pub fn arb_expression() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        (0..4u8).prop_map(|n| Expression::literal("number", n.to_string())),
        name().prop_map(Expression::variable),
    ];
    leaf.prop_recursive(2, 6, 2, |inner| {
        prop_oneof![
            (
                prop::sample::select(&["+", "<", "and"][..]),
                prop::collection::vec(inner.clone(), 1..3)
            )
                .prop_map(|(op, operands)| Expression::operator(op, operands)),
            (name(), prop::collection::vec(inner, 0..2))
                .prop_map(|(n, args)| Expression::call(n, args)),
        ]
    })
}

pub fn arb_statement() -> impl Strategy<Value = Statement> {
    let leaf = prop_oneof![
        (name(), prop::collection::vec(arb_expression(), 0..2))
            .prop_map(|(n, args)| Statement::call(n, args)),
        (name(), arb_expression()).prop_map(|(n, value)| Statement::assign(n, value)),
        (name(), prop::option::of(Just("number".to_string())))
            .prop_map(|(n, ty)| Statement::declare(n, ty, None)),
    ];
    leaf.prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Statement::sequence),
            (prop::option::of(arb_expression()), inner.clone(), inner.clone())
                .prop_map(|(c, t, f)| Statement::condition(c, t, f)),
            (prop::option::of(arb_expression()), inner.clone())
                .prop_map(|(c, body)| Statement::repeat(c, body)),
            (name(), prop::collection::vec(name(), 0..2), inner)
                .prop_map(|(n, params, body)| Statement::function_declaration(n, params, body)),
        ]
    })
}

fn arb_listener() -> impl Strategy<Value = EventListener> {
    (
        prop::sample::select(EVENTS),
        prop::collection::vec(arb_expression(), 0..3),
        arb_statement(),
    )
        .prop_map(|(event, parameters, action)| EventListener::new(event, parameters, action))
}

pub fn arb_actor() -> impl Strategy<Value = Actor> {
    (
        prop::collection::vec(arb_listener(), 0..2),
        prop::collection::vec((name(), prop::collection::vec(name(), 0..2), arb_statement()), 0..2),
    )
        .prop_map(|(listeners, functions)| {
            let actor = listeners.into_iter().fold(Actor::new(), Actor::with_listener);
            functions.into_iter().fold(actor, |actor, (n, params, body)| {
                actor.with_function(n, params, body)
            })
        })
}

pub fn arb_ast() -> impl Strategy<Value = GeneralAst> {
    prop::collection::vec(arb_actor(), 0..3).prop_map(GeneralAst::new)
}
