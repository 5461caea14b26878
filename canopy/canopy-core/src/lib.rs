//! Canopy Core - shared types for the program-tree similarity engine
//!
//! This crate provides:
//! - [`ast`] - the generalized, notation-agnostic program tree
//! - [`error`] - the workspace error type
//! - [`config`] - TOML/environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`types`] - small shared value types

pub mod ast;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use ast::{Actor, EventCondition, EventListener, Expression, GeneralAst, Statement};
pub use config::{
    CanopyConfig, DEFAULT_MAX_COMBINATIONS, DistanceConfig, GeneralConfig, PoolConfig,
    SelectionConfig,
};
pub use error::{CanopyError, Result};
pub use logging::init_logging;
pub use types::DistanceAlgorithm;
