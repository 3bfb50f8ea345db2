//! orchestra-lib: execution core of the orchestra source/build orchestrator.
//!
//! This crate provides:
//! - `Configuration`: the read-only model of components, builds, paths and mirrors
//! - `Action`: units of work (clone, configure, install) and their dependencies
//! - `script`: user/internal script and subprocess execution
//! - `graph`: readiness classification and dependency graph rendering
//! - `remote`: remote branch listing and the persisted remote heads cache

pub mod action;
pub mod config;
pub mod consts;
pub mod environment;
pub mod graph;
pub mod remote;
pub mod script;
pub mod util;
pub mod workspace;
