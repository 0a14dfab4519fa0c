//! charted: ownership chart engine
//!
//! Turns a possibly cyclic, possibly multi-rooted ownership graph of
//! entities and persons into cycle-safe hierarchy trees.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
