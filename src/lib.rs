//! orgchart: build a company hierarchy from flat records and query it.
//!
//! Layers, from the inside out:
//! - `domain`: records, the arena-backed tree, builder and pure queries
//! - `application`: record loading and the shared hierarchy store
//! - `infrastructure`: filesystem abstraction and service wiring
//! - `cli`: argument parsing, command dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
