//! depscope - dependency scope resolver for JavaScript/TypeScript projects
//!
//! This crate resolves the set of files reachable from one or more entry
//! points: it builds a merged import graph, filters it through ordered
//! ignore rules, reports import cycles, gathers a depth-bounded file list
//! and caches completed graphs for the lifetime of the process.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod ignore;
pub mod paths;
pub mod progress;
