//! fuzzeval-core - library behind the `fuzzeval` utilities.
//!
//! The utilities support a fuzzing-evaluation pipeline for SMT solvers
//! (cvc5, Z3). Each one is a linear transform over JSON artifacts; the only
//! pieces with real matching or partitioning semantics live in [`matrix`].
//!
//! # Modules
//!
//! - [`matrix`]: job-matrix data model, the seeded test-corpus partitioner,
//!   and the prefix-tolerant matrix entry resolver
//! - [`allowlist`]: sanitizer-coverage allowlist generation
//! - [`coverage`]: sancov coverage statistics formatting and comparison
//! - [`statistics`]: per-commit fuzzing statistics decoding
//! - [`solver`]: the solvers under evaluation
//! - [`discovery`]: test corpus enumeration (ctest, z3test)
//! - [`store`]: object store collaborator for fetching statistics
//! - [`config`]: explicit store configuration built at the boundary
//! - [`input`]: JSON input loading shared by all utilities

pub mod allowlist;
pub mod config;
pub mod coverage;
pub mod discovery;
pub mod input;
pub mod matrix;
pub mod solver;
pub mod statistics;
pub mod store;

pub use solver::Solver;
