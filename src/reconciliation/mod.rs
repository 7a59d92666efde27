//! Reconciliation of bank transactions against supporting documents
//!
//! Leaf-first: [`normalize`] canonicalizes references and parses dates,
//! [`scoring`] rates a transaction/attachment pair, [`registry`] tracks
//! what a run has already paired, [`matcher`] runs the two-phase search
//! and [`engine`] drives a whole batch.

pub mod engine;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod scoring;

pub use engine::*;
pub use matcher::*;
pub use normalize::*;
pub use registry::*;
pub use scoring::*;
