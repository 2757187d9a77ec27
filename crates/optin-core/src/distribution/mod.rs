//! Bulk distribution of the document bundle to owner-approved subscribers.

pub mod engine;

pub use engine::{DistributionConfig, DistributionEngine};
