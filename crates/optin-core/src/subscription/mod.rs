//! Subscription domain: entity, token verification, lifecycle engine,
//! persistence contract, and REST surface.

pub mod api;
pub mod entity;
pub mod service;
pub mod store;
pub mod token;
