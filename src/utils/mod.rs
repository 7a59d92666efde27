//! Utility modules

pub mod loader;
pub mod scripted_service;
pub mod validation;

pub use loader::*;
pub use scripted_service::*;
pub use validation::*;
