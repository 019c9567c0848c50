//! Utility modules

pub mod extraction;
pub mod memory_sources;
pub mod validation;

pub use extraction::*;
pub use memory_sources::*;
pub use validation::*;
