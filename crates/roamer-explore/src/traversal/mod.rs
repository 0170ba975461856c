pub mod executor;
pub mod plan;
pub mod registry;
