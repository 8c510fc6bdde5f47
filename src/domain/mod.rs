//! Domain layer - pure conversation logic, no infrastructure knowledge.

pub mod foundation;
pub mod interview;
