//! CLI command implementations.

pub mod ask;
pub mod check;
pub mod index;
pub mod serve;
