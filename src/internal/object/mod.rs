//! Object model definitions shared by the pack decoder.

pub mod types;
