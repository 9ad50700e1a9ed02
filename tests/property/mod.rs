//! Property-based tests

pub mod manifest;
