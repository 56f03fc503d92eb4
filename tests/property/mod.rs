//! Property-based tests

pub mod follow_proptest;
pub mod frame_proptest;
