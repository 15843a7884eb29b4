//! Reshape upstream payloads into the normalized records of
//! [`crate::models`]. Pure functions; no I/O.

pub mod bike;
pub mod bus;
pub mod rail;
