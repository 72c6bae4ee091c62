//! Product store operations
//!
//! Reads and writes are described as `Operation` values and executed by
//! the store client, so request shape can be inspected and tested without
//! a network.

pub mod operation;

pub use operation::Operation;
