//! Integration tests for the foundation crate
//!
//! Tests error kinds and symbol interning.

mod errors;
mod intern;
