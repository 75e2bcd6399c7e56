//! Integration tests for the language crate
//!
//! Tests the lexer, compiler and VM through the public API.

mod closures;
mod compiler;
mod lexer;
mod vm;
