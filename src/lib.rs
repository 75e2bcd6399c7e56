//! Lusp - embeddable Scheme-family scripting language
//!
//! This crate re-exports every layer of lusp for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: lusp_runtime     REPL, CLI, prelude procedures, logging setup
//! Layer 1: lusp_language    Lexer, single-pass compiler, bytecode VM
//! Layer 0: lusp_foundation  Errors, capacity limits, symbol interning
//! ```

pub use lusp_foundation as foundation;
pub use lusp_language as language;
pub use lusp_runtime as runtime;
