//! REPL, CLI and host prelude for lusp.
//!
//! This crate provides:
//! - [`Repl`] - Interactive read-eval-print loop over one persistent environment
//! - [`prelude`] - Native procedures installed into every REPL environment
//! - [`logging`] - `tracing` subscriber setup for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
mod highlight;
pub mod logging;
pub mod prelude;
pub mod repl;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{Repl, is_complete};
