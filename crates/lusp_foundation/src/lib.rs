//! Lusp Foundation
//!
//! Core types shared by every lusp crate:
//! - Error types with a distinct fatal kind for corrupt bytecode
//! - Capacity limits reported by the compiler and VM
//! - Symbol interning

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod intern;

pub use error::{CapacityLimit, Error, ErrorContext, ErrorKind, Result};
pub use intern::{Interner, Symbol, SymbolId};
