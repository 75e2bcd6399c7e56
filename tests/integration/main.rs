//! End-to-end tests across the lusp crates
//!
//! Runs whole programs through compile and execute, with and without the
//! runtime prelude.

mod backend;
mod prelude;
mod properties;
mod scenarios;
