//! Match-3 (workspace facade crate).
//!
//! Re-exports `match_three::{core,adapter,types}` from the crates under
//! `crates/`, plus the [`driver`] that paces cascades for the binary.

pub mod driver;

pub use match_three_adapter as adapter;
pub use match_three_core as core;
pub use match_three_types as types;
