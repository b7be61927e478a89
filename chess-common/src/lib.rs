//! Common utilities for Unfair Chess
//!
//! Text conversions for squares and pieces, plus the castling
//! translation between standard UCI squares and cozy-chess move encoding.
//! Used by the rules crate.

pub mod converters;
pub mod uci;

// Re-export commonly used items
pub use converters::*;
pub use uci::*;
