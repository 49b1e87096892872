//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`ClockReplacer`] - CLOCK (second chance) over the fixed frame array

mod clock;

pub use clock::ClockReplacer;
