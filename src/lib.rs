//! A linear-constraint-based one-dimensional layout engine for character-cell terminal user
//! interfaces.
//!
//! Given a rectangular area, a split [`layout::Direction`], and an ordered list of
//! [`layout::Constraint`]s, [`layout::Layout::split`] partitions the area into non-overlapping
//! segments (optionally separated by spacers) that satisfy the declared constraints as closely as
//! possible under a fixed priority ordering. The partitioning itself is delegated to an
//! incremental Cassowary simplex solver ([`solver`]), the same family of algorithm used by
//! constraint-based UI toolkits; everything in [`layout`] is a compiler that lowers high-level
//! sizing intent into that solver's weighted linear constraints.
//!
//! ```
//! use casso_layout::prelude::*;
//!
//! let layout = Layout::new(Direction::Horizontal, [Constraint::Len(3), Constraint::Fill(1)]);
//! let segments = layout.split(Rect::new(0, 0, 10, 1));
//! assert_eq!(segments[0], Rect::new(0, 0, 3, 1));
//! assert_eq!(segments[1], Rect::new(3, 0, 7, 1));
//! ```

pub mod error;
pub mod layout;
pub mod rect;
pub mod solver;

#[cfg(test)]
mod scenario;

pub mod prelude;
