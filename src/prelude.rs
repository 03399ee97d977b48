//! A prelude for conveniently using this crate.
//!
//! ```rust
//! use casso_layout::prelude::*;
//! ```

pub use crate::error::LayoutError;
pub use crate::layout::{Constraint, Direction, Flex, Layout, Spacing, Splitted};
pub use crate::rect::{Padding, Rect};
