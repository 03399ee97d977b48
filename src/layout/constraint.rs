//! The layout-level constraint vocabulary — component C.
//!
//! This is a closed, sealed set: a segment is sized by exactly one of these, and the compiler's
//! per-kind emission table (see `compiler`) is exhaustive over it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Exact target length.
    Len(u16),
    /// Soft equality to `n` plus a hard lower bound.
    Min(u16),
    /// Soft equality to `n` plus a hard upper bound.
    Max(u16),
    /// Target is `p` percent of the area's extent along the split axis.
    Percentage(u16),
    /// Target is `num / max(1, den)` of the area's extent.
    Ratio(u32, u32),
    /// Non-negative weight; segments with `Fill` share leftover space proportionally.
    Fill(u16),
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint::Fill(1)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Len(l) => write!(f, "Len({l})"),
            Constraint::Min(m) => write!(f, "Min({m})"),
            Constraint::Max(m) => write!(f, "Max({m})"),
            Constraint::Percentage(p) => write!(f, "Percentage({p})"),
            Constraint::Ratio(n, d) => write!(f, "Ratio({n}, {d})"),
            Constraint::Fill(w) => write!(f, "Fill({w})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_kind_args_form() {
        assert_eq!(Constraint::Len(4).to_string(), "Len(4)");
        assert_eq!(Constraint::Ratio(1, 3).to_string(), "Ratio(1, 3)");
        assert_eq!(Constraint::Fill(2).to_string(), "Fill(2)");
    }

    #[test]
    fn default_is_fill_one() {
        assert_eq!(Constraint::default(), Constraint::Fill(1));
    }
}
