//! The public layout surface: a `Layout` builder that partitions a [`Rect`] along one axis.

mod compiler;
mod constraint;

pub use constraint::Constraint;

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::OnceLock;

use lru::LruCache;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::LayoutError;
use crate::rect::{Padding, Rect};

#[derive(Debug, Default, Display, EnumString, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Default, Display, EnumString, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flex {
    #[default]
    Legacy,
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spacing {
    Space(i32),
    Overlap(i32),
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing::Space(0)
    }
}

/// The result of a split: the segments, one per constraint, and the spacers between/around them.
#[derive(Debug, Clone)]
pub struct Splitted {
    pub segments: Rc<[Rect]>,
    pub spacers: Rc<[Rect]>,
}

impl Splitted {
    /// Copies segment rectangles into caller-provided slots, in order. A `None` slot is skipped;
    /// slots beyond the segment count are left untouched.
    pub fn assign(&self, slots: &mut [Option<&mut Rect>]) {
        for (slot, rect) in slots.iter_mut().zip(self.segments.iter()) {
            if let Some(target) = slot {
                **target = *rect;
            }
        }
    }
}

type Cache = LruCache<(Rect, Layout), Splitted>;
thread_local! {
    static LAYOUT_CACHE: OnceLock<RefCell<Cache>> = OnceLock::new();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    direction: Direction,
    constraints: Vec<Constraint>,
    padding: Padding,
    flex: Flex,
    spacing: Spacing,
}

impl Default for Layout {
    fn default() -> Layout {
        Layout::new(Direction::Vertical, [])
    }
}

impl Layout {
    pub const DEFAULT_CACHE_SIZE: usize = 16;

    pub fn new<C: AsRef<[Constraint]>>(direction: Direction, constraints: C) -> Layout {
        Layout {
            direction,
            constraints: constraints.as_ref().to_vec(),
            padding: Padding::default(),
            flex: Flex::default(),
            spacing: Spacing::default(),
        }
    }

    /// Initializes the split cache with a custom size. Returns whether this call won the race to
    /// set it (a later call, or a call after the cache already lazily initialized itself at
    /// [`Self::DEFAULT_CACHE_SIZE`] on first [`Self::split`], has no effect).
    pub fn init_cache(cache_size: usize) -> bool {
        LAYOUT_CACHE
            .with(|c| c.set(RefCell::new(LruCache::new(NonZeroUsize::new(cache_size).unwrap()))))
            .is_ok()
    }

    pub fn direction(mut self, direction: Direction) -> Layout {
        self.direction = direction;
        self
    }

    pub fn constraints<C: AsRef<[Constraint]>>(mut self, constraints: C) -> Layout {
        self.constraints = constraints.as_ref().to_vec();
        self
    }

    pub fn padding(mut self, padding: Padding) -> Layout {
        self.padding = padding;
        self
    }

    pub fn flex(mut self, flex: Flex) -> Layout {
        self.flex = flex;
        self
    }

    pub fn spacing(mut self, spacing: Spacing) -> Layout {
        self.spacing = spacing;
        self
    }

    /// Splits `area` into segments, consulting and populating the thread-local cache.
    ///
    /// Panics if the compiler produced an unsatisfiable constraint set — every constraint this
    /// compiler emits is built to be satisfiable, so that would be a bug in the compiler rather
    /// than a caller mistake. Use [`Self::try_split`] to get the `Result` instead.
    pub fn split(&self, area: Rect) -> Rc<[Rect]> {
        self.split_with_spacers(area).0
    }

    pub fn split_with_spacers(&self, area: Rect) -> (Rc<[Rect]>, Rc<[Rect]>) {
        let splitted = LAYOUT_CACHE.with(|c| {
            c.get_or_init(|| RefCell::new(LruCache::new(NonZeroUsize::new(Self::DEFAULT_CACHE_SIZE).unwrap())))
                .borrow_mut()
                .get_or_insert((area, self.clone()), || {
                    compiler::compile(self, area).expect("layout compiler produced an unsatisfiable constraint set")
                })
                .clone()
        });
        (splitted.segments, splitted.spacers)
    }

    pub fn try_split(&self, area: Rect) -> Result<Rc<[Rect]>, LayoutError> {
        Ok(self.try_split_with_spacers(area)?.0)
    }

    pub fn try_split_with_spacers(&self, area: Rect) -> Result<(Rc<[Rect]>, Rc<[Rect]>), LayoutError> {
        let splitted = compiler::compile(self, area).map_err(|err| {
            warn!(%err, "layout split failed");
            err
        })?;
        Ok((splitted.segments, splitted.spacers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_vertical_with_no_constraints() {
        let layout = Layout::default();
        assert_eq!(layout.direction, Direction::Vertical);
        assert!(layout.constraints.is_empty());
    }

    #[test]
    fn split_is_cached_for_identical_inputs() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(3), Constraint::Fill(1)]);
        let area = Rect::new(0, 0, 10, 1);
        let first = layout.split(area);
        let second = layout.split(area);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn try_split_surfaces_a_result() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(3)]);
        let result = layout.try_split(Rect::new(0, 0, 10, 1));
        assert!(result.is_ok());
    }

    #[test]
    fn splitted_assign_skips_none_slots() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(2), Constraint::Len(2)]);
        let (segments, _) = layout.split_with_spacers(Rect::new(0, 0, 4, 1));
        let splitted = Splitted {
            segments,
            spacers: Rc::from(Vec::new()),
        };
        let mut a = Rect::default();
        let mut slots: Vec<Option<&mut Rect>> = vec![Some(&mut a), None];
        splitted.assign(&mut slots);
        assert_eq!(a, Rect::new(0, 0, 2, 1));
    }
}
