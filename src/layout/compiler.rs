//! Translates a [`super::Layout`] plus a concrete [`Rect`] into solver constraints, solves, and
//! projects the solution back into segment and spacer rectangles — component D.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::{debug, trace};

use super::{Constraint, Direction, Flex, Layout, Spacing, Splitted};
use crate::error::{LayoutError, StageContext};
use crate::rect::Rect;
use crate::solver::{eq, ge, le, Expression, Solver, Strength, Variable};

/// Coordinates are scaled by this factor before being handed to the solver, so that ties between
/// equally-good integer positions do not make the simplex drift. Integer pixels are recovered by
/// `round(round(x) / PRECISION)`.
const PRECISION: f64 = 100.0;

/// A pair of solver variables identifying a 1-D interval. `size()` is `end - start`.
#[derive(Debug, Clone, Copy)]
struct Element {
    start: Variable,
    end: Variable,
}

impl Element {
    fn size(&self) -> Expression {
        self.end - self.start
    }
}

pub(crate) fn compile(layout: &Layout, area: Rect) -> Result<Splitted, LayoutError> {
    let inner = layout.padding.apply(area);
    let n = layout.constraints.len();

    let (area_start, area_end) = match layout.direction {
        Direction::Horizontal => (f64::from(inner.x()), f64::from(inner.right())),
        Direction::Vertical => (f64::from(inner.y()), f64::from(inner.bottom())),
    };
    let area_start = area_start * PRECISION;
    let area_end = area_end * PRECISION;
    let area_size = area_end - area_start;

    debug!(phase = "configure_area", n, area_start, area_end, "bootstrapping split area");

    let mut solver = Solver::new();

    let vars: Vec<Variable> = (0..=2 * n + 1).map(|_| Variable::new()).collect();
    let spacers: Vec<Element> = (0..=n)
        .map(|k| Element {
            start: vars[2 * k],
            end: vars[2 * k + 1],
        })
        .collect();
    let segments: Vec<Element> = (0..n)
        .map(|k| Element {
            start: vars[2 * k + 1],
            end: vars[2 * k + 2],
        })
        .collect();

    configure_area(&mut solver, vars[0], vars[2 * n + 1], area_start, area_end)
        .stage("configure_area")?;
    configure_variable_bounds(&mut solver, vars[0], &vars[1..], vars[2 * n + 1])
        .stage("configure_variable_bounds")?;
    configure_segment_ordering(&mut solver, &segments).stage("configure_segment_ordering")?;

    configure_flex_constraints(&mut solver, &spacers, layout.flex, layout.spacing, area_size)
        .stage("configure_flex")?;

    debug!(phase = "configure_constraints", n, "emitting per-segment size constraints");
    let mut fill_weights: Vec<Option<f64>> = Vec::with_capacity(n);
    for (constraint, element) in layout.constraints.iter().zip(segments.iter()) {
        let weight = configure_size_constraint(&mut solver, *constraint, element, layout.flex, area_size)
            .stage("configure_constraints")?;
        fill_weights.push(weight);
    }

    configure_fill_constraints(&mut solver, &segments, &fill_weights).stage("configure_fill_constraints")?;

    if layout.flex != Flex::Legacy {
        configure_growth_stabilizer(&mut solver, &segments).stage("configure_growth_stabilizer")?;
    }

    debug!(phase = "solve", n, "constraint system fully emitted");
    let changes: HashMap<Variable, f64> = solver.fetch_changes().iter().map(|c| (c.variable, c.value)).collect();

    let project = |element: &Element| -> (i32, i32) {
        let start = changes.get(&element.start).copied().unwrap_or(0.0);
        let end = changes.get(&element.end).copied().unwrap_or(0.0);
        let s = (start.round() / PRECISION).round() as i32;
        let e = (end.round() / PRECISION).round() as i32;
        (s, (e - s).max(0))
    };

    let to_rect = |(start, len): (i32, i32)| -> Rect {
        match layout.direction {
            Direction::Horizontal => Rect::new(start, inner.y(), len, inner.dy()),
            Direction::Vertical => Rect::new(inner.x(), start, inner.dx(), len),
        }
    };

    let segment_rects: Vec<Rect> = segments.iter().map(project).map(to_rect).collect();
    let spacer_rects: Vec<Rect> = spacers.iter().map(project).map(to_rect).collect();

    trace!(?segment_rects, ?spacer_rects, "split projected");

    Ok(Splitted {
        segments: segment_rects.into(),
        spacers: spacer_rects.into(),
    })
}

fn configure_area(
    solver: &mut Solver,
    first: Variable,
    last: Variable,
    area_start: f64,
    area_end: f64,
) -> Result<(), crate::error::SolverError> {
    solver.add(eq(Strength::REQUIRED).var(first).rhs_constant(area_start))?;
    solver.add(eq(Strength::REQUIRED).var(last).rhs_constant(area_end))?;
    Ok(())
}

fn configure_variable_bounds(
    solver: &mut Solver,
    first: Variable,
    middle: &[Variable],
    last: Variable,
) -> Result<(), crate::error::SolverError> {
    for &v in middle {
        solver.add(ge(Strength::REQUIRED).var(v).rhs_variable(first))?;
        solver.add(le(Strength::REQUIRED).var(v).rhs_variable(last))?;
    }
    Ok(())
}

fn configure_segment_ordering(solver: &mut Solver, segments: &[Element]) -> Result<(), crate::error::SolverError> {
    for segment in segments {
        solver.add(
            le(Strength::REQUIRED)
                .var(segment.start)
                .rhs_variable(segment.end),
        )?;
    }
    Ok(())
}

/// Emits the size constraints for one segment. Returns the segment's Fill-pairing weight, if any
/// (`Fill` always participates; `Min` participates only under a non-`Legacy` flex policy).
fn configure_size_constraint(
    solver: &mut Solver,
    constraint: Constraint,
    element: &Element,
    flex: Flex,
    area_size: f64,
) -> Result<Option<f64>, crate::error::SolverError> {
    let size = element.size();

    match constraint {
        Constraint::Len(l) => {
            solver.add(eq(Strength::STRONG * 10.0).expr(size).rhs_constant(f64::from(l) * PRECISION))?;
            Ok(None)
        }
        Constraint::Max(m) => {
            let target = f64::from(m) * PRECISION;
            solver.add(le(Strength::STRONG * 100.0).expr(size.clone()).rhs_constant(target))?;
            solver.add(eq(Strength::MEDIUM * 10.0).expr(size).rhs_constant(target))?;
            Ok(None)
        }
        Constraint::Min(m) => {
            let target = f64::from(m) * PRECISION;
            solver.add(ge(Strength::STRONG * 100.0).expr(size.clone()).rhs_constant(target))?;
            if flex == Flex::Legacy {
                solver.add(eq(Strength::MEDIUM * 10.0).expr(size).rhs_constant(target))?;
                Ok(None)
            } else {
                solver.add(eq(Strength::MEDIUM).expr(size).rhs_constant(area_size))?;
                Ok(Some(1.0))
            }
        }
        Constraint::Percentage(p) => {
            let target = (f64::from(p) / 100.0) * area_size;
            solver.add(eq(Strength::STRONG).expr(size).rhs_constant(target))?;
            Ok(None)
        }
        Constraint::Ratio(num, den) => {
            let target = (f64::from(num) / f64::from(den.max(1))) * area_size;
            solver.add(eq(Strength::STRONG / 10.0).expr(size).rhs_constant(target))?;
            Ok(None)
        }
        Constraint::Fill(w) => {
            solver.add(eq(Strength::MEDIUM).expr(size).rhs_constant(area_size))?;
            Ok(Some(f64::from(w).max(1e-6)))
        }
    }
}

/// For every unordered pair of segments that both participate in leftover-space sharing, ties
/// their sizes together proportionally to their weights: `w_j·size(Sᵢ) = w_i·size(S_j)`.
fn configure_fill_constraints(
    solver: &mut Solver,
    segments: &[Element],
    weights: &[Option<f64>],
) -> Result<(), crate::error::SolverError> {
    let participants: Vec<(Element, f64)> = segments
        .iter()
        .zip(weights.iter())
        .filter_map(|(element, weight)| weight.map(|w| (*element, w)))
        .collect();

    for ((a, wa), (b, wb)) in participants.into_iter().tuple_combinations() {
        let proportional = (a.size() * wb) - (b.size() * wa);
        solver.add(eq(Strength(100.0)).expr(proportional).rhs_constant(0.0))?;
    }
    Ok(())
}

/// Ties every consecutive pair of segment sizes together at `Weak`, breaking ties symmetrically
/// once a non-`Legacy` flex policy allows segments to grow past their declared size.
fn configure_growth_stabilizer(solver: &mut Solver, segments: &[Element]) -> Result<(), crate::error::SolverError> {
    for (a, b) in segments.iter().tuple_windows() {
        solver.add(eq(Strength::WEAK).expr(a.size() - b.size()).rhs_constant(0.0))?;
    }
    Ok(())
}

fn configure_flex_constraints(
    solver: &mut Solver,
    spacers: &[Element],
    flex: Flex,
    spacing: Spacing,
    area_size: f64,
) -> Result<(), crate::error::SolverError> {
    let g = match spacing {
        Spacing::Space(k) => f64::from(k),
        Spacing::Overlap(k) => -f64::from(k),
    } * PRECISION;

    let last_idx = spacers.len() - 1;
    let first = spacers[0];
    let last = spacers[last_idx];
    let inner: &[Element] = if last_idx >= 2 { &spacers[1..last_idx] } else { &[] };
    let has_distinct_ends = spacers.len() >= 2;

    trace!(phase = "configure_flex", ?flex, g, "distributing leftover space");

    match flex {
        Flex::Legacy => {
            for spacer in inner {
                fixed(solver, spacer, g, Strength::REQUIRED / 10.0)?;
            }
            if has_distinct_ends {
                zero(solver, &first, Strength::REQUIRED - 1.0)?;
                zero(solver, &last, Strength::REQUIRED - 1.0)?;
            }
        }
        Flex::Start => {
            for spacer in inner {
                fixed(solver, spacer, g, Strength::REQUIRED / 10.0)?;
            }
            if has_distinct_ends {
                zero(solver, &first, Strength::REQUIRED - 1.0)?;
                grow(solver, &last, area_size)?;
            }
        }
        Flex::End => {
            for spacer in inner {
                fixed(solver, spacer, g, Strength::REQUIRED / 10.0)?;
            }
            if has_distinct_ends {
                grow(solver, &first, area_size)?;
                zero(solver, &last, Strength::REQUIRED - 1.0)?;
            }
        }
        Flex::Center => {
            for spacer in inner {
                fixed(solver, spacer, g, Strength::REQUIRED / 10.0)?;
            }
            if has_distinct_ends {
                grow(solver, &first, area_size)?;
                grow(solver, &last, area_size)?;
                solver.add(
                    eq(Strength::REQUIRED / 10.0)
                        .expr(first.size() - last.size())
                        .rhs_constant(0.0),
                )?;
            }
        }
        Flex::SpaceBetween => {
            configure_space_distribution(solver, inner, g, area_size)?;
            if has_distinct_ends {
                zero(solver, &first, Strength::REQUIRED - 1.0)?;
                zero(solver, &last, Strength::REQUIRED - 1.0)?;
            }
        }
        Flex::SpaceAround => {
            configure_space_distribution(solver, inner, g, area_size)?;
        }
    }

    Ok(())
}

fn configure_space_distribution(
    solver: &mut Solver,
    inner: &[Element],
    g: f64,
    area_size: f64,
) -> Result<(), crate::error::SolverError> {
    for (a, b) in inner.iter().copied().tuple_combinations() {
        solver.add(
            eq(Strength::REQUIRED / 10.0)
                .expr(a.size() - b.size())
                .rhs_constant(0.0),
        )?;
    }
    for spacer in inner {
        solver.add(ge(Strength::REQUIRED / 10.0).expr(spacer.size()).rhs_constant(g))?;
        solver.add(eq(Strength::WEAK * 10.0).expr(spacer.size()).rhs_constant(area_size))?;
    }
    Ok(())
}

fn zero(solver: &mut Solver, element: &Element, strength: Strength) -> Result<(), crate::error::SolverError> {
    solver.add(eq(strength).expr(element.size()).rhs_constant(0.0))
}

fn fixed(solver: &mut Solver, element: &Element, value: f64, strength: Strength) -> Result<(), crate::error::SolverError> {
    solver.add(eq(strength).expr(element.size()).rhs_constant(value))
}

fn grow(solver: &mut Solver, element: &Element, area_size: f64) -> Result<(), crate::error::SolverError> {
    solver.add(eq(Strength(100.0)).expr(element.size()).rhs_constant(area_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Direction, Flex, Layout};

    fn segment_sizes(layout: &Layout, area: Rect) -> Vec<i32> {
        layout.split(area).iter().map(|r| r.dx()).collect()
    }

    #[test]
    fn two_equal_lengths_fit_exactly() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(1), Constraint::Len(1)]);
        assert_eq!(segment_sizes(&layout, Rect::new(0, 0, 2, 1)), vec![1, 1]);
    }

    #[test]
    fn legacy_stretches_last_segment() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(2), Constraint::Len(2)]);
        assert_eq!(segment_sizes(&layout, Rect::new(0, 0, 3, 1)), vec![2, 1]);
    }

    #[test]
    fn start_flex_leaves_trailing_space() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Percentage(25), Constraint::Percentage(50)])
            .flex(Flex::Start);
        let sizes = segment_sizes(&layout, Rect::new(0, 0, 10, 1));
        assert_eq!(sizes, vec![3, 5]);
    }

    #[test]
    fn space_between_pushes_segments_to_the_edges() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Percentage(25), Constraint::Percentage(50)])
            .flex(Flex::SpaceBetween);
        let segs = layout.split(Rect::new(0, 0, 10, 1));
        assert_eq!(segs[0].x(), 0);
        assert_eq!(segs[1].right(), 10);
    }

    #[test]
    fn percentage_100_fills_area() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Percentage(100)]);
        let segs = layout.split(Rect::new(0, 0, 7, 3));
        assert_eq!(segs[0], Rect::new(0, 0, 7, 3));
    }

    #[test]
    fn two_fill_segments_share_space_by_weight() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Fill(1), Constraint::Fill(2)]);
        let segs = layout.split(Rect::new(0, 0, 9, 1));
        let (s1, s2) = (segs[0].dx(), segs[1].dx());
        assert!((s1 as f64 * 2.0 - s2 as f64 * 1.0).abs() <= 1.0);
    }

    #[test]
    fn non_split_axis_preserves_full_extent() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(1), Constraint::Fill(1)]);
        let segs = layout.split(Rect::new(0, 0, 4, 6));
        assert!(segs.iter().all(|s| s.dy() == 6));
    }
}
