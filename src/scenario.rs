//! ASCII scenario-testing helpers, used only by this crate's own test suite: render a split as a
//! row of letters (one per segment) with spacer cells shown as `·`, so the scenario table in this
//! crate's design notes can be asserted against directly instead of against raw rectangles.

use crate::layout::Layout;
use crate::rect::Rect;

pub(crate) fn render(layout: &Layout, area: Rect) -> String {
    let (segments, spacers) = layout.split_with_spacers(area);
    let mut out = String::with_capacity(area.dx().max(0) as usize);
    for x in area.x()..area.right() {
        if let Some(i) = segments.iter().position(|s| x >= s.x() && x < s.right()) {
            out.push((b'a' + i as u8) as char);
        } else if spacers.iter().any(|s| x >= s.x() && x < s.right()) {
            out.push('\u{b7}');
        } else {
            out.push(' ');
        }
    }
    out
}

macro_rules! assert_split_eq {
    ($layout:expr, $area:expr, $expected:expr) => {
        assert_eq!(crate::scenario::render(&$layout, $area), $expected);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Constraint, Direction, Flex};

    #[test]
    fn scenario_1_two_equal_lengths() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(1), Constraint::Len(1)]);
        assert_split_eq!(layout, Rect::new(0, 0, 2, 1), "ab");
    }

    #[test]
    fn scenario_2_legacy_stretches_last() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Len(2), Constraint::Len(2)]);
        assert_split_eq!(layout, Rect::new(0, 0, 3, 1), "aab");
    }

    #[test]
    fn scenario_3_start_leaves_trailing_gap() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Percentage(25), Constraint::Percentage(50)])
            .flex(Flex::Start);
        assert_split_eq!(layout, Rect::new(0, 0, 10, 1), "aaabbbbb\u{b7}\u{b7}");
    }

    #[test]
    fn scenario_4_space_between_pushes_to_edges() {
        let layout = Layout::new(Direction::Horizontal, [Constraint::Percentage(25), Constraint::Percentage(50)])
            .flex(Flex::SpaceBetween);
        assert_split_eq!(layout, Rect::new(0, 0, 10, 1), "aaa\u{b7}\u{b7}bbbbb");
    }

    #[test]
    fn scenario_5_rank_based_stretching() {
        let layout = Layout::new(
            Direction::Horizontal,
            [Constraint::Len(3), Constraint::Min(4), Constraint::Len(1), Constraint::Min(4)],
        );
        let segments = layout.split(Rect::new(0, 0, 7, 1));
        let sizes: Vec<i32> = segments.iter().map(|s| s.dx()).collect();
        assert_eq!(sizes, vec![0, 4, 0, 3]);
    }

    #[test]
    fn scenario_6_vertical_first_segment_takes_the_row() {
        let layout = Layout::new(
            Direction::Vertical,
            [Constraint::Percentage(50), Constraint::Percentage(50), Constraint::Min(0)],
        );
        let segments = layout.split(Rect::new(0, 0, 1, 1));
        assert_eq!(segments[0], Rect::new(0, 0, 1, 1));
        assert_eq!(segments[1].y(), 1);
        assert_eq!(segments[1].dy(), 0);
        assert_eq!(segments[2].y(), 1);
        assert_eq!(segments[2].dy(), 0);
    }
}
