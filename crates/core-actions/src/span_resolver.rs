//! Operator span resolution.
//!
//! Turns a cursor and a resolved motion target into the region an operator
//! acts on. Rules:
//! * Linewise targets cover every line from the cursor line to the target line.
//! * Inclusive targets include the char under the far end.
//! * Exclusive targets stop before the far end. When that end is column 0 of
//!   a later line, the span is pulled back to the end of the previous line so
//!   `dw` on a line's last word does not join the lines.

use core_text::motion::{MotionKind, Target};
use core_text::{Buffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: Position,
    /// Exclusive end for charwise spans; the last line for linewise ones.
    pub end: Position,
    pub linewise: bool,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        !self.linewise && self.start == self.end
    }

    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start.line..=self.end.line
    }

    pub fn whole_lines(first: usize, last: usize) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, 0),
            linewise: true,
        }
    }
}

pub(crate) fn resolve_span(buf: &Buffer, cursor: Position, target: Target) -> Span {
    let (a, b) = if target.pos < cursor {
        (target.pos, cursor)
    } else {
        (cursor, target.pos)
    };
    match target.kind {
        MotionKind::Linewise => Span::whole_lines(a.line, b.line),
        MotionKind::Inclusive => Span {
            start: a,
            end: Position::new(b.line, (b.col + 1).min(buf.line_len(b.line))),
            linewise: false,
        },
        MotionKind::Exclusive => {
            let mut end = b;
            if end.col == 0 && end.line > a.line {
                let l = end.line - 1;
                end = Position::new(l, buf.line_len(l));
            }
            Span {
                start: a,
                end,
                linewise: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(line: usize, col: usize, kind: MotionKind) -> Target {
        Target {
            pos: Position::new(line, col),
            kind,
        }
    }

    #[test]
    fn exclusive_at_next_line_start_is_shortened() {
        let buf = Buffer::from_lines(["abc", "def"]);
        let span = resolve_span(&buf, Position::new(0, 0), target(1, 0, MotionKind::Exclusive));
        assert_eq!(span.end, Position::new(0, 3));
        assert!(!span.linewise);
    }

    #[test]
    fn inclusive_includes_far_char_in_either_direction() {
        let buf = Buffer::from_lines(["abcdef"]);
        let span = resolve_span(&buf, Position::new(0, 1), target(0, 3, MotionKind::Inclusive));
        assert_eq!((span.start.col, span.end.col), (1, 4));
    }

    #[test]
    fn linewise_orders_lines() {
        let buf = Buffer::from_lines(["a", "b", "c"]);
        let span = resolve_span(&buf, Position::new(2, 0), target(0, 0, MotionKind::Linewise));
        assert_eq!(span.lines(), 0..=2);
        assert!(!span.is_empty());
    }

    #[test]
    fn empty_exclusive_span() {
        let buf = Buffer::from_lines(["abc"]);
        let span = resolve_span(&buf, Position::new(0, 0), target(0, 0, MotionKind::Exclusive));
        assert!(span.is_empty());
    }
}
