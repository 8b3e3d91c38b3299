use core_state::TextBuffer;
use core_text::Position;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert { at: (usize, usize), text: String },
    Delete { a: (usize, usize), b: (usize, usize), linewise: bool },
    Replace { a: (usize, usize), b: (usize, usize), text: String },
    Join { line: usize, count: usize },
}

fn op() -> impl Strategy<Value = Op> {
    let sel = (any::<usize>(), any::<usize>());
    prop_oneof![
        (sel.clone(), "[xy\n]{0,4}").prop_map(|(at, text)| Op::Insert { at, text }),
        (sel.clone(), sel.clone(), any::<bool>()).prop_map(|(a, b, linewise)| Op::Delete { a, b, linewise }),
        (sel.clone(), sel, "[z\n]{0,3}").prop_map(|(a, b, text)| Op::Replace { a, b, text }),
        (any::<usize>(), 0usize..4).prop_map(|(line, count)| Op::Join { line, count }),
    ]
}

/// Map arbitrary selectors onto a valid position of the current text.
fn pick(buf: &TextBuffer, (l, c): (usize, usize)) -> Position {
    let line = l % buf.line_count();
    Position::new(line, c % (buf.line_len(line) + 1))
}

fn run(buf: &mut TextBuffer, op: &Op) {
    match op {
        Op::Insert { at, text } => {
            let at = pick(buf, *at);
            buf.insert_text(at, text).unwrap();
        }
        Op::Delete { a, b, linewise } => {
            let (a, b) = (pick(buf, *a), pick(buf, *b));
            buf.delete_range(a, b, *linewise).unwrap();
        }
        Op::Replace { a, b, text } => {
            let (a, b) = (pick(buf, *a), pick(buf, *b));
            buf.replace_range(a, b, text).unwrap();
        }
        Op::Join { line, count } => {
            let line = line % buf.line_count();
            buf.join_lines(line, *count, true).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn undo_is_a_true_inverse(
        initial in prop::collection::vec("[a-c ]{0,5}", 1..6),
        ops in prop::collection::vec(op(), 0..12),
    ) {
        let mut buf = TextBuffer::from_lines(&initial);
        let mut history = vec![buf.lines()];
        for op in &ops {
            run(&mut buf, op);
            prop_assert!(buf.line_count() >= 1);
            if history.last() != Some(&buf.lines()) {
                history.push(buf.lines());
            }
        }
        let fin = buf.lines();
        // Each recorded state is one undo step back from the next.
        for expected in history.iter().rev().skip(1) {
            prop_assert!(buf.undo());
            prop_assert_eq!(&buf.lines(), expected);
        }
        prop_assert!(!buf.undo());
        prop_assert_eq!(buf.lines(), initial.clone());
        prop_assert!(!buf.is_dirty());
        while buf.redo() {}
        prop_assert_eq!(buf.lines(), fin);
    }

    #[test]
    fn cursor_stays_in_bounds(
        initial in prop::collection::vec("[a-c]{0,4}", 1..4),
        ops in prop::collection::vec(op(), 0..10),
    ) {
        let mut buf = TextBuffer::from_lines(&initial);
        buf.set_cursor_clamped(Position::new(initial.len() - 1, 4));
        for op in &ops {
            run(&mut buf, op);
            let c = buf.cursor();
            prop_assert!(c.line < buf.line_count());
            prop_assert!(c.col <= buf.line_len(c.line));
        }
    }
}
