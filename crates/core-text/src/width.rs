//! Display width of line content in terminal cells.
//!
//! All render-side width decisions go through this module so tab expansion and
//! wide-glyph handling agree between the text rows and the cursor column.

use unicode_width::UnicodeWidthChar;

pub const TAB_STOP: usize = 8;

/// Cells occupied by `c` when it starts at cell `at`.
pub fn char_cells(c: char, at: usize) -> usize {
    match c {
        '\t' => TAB_STOP - at % TAB_STOP,
        // Control characters render as `^X`.
        c if (c as u32) < 0x20 || c == '\u{7f}' => 2,
        c => c.width().unwrap_or(0),
    }
}

/// Cell column at which char column `col` of `line` starts.
pub fn cell_col(line: &str, col: usize) -> usize {
    line.chars()
        .take(col)
        .fold(0, |at, c| at + char_cells(c, at))
}

/// Total cells needed for `line`.
pub fn line_cells(line: &str) -> usize {
    cell_col(line, usize::MAX)
}

/// Render `line` into at most `max_cells` cells, expanding tabs and control
/// characters.
pub fn render_line(line: &str, max_cells: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut at = 0;
    for c in line.chars() {
        let w = char_cells(c, at);
        if at + w > max_cells {
            break;
        }
        match c {
            '\t' => out.extend(std::iter::repeat_n(' ', w)),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(c as u8 + 0x40));
            }
            '\u{7f}' => out.push_str("^?"),
            c => out.push(c),
        }
        at += w;
    }
    out
}
