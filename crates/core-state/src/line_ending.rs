//! Line ending detection and the text <-> lines conversion used by load and save.

/// Line ending style detected from source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Text split into lines plus what is needed to write it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub lines: Vec<String>,
    pub line_ending: LineEnding,
    pub had_trailing_newline: bool,
    /// More than one ending style was present; all are written back as `line_ending`.
    pub mixed: bool,
}

/// Split `input` on any of `\r\n`, `\n`, `\r`. The majority style wins (ties
/// resolved CRLF > LF > CR). A final terminator does not produce an extra line.
pub fn split_document(input: &str) -> Document {
    let mut lines = Vec::new();
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                lines.push(std::mem::take(&mut current));
            }
            '\r' => {
                cr += 1;
                lines.push(std::mem::take(&mut current));
            }
            '\n' => {
                lf += 1;
                lines.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    let had_trailing_newline = current.is_empty() && !lines.is_empty();
    if !had_trailing_newline {
        lines.push(current);
    }
    let mut line_ending = LineEnding::Lf;
    let mut max = 0;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > max {
            max = count;
            line_ending = style;
        }
    }
    let mixed = [crlf, lf, cr].iter().filter(|c| **c > 0).count() > 1;
    Document {
        lines,
        line_ending,
        had_trailing_newline,
        mixed,
    }
}

/// Join lines back into file text.
pub fn join_document(lines: &[String], ending: LineEnding, trailing_newline: bool) -> String {
    let mut out = lines.join(ending.as_str());
    if trailing_newline {
        out.push_str(ending.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lf_with_trailing_newline() {
        let doc = split_document("a\nb\n");
        assert_eq!(doc.lines, vec!["a", "b"]);
        assert!(doc.had_trailing_newline);
        assert_eq!(doc.line_ending, LineEnding::Lf);
        assert_eq!(join_document(&doc.lines, doc.line_ending, true), "a\nb\n");
    }

    #[test]
    fn crlf_majority_and_mixed() {
        let doc = split_document("a\r\nb\r\nc\nd");
        assert_eq!(doc.lines, vec!["a", "b", "c", "d"]);
        assert_eq!(doc.line_ending, LineEnding::Crlf);
        assert!(doc.mixed);
        assert!(!doc.had_trailing_newline);
    }

    #[test]
    fn empty_input_is_one_empty_line() {
        let doc = split_document("");
        assert_eq!(doc.lines, vec![""]);
        assert!(!doc.had_trailing_newline);
    }

    #[test]
    fn lone_newline_is_one_empty_line() {
        let doc = split_document("\n");
        assert_eq!(doc.lines, vec![""]);
        assert!(doc.had_trailing_newline);
    }

    #[test]
    fn blank_last_line_is_kept() {
        let doc = split_document("a\n\n");
        assert_eq!(doc.lines, vec!["a", ""]);
        assert!(doc.had_trailing_newline);
    }
}
