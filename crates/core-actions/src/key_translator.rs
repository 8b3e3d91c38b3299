//! KeyTranslator: stateful Normal-mode key -> [`Command`] translation.
//!
//! Grammar accepted: `[count]["x][count]operator[count]motion`, with the
//! register and the first count in either order. Counts on either side of the
//! register or the operator multiply (`2d3w` deletes six words). A leading `0` is the
//! line-start motion, never a count digit.
//!
//! State machine:
//! * Idle: optional prefix count and register accumulate.
//! * Operator pending: a post-operator count may accumulate; the next
//!   motion completes the command, the same operator key makes it linewise.
//! * Awaiting a char: `f t F T r m ' \` "` and the `Z`/`z`/`\` prefixes take
//!   the next key as their argument.
//!
//! Esc and ⌃C cancel whatever is pending. Counts are clamped so they never
//! overflow.

use crate::{Command, EditKind, InsertEntry, MetaKey, MotionSpec, OperatorKind, ToggleOption};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_state::{Placement, RegisterName};
use core_text::motion::Motion;
use tracing::trace;

const COUNT_MAX: usize = 999_999;

/// Key dispatch table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Motion(MotionSpec),
    Operator(OperatorKind),
    DirectEdit(EditKind),
    ModeChange(InsertEntry),
    Meta(MetaKey),
}

impl KeyClass {
    fn needs_char(&self) -> bool {
        matches!(
            self,
            KeyClass::Motion(MotionSpec::Basic(Motion::Find { ch: None, .. }))
                | KeyClass::Motion(MotionSpec::Mark { name: None, .. })
                | KeyClass::DirectEdit(EditKind::ReplaceChar(None))
                | KeyClass::Meta(MetaKey::SetMark(None))
        )
    }

    fn with_char(self, c: char) -> Self {
        match self {
            KeyClass::Motion(MotionSpec::Basic(Motion::Find { forward, till, .. })) => {
                KeyClass::Motion(MotionSpec::Basic(Motion::Find {
                    forward,
                    till,
                    ch: Some(c),
                }))
            }
            KeyClass::Motion(MotionSpec::Mark { exact, .. }) => KeyClass::Motion(MotionSpec::Mark {
                name: Some(c),
                exact,
            }),
            KeyClass::DirectEdit(EditKind::ReplaceChar(_)) => KeyClass::DirectEdit(EditKind::ReplaceChar(Some(c))),
            KeyClass::Meta(MetaKey::SetMark(_)) => KeyClass::Meta(MetaKey::SetMark(Some(c))),
            other => other,
        }
    }
}

/// Result of feeding one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// More keys are needed.
    Pending,
    Ready(Command),
    /// Esc or ⌃C. `pending` holds the keys that were abandoned, if any.
    Cancelled { pending: Option<String> },
    /// The key means nothing here; pending state was dropped.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Register,
    Char(KeyClass),
    /// After `Z`.
    QuitPrefix,
    /// After `z`.
    ScrollPrefix,
    /// After `\`.
    TogglePrefix,
}

#[derive(Debug, Default)]
pub struct KeyTranslator {
    /// Count typed before the operator or motion (`12w`, `3"ap`).
    pending_count: Option<usize>,
    /// Count typed before the register name, kept apart so `3"a2yy` multiplies.
    register_count: Option<usize>,
    pending_register: Option<char>,
    pending_operator: Option<OperatorKind>,
    /// Count typed between operator and motion (`d3w`).
    post_op_count: Option<usize>,
    awaiting: Option<Awaiting>,
    /// Keys of the command in progress, shown while pending.
    typed: String,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_idle(&self) -> bool {
        self.typed.is_empty()
    }

    pub fn pending_operator(&self) -> Option<OperatorKind> {
        self.pending_operator
    }

    /// Keys typed so far for the command in progress.
    pub fn pending_keys(&self) -> &str {
        &self.typed
    }

    pub fn translate(&mut self, key: &KeyEvent) -> Translation {
        if key.is_cancel() {
            let pending = (!self.typed.is_empty()).then(|| self.typed.clone());
            self.reset();
            return Translation::Cancelled { pending };
        }
        self.typed.push_str(&key.to_string());
        let result = self.step(key);
        match &result {
            Translation::Pending => {}
            Translation::Ready(cmd) => {
                trace!(target: "actions.translate", ?cmd, "ready");
                self.reset();
            }
            _ => self.reset(),
        }
        result
    }

    fn step(&mut self, key: &KeyEvent) -> Translation {
        if let Some(awaiting) = self.awaiting.take() {
            return self.complete(awaiting, key);
        }
        let ch = key.printable();
        if let Some(d) = ch.and_then(|c| c.to_digit(10)) {
            let slot = if self.pending_operator.is_some() {
                &mut self.post_op_count
            } else {
                &mut self.pending_count
            };
            if d != 0 || slot.is_some() {
                let value = slot.unwrap_or(0).saturating_mul(10).saturating_add(d as usize);
                *slot = Some(value.min(COUNT_MAX));
                return Translation::Pending;
            }
        }
        if self.pending_operator.is_none() {
            match ch {
                Some('"') => return self.wait(Awaiting::Register),
                Some('Z') => return self.wait(Awaiting::QuitPrefix),
                Some('z') => return self.wait(Awaiting::ScrollPrefix),
                Some('\\') => return self.wait(Awaiting::TogglePrefix),
                Some('Y') => {
                    return Translation::Ready(Command::OperateLine {
                        op: OperatorKind::Yank,
                        count: self.total_count().unwrap_or(1),
                        register: self.pending_register,
                    });
                }
                _ => {}
            }
        }
        match classify(key) {
            Some(class) => self.accept(class),
            None => Translation::Invalid,
        }
    }

    fn wait(&mut self, awaiting: Awaiting) -> Translation {
        self.awaiting = Some(awaiting);
        Translation::Pending
    }

    fn prefix_count(&self) -> Option<usize> {
        multiply(self.register_count, self.pending_count)
    }

    fn total_count(&self) -> Option<usize> {
        multiply(self.prefix_count(), self.post_op_count)
    }

    fn complete(&mut self, awaiting: Awaiting, key: &KeyEvent) -> Translation {
        let ch = key.printable();
        match awaiting {
            Awaiting::Register => match ch.filter(|c| RegisterName::parse(*c).is_some()) {
                Some(c) => {
                    self.pending_register = Some(c);
                    self.register_count = self.prefix_count();
                    self.pending_count = None;
                    Translation::Pending
                }
                None => Translation::Invalid,
            },
            Awaiting::Char(class) => {
                let arg = match key.code {
                    KeyCode::Enter if !key.mods.contains(KeyModifiers::CTRL) => Some('\n'),
                    KeyCode::Tab => Some('\t'),
                    _ => ch,
                };
                match arg {
                    Some(c) => self.accept(class.with_char(c)),
                    None => Translation::Invalid,
                }
            }
            Awaiting::QuitPrefix => {
                let key = match ch {
                    Some('Z') => MetaKey::WriteQuit,
                    Some('Q') => MetaKey::QuitDiscard,
                    _ => return Translation::Invalid,
                };
                Translation::Ready(Command::Meta {
                    key,
                    count: self.prefix_count(),
                })
            }
            Awaiting::ScrollPrefix => {
                let placement = match (key.code, ch) {
                    (KeyCode::Enter, _) | (_, Some('t')) => Placement::Top,
                    (_, Some('.' | 'z')) => Placement::Center,
                    (_, Some('-' | 'b')) => Placement::Bottom,
                    _ => return Translation::Invalid,
                };
                Translation::Ready(Command::Meta {
                    key: MetaKey::Place(placement),
                    count: self.prefix_count(),
                })
            }
            Awaiting::TogglePrefix => {
                let option = match ch {
                    Some('n') => ToggleOption::Number,
                    Some('i') => ToggleOption::IgnoreCase,
                    Some('F') => ToggleOption::Regex,
                    _ => return Translation::Invalid,
                };
                Translation::Ready(Command::Meta {
                    key: MetaKey::Toggle(option),
                    count: None,
                })
            }
        }
    }

    fn accept(&mut self, class: KeyClass) -> Translation {
        if class.needs_char() {
            return self.wait(Awaiting::Char(class));
        }
        let count = self.total_count();
        let register = self.pending_register;
        if let Some(op) = self.pending_operator {
            return match class {
                KeyClass::Operator(o) if o == op => Translation::Ready(Command::OperateLine {
                    op,
                    count: count.unwrap_or(1),
                    register,
                }),
                KeyClass::Motion(motion) => Translation::Ready(Command::Operate {
                    op,
                    motion,
                    count,
                    register,
                }),
                _ => Translation::Invalid,
            };
        }
        let cmd = match class {
            KeyClass::Operator(op) => {
                self.pending_operator = Some(op);
                return Translation::Pending;
            }
            KeyClass::Motion(motion) => Command::Move { motion, count },
            KeyClass::DirectEdit(kind) => Command::Edit {
                kind,
                count: count.unwrap_or(1),
                register,
            },
            KeyClass::ModeChange(entry) => Command::Enter {
                entry,
                count: count.unwrap_or(1),
            },
            KeyClass::Meta(key) => Command::Meta { key, count },
        };
        Translation::Ready(cmd)
    }
}

fn multiply(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1)).min(COUNT_MAX)),
    }
}

fn basic(m: Motion) -> KeyClass {
    KeyClass::Motion(MotionSpec::Basic(m))
}

/// The Normal-mode key table.
pub fn classify(key: &KeyEvent) -> Option<KeyClass> {
    use KeyClass::{DirectEdit, Meta};
    if key.mods.contains(KeyModifiers::CTRL) {
        let KeyCode::Char(c) = key.code else {
            return None;
        };
        return Some(match c {
            'h' => basic(Motion::Left),
            'j' | 'n' => basic(Motion::Down),
            'p' => basic(Motion::Up),
            'm' => basic(Motion::NextLineFirstNonBlank),
            'r' => Meta(MetaKey::Redo),
            'f' => Meta(MetaKey::PageDown),
            'b' => Meta(MetaKey::PageUp),
            'e' => Meta(MetaKey::ScrollDown),
            'y' => Meta(MetaKey::ScrollUp),
            'l' => Meta(MetaKey::Redraw),
            'g' => Meta(MetaKey::FileInfo),
            _ => return None,
        });
    }
    Some(match key.code {
        KeyCode::Left | KeyCode::Backspace => basic(Motion::Left),
        KeyCode::Right => basic(Motion::Right),
        KeyCode::Up => basic(Motion::Up),
        KeyCode::Down => basic(Motion::Down),
        KeyCode::Home => basic(Motion::LineStart),
        KeyCode::End => basic(Motion::LineEnd),
        KeyCode::Enter => basic(Motion::NextLineFirstNonBlank),
        KeyCode::PageDown => Meta(MetaKey::PageDown),
        KeyCode::PageUp => Meta(MetaKey::PageUp),
        KeyCode::Delete => DirectEdit(EditKind::DeleteUnder),
        KeyCode::Char(c) => return classify_char(c),
        KeyCode::Esc | KeyCode::Tab => return None,
    })
}

fn classify_char(c: char) -> Option<KeyClass> {
    use KeyClass::{DirectEdit, Meta, ModeChange, Operator};
    let find = |forward, till| {
        basic(Motion::Find {
            forward,
            till,
            ch: None,
        })
    };
    if let Some(op) = OperatorKind::from_char(c) {
        return Some(Operator(op));
    }
    Some(match c {
        'h' => basic(Motion::Left),
        'l' | ' ' => basic(Motion::Right),
        '0' => basic(Motion::LineStart),
        '^' => basic(Motion::FirstNonBlank),
        '$' => basic(Motion::LineEnd),
        '|' => basic(Motion::Column),
        'f' => find(true, false),
        't' => find(true, true),
        'F' => find(false, false),
        'T' => find(false, true),
        ';' => basic(Motion::RepeatFind),
        ',' => basic(Motion::RepeatFindReverse),
        'w' => basic(Motion::WordForward),
        'W' => basic(Motion::BigWordForward),
        'e' => basic(Motion::WordEnd),
        'E' => basic(Motion::BigWordEnd),
        'b' => basic(Motion::WordBackward),
        'B' => basic(Motion::BigWordBackward),
        '}' => basic(Motion::ParagraphForward),
        '{' => basic(Motion::ParagraphBackward),
        'j' => basic(Motion::Down),
        'k' => basic(Motion::Up),
        '-' => basic(Motion::PrevLineFirstNonBlank),
        '+' => basic(Motion::NextLineFirstNonBlank),
        '_' => basic(Motion::CurrentLineFirstNonBlank),
        'G' => basic(Motion::GotoLine),
        'H' => basic(Motion::ScreenTop),
        'M' => basic(Motion::ScreenMiddle),
        'L' => basic(Motion::ScreenBottom),
        '\'' => KeyClass::Motion(MotionSpec::Mark { name: None, exact: false }),
        '`' => KeyClass::Motion(MotionSpec::Mark { name: None, exact: true }),
        'x' => DirectEdit(EditKind::DeleteUnder),
        'X' => DirectEdit(EditKind::DeleteBefore),
        'D' => DirectEdit(EditKind::DeleteToEnd),
        'C' => DirectEdit(EditKind::ChangeToEnd),
        's' => DirectEdit(EditKind::SubstituteChar),
        'S' => DirectEdit(EditKind::SubstituteLine),
        'J' => DirectEdit(EditKind::Join),
        'p' => DirectEdit(EditKind::PasteAfter),
        'P' => DirectEdit(EditKind::PasteBefore),
        '~' => DirectEdit(EditKind::ToggleCase),
        'r' => DirectEdit(EditKind::ReplaceChar(None)),
        'i' => ModeChange(InsertEntry::Insert),
        'a' => ModeChange(InsertEntry::Append),
        'I' => ModeChange(InsertEntry::InsertAtFirstNonBlank),
        'A' => ModeChange(InsertEntry::AppendAtEnd),
        'o' => ModeChange(InsertEntry::OpenBelow),
        'O' => ModeChange(InsertEntry::OpenAbove),
        'R' => ModeChange(InsertEntry::Replace),
        'u' => Meta(MetaKey::Undo),
        '.' => Meta(MetaKey::RepeatChange),
        '/' => Meta(MetaKey::SearchPrompt { forward: true }),
        '?' => Meta(MetaKey::SearchPrompt { forward: false }),
        'n' => Meta(MetaKey::SearchNext),
        'N' => Meta(MetaKey::SearchPrevious),
        '*' => Meta(MetaKey::SearchWord { forward: true }),
        '#' => Meta(MetaKey::SearchWord { forward: false }),
        ':' | 'Q' => Meta(MetaKey::ExPrompt),
        'm' => Meta(MetaKey::SetMark(None)),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::parse_keys;

    fn run(keys: &str) -> Vec<Translation> {
        let mut t = KeyTranslator::new();
        parse_keys(keys)
            .unwrap()
            .iter()
            .map(|k| t.translate(k))
            .filter(|r| *r != Translation::Pending)
            .collect()
    }

    fn single(keys: &str) -> Command {
        match run(keys).as_slice() {
            [Translation::Ready(cmd)] => *cmd,
            other => panic!("expected one command for {keys:?}, got {other:?}"),
        }
    }

    fn word() -> MotionSpec {
        MotionSpec::Basic(Motion::WordForward)
    }

    #[test]
    fn motion_with_count() {
        assert_eq!(
            single("12w"),
            Command::Move {
                motion: word(),
                count: Some(12)
            }
        );
        assert_eq!(
            single("w"),
            Command::Move {
                motion: word(),
                count: None
            }
        );
    }

    #[test]
    fn counts_multiply_around_operator() {
        assert_eq!(
            single("2d3w"),
            Command::Operate {
                op: OperatorKind::Delete,
                motion: word(),
                count: Some(6),
                register: None
            }
        );
    }

    #[test]
    fn register_and_count_in_either_order() {
        let expected = Command::OperateLine {
            op: OperatorKind::Yank,
            count: 3,
            register: Some('a'),
        };
        assert_eq!(single("3\"ayy"), expected);
        assert_eq!(single("\"a3yy"), expected);
    }

    #[test]
    fn backslash_prefix_names_an_option() {
        let toggle = |option| Command::Meta {
            key: MetaKey::Toggle(option),
            count: None,
        };
        assert_eq!(single("\\n"), toggle(ToggleOption::Number));
        assert_eq!(single("\\i"), toggle(ToggleOption::IgnoreCase));
        assert_eq!(single("\\F"), toggle(ToggleOption::Regex));
        assert_eq!(run("\\x"), vec![Translation::Invalid]);
        assert_eq!(
            single("Q"),
            Command::Meta {
                key: MetaKey::ExPrompt,
                count: None
            }
        );
    }

    #[test]
    fn counts_on_both_sides_of_register_multiply() {
        assert_eq!(
            single("3\"a2yy"),
            Command::OperateLine {
                op: OperatorKind::Yank,
                count: 6,
                register: Some('a'),
            }
        );
        assert_eq!(
            single("2\"b3d2w"),
            Command::Operate {
                op: OperatorKind::Delete,
                motion: word(),
                count: Some(12),
                register: Some('b')
            }
        );
    }

    #[test]
    fn zero_is_motion_unless_count_started() {
        assert_eq!(
            single("d0"),
            Command::Operate {
                op: OperatorKind::Delete,
                motion: MotionSpec::Basic(Motion::LineStart),
                count: None,
                register: None
            }
        );
        assert_eq!(
            single("10j"),
            Command::Move {
                motion: MotionSpec::Basic(Motion::Down),
                count: Some(10)
            }
        );
    }

    #[test]
    fn find_waits_for_char() {
        assert_eq!(
            single("2fx"),
            Command::Move {
                motion: MotionSpec::Basic(Motion::Find {
                    forward: true,
                    till: false,
                    ch: Some('x')
                }),
                count: Some(2)
            }
        );
        assert_eq!(
            single("dtq"),
            Command::Operate {
                op: OperatorKind::Delete,
                motion: MotionSpec::Basic(Motion::Find {
                    forward: true,
                    till: true,
                    ch: Some('q')
                }),
                count: None,
                register: None
            }
        );
    }

    #[test]
    fn replace_char_takes_enter() {
        assert_eq!(
            single("r<CR>"),
            Command::Edit {
                kind: EditKind::ReplaceChar(Some('\n')),
                count: 1,
                register: None
            }
        );
    }

    #[test]
    fn mark_jump_works_after_operator() {
        assert_eq!(
            single("d'a"),
            Command::Operate {
                op: OperatorKind::Delete,
                motion: MotionSpec::Mark {
                    name: Some('a'),
                    exact: false
                },
                count: None,
                register: None
            }
        );
    }

    #[test]
    fn escape_reports_abandoned_keys() {
        assert_eq!(
            run("3d<Esc>"),
            vec![Translation::Cancelled {
                pending: Some("3d".into())
            }]
        );
        assert_eq!(run("<Esc>"), vec![Translation::Cancelled { pending: None }]);
    }

    #[test]
    fn non_motion_after_operator_is_invalid() {
        assert_eq!(run("dx"), vec![Translation::Invalid]);
        assert_eq!(run("dQ"), vec![Translation::Invalid]);
    }

    #[test]
    fn quit_and_scroll_prefixes() {
        assert_eq!(
            single("3ZQ"),
            Command::Meta {
                key: MetaKey::QuitDiscard,
                count: Some(3)
            }
        );
        assert_eq!(
            single("zz"),
            Command::Meta {
                key: MetaKey::Place(Placement::Center),
                count: None
            }
        );
        assert_eq!(run("Zx"), vec![Translation::Invalid]);
    }

    #[test]
    fn shorthands_keep_count_and_register() {
        assert_eq!(
            single("\"b2Y"),
            Command::OperateLine {
                op: OperatorKind::Yank,
                count: 2,
                register: Some('b')
            }
        );
        assert_eq!(
            single("3x"),
            Command::Edit {
                kind: EditKind::DeleteUnder,
                count: 3,
                register: None
            }
        );
    }

    #[test]
    fn pending_keys_track_progress() {
        let mut t = KeyTranslator::new();
        for k in parse_keys("2\"ad").unwrap() {
            assert_eq!(t.translate(&k), Translation::Pending);
        }
        assert_eq!(t.pending_keys(), "2\"ad");
        assert_eq!(t.pending_operator(), Some(OperatorKind::Delete));
        assert!(!t.is_idle());
    }
}
