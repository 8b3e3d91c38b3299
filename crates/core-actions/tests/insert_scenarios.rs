mod common;
use common::*;

use core_actions::Mode;
use core_config::EditorConfig;
use pretty_assertions::assert_eq;

#[test]
fn append_at_end_then_escape() {
    let mut h = Harness::new(&["ab"]);
    h.keys("Ac");
    assert_eq!(h.mode(), Mode::Insert);
    h.keys("<Esc>");
    assert_eq!(h.lines(), vec!["abc"]);
    assert_eq!(h.cursor(), (0, 2));
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn append_text_with_space() {
    let mut h = Harness::new(&["ab"]);
    h.keys("A c<Esc>");
    assert_eq!(h.lines(), vec!["ab c"]);
    assert_eq!(h.cursor(), (0, 3));
}

#[test]
fn whole_insert_session_is_one_undo_step() {
    let mut h = Harness::new(&["x"]);
    h.keys("ione<CR>two<Esc>");
    assert_eq!(h.lines(), vec!["one", "twox"]);
    h.keys("u");
    assert_eq!(h.lines(), vec!["x"]);
    h.keys("<C-r>");
    assert_eq!(h.lines(), vec!["one", "twox"]);
}

#[test]
fn open_lines_and_first_non_blank() {
    assert_eq!(edit(&["a"], "Ob<Esc>"), vec!["b", "a"]);
    assert_eq!(edit(&["  a"], "Ix<Esc>"), vec!["  xa"]);
    assert_eq!(edit(&["ab"], "ax<Esc>"), vec!["axb"]);
}

#[test]
fn replace_mode_overwrites() {
    let mut h = Harness::new(&["abcd"]);
    h.keys("Rxy");
    assert_eq!(h.mode(), Mode::Replace);
    h.keys("<Esc>");
    assert_eq!(h.lines(), vec!["xycd"]);
}

#[test]
fn ctrl_o_runs_one_normal_command() {
    let mut h = Harness::new(&["abc"]);
    h.keys("A<C-o>");
    assert_eq!(h.mode(), Mode::Normal);
    h.keys("0");
    assert_eq!(h.mode(), Mode::Insert);
    h.keys("X<Esc>");
    assert_eq!(h.lines(), vec!["Xabc"]);
    assert_eq!(h.cursor(), (0, 0));
}

#[test]
fn ctrl_o_waits_for_a_complete_command() {
    let mut h = Harness::new(&["one two"]);
    h.keys("i<C-o>dw");
    assert_eq!(h.lines(), vec!["two"]);
    assert_eq!(h.mode(), Mode::Insert);
}

#[test]
fn backspace_at_line_start_rings_bell() {
    let mut h = Harness::new(&["a", "b"]);
    h.keys("ji<BS>");
    assert!(h.session.take_bell());
    h.keys("<Esc>");
    assert_eq!(h.lines(), vec!["a", "b"]);
}

#[test]
fn literal_escape_is_inserted() {
    let lines = edit(&[""], "i<C-v><Esc><Esc>");
    assert_eq!(lines, vec!["\u{1b}"]);
}

#[test]
fn start_in_insert_option() {
    let cfg = EditorConfig {
        start_in_insert: true,
        ..EditorConfig::default()
    };
    let mut h = Harness::with_config(&["x"], cfg);
    assert_eq!(h.mode(), Mode::Insert);
    h.keys("hi<Esc>");
    assert_eq!(h.lines(), vec!["hix"]);
}

#[test]
fn end_of_input_finishes_insert_and_quits_without_writing() {
    let mut h = Harness::new(&["a"]);
    h.keys("ihello");
    h.session.end_of_input();
    assert_eq!(h.session.exit_status(), Some(0));
    assert_eq!(h.lines(), vec!["helloa"]);
    assert_eq!(h.saved(), Some("a\n"));
}

#[test]
fn escape_in_normal_mode_explains_how_to_quit() {
    let mut h = Harness::new(&["a"]);
    h.keys("<Esc>");
    assert_eq!(h.message(), "Press ZZ to save changes and quit");
    h.keys("<C-c>");
    assert_eq!(h.message(), "Press ZQ to lose changes and quit");
    h.keys("2d<Esc>");
    assert_eq!(h.message(), "Cancelled 2d");
}
