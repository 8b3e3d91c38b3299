mod common;
use common::*;

use core_actions::Mode;
use pretty_assertions::assert_eq;

#[test]
fn range_delete() {
    let mut h = Harness::new(&["a", "b", "c", "d"]);
    h.keys(":2,3d<CR>");
    assert_eq!(h.lines(), vec!["a", "d"]);
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn quit_refused_while_dirty_then_forced() {
    let mut h = Harness::new(&["abc"]);
    h.keys("x:q<CR>");
    assert!(!h.session.is_finished());
    assert_eq!(h.message(), "No write since last change (add ! to override)");
    h.keys(":q!<CR>");
    assert_eq!(h.session.exit_status(), Some(0));
    assert_eq!(h.saved(), Some("abc\n"));
}

#[test]
fn write_quit_saves() {
    let mut h = Harness::new(&["abc"]);
    h.keys("x:wq<CR>");
    assert_eq!(h.saved(), Some("bc\n"));
    assert_eq!(h.session.exit_status(), Some(0));
}

#[test]
fn write_reports_size_and_cleans_buffer() {
    let mut h = Harness::new(&["ab", "c"]);
    h.keys("x:w<CR>");
    assert_eq!(h.message(), "\"t.txt\" 2L, 4C written");
    assert!(!h.session.buffer().is_dirty());
}

#[test]
fn zz_on_clean_buffer_quits_without_writing() {
    let mut h = Harness::new(&["abc"]);
    h.keys("ZZ");
    assert_eq!(h.session.exit_status(), Some(0));
}

#[test]
fn unknown_command_leaves_buffer_alone() {
    let mut h = Harness::new(&["abc"]);
    h.keys(":frob<CR>");
    assert_eq!(h.message(), "frob: Not an editor command");
    assert_eq!(h.lines(), vec!["abc"]);
    assert!(!h.session.buffer().is_dirty());
}

#[test]
fn substitute_reports_count_and_undoes_at_once() {
    let mut h = Harness::new(&["foo", "boo", "xyz"]);
    h.keys(":%s/o/0/g<CR>");
    assert_eq!(h.lines(), vec!["f00", "b00", "xyz"]);
    assert_eq!(h.message(), "4 substitutions");
    h.keys("u");
    assert_eq!(h.lines(), vec!["foo", "boo", "xyz"]);
}

#[test]
fn substitute_can_split_lines() {
    assert_eq!(edit(&["a,b"], ":s/,/\\r/<CR>"), vec!["a", "b"]);
}

#[test]
fn confirmed_substitute_walks_matches() {
    let mut h = Harness::new(&["a a a"]);
    h.keys(":s/a/b/gc<CR>");
    assert_eq!(h.mode(), Mode::ConfirmSubstitute);
    assert_eq!(h.message(), "replace with b (y/n/a/q/l)?");
    h.keys("yny");
    assert_eq!(h.lines(), vec!["b a b"]);
    assert_eq!(h.mode(), Mode::Normal);
    assert_eq!(h.message(), "2 substitutions");
    h.keys("u");
    assert_eq!(h.lines(), vec!["a a a"]);
}

#[test]
fn confirmed_substitute_quit_and_all() {
    let mut h = Harness::new(&["x x", "x"]);
    h.keys(":%s/x/y/gc<CR>yq");
    assert_eq!(h.lines(), vec!["y x", "x"]);
    let mut h = Harness::new(&["x x", "x"]);
    h.keys(":%s/x/y/gc<CR>na");
    assert_eq!(h.lines(), vec!["x y", "y"]);
}

#[test]
fn global_delete() {
    let mut h = Harness::new(&["keep", "drop", "keep", "drop"]);
    h.keys(":g/drop/d<CR>");
    assert_eq!(h.lines(), vec!["keep", "keep"]);
    h.keys("u");
    assert_eq!(h.lines(), vec!["keep", "drop", "keep", "drop"]);
}

#[test]
fn count_prefills_line_range() {
    let mut h = Harness::new(&["1", "2", "3", "4"]);
    h.keys("j2:");
    assert_eq!(h.session.command_line().as_deref(), Some(":.,.+1"));
    h.keys("d<CR>");
    assert_eq!(h.lines(), vec!["1", "4"]);
}

#[test]
fn bare_address_moves_cursor() {
    let mut h = Harness::new(&["a", "  b", "c"]);
    h.keys(":2<CR>");
    assert_eq!(h.cursor(), (1, 2));
    h.keys(":$<CR>");
    assert_eq!(h.cursor(), (2, 0));
}

#[test]
fn line_editing_keys() {
    let mut h = Harness::new(&["a", "b"]);
    h.keys(":2dx<BS><BS>");
    assert_eq!(h.session.command_line().as_deref(), Some(":2"));
    h.keys("<C-u>$d<CR>");
    assert_eq!(h.lines(), vec!["a"]);
    h.keys(":<BS>");
    assert_eq!(h.mode(), Mode::Normal);
    h.keys(":d<Esc>");
    assert_eq!(h.lines(), vec!["a"]);
}

#[test]
fn set_ignorecase_affects_search() {
    let mut h = Harness::new(&["x", "ABC"]);
    h.keys("/abc<CR>");
    assert_eq!(h.cursor(), (0, 0));
    h.keys(":set ic<CR>/abc<CR>");
    assert_eq!(h.cursor(), (1, 0));
}

#[test]
fn backslash_chords_toggle_options() {
    let mut h = Harness::new(&["x", "ABC"]);
    h.keys("\\n");
    assert_eq!(h.message(), ":set number");
    h.keys("\\n");
    assert_eq!(h.message(), ":set nonumber");
    h.keys("\\i");
    assert_eq!(h.message(), ":set ignorecase");
    h.keys("/abc<CR>");
    assert_eq!(h.cursor(), (1, 0));
    h.keys("\\F");
    assert_eq!(h.message(), ":set noregex");
    h.keys("k/A.C<CR>");
    assert_eq!(h.cursor(), (0, 0));
    assert_eq!(h.message(), "Pattern not found: A.C");
}

#[test]
fn shift_q_opens_the_ex_line() {
    let mut h = Harness::new(&["a", "b"]);
    h.keys("Q");
    assert_eq!(h.mode(), Mode::ExEntry(String::new()));
    h.keys("vi<CR>");
    assert_eq!(h.mode(), Mode::Normal);
    h.keys("Q2d<CR>");
    assert_eq!(h.lines(), vec!["a"]);
}
