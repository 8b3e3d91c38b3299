mod common;
use common::*;

use pretty_assertions::assert_eq;

#[test]
fn operator_motion_repeat_matches_first_application() {
    let mut once = Harness::new(&["a b c d"]);
    once.keys("dw");
    let mut twice = Harness::new(&["a b c d"]);
    twice.keys("dw.");
    assert_eq!(once.lines(), vec!["b c d"]);
    assert_eq!(twice.lines(), vec!["c d"]);
}

#[test]
fn new_count_replaces_stored_count() {
    assert_eq!(edit(&["a b c d e"], "dw2."), vec!["d e"]);
    assert_eq!(edit(&["a b c d e f"], "2dw."), vec!["e f"]);
}

#[test]
fn repeat_is_one_undo_step() {
    let mut h = Harness::new(&["a b c d"]);
    h.keys("dw.u");
    assert_eq!(h.lines(), vec!["b c d"]);
}

#[test]
fn insert_repeat_replays_typed_text() {
    assert_eq!(edit(&["x", "y"], "Ahi<Esc>j."), vec!["xhi", "yhi"]);
    assert_eq!(edit(&["a", "b"], "oz<Esc>j."), vec!["a", "z", "b", "z"]);
}

#[test]
fn change_word_repeat() {
    assert_eq!(edit(&["foo foo"], "cwbar<Esc>w."), vec!["bar bar"]);
}

#[test]
fn linewise_repeat() {
    assert_eq!(edit(&["a", "b", "c"], "dd."), vec!["c"]);
}

#[test]
fn counted_insert_repeat_keeps_count() {
    let lines = edit(&[""], "3ix<Esc>.");
    assert_eq!(lines, vec!["xxxxxx"]);
}

#[test]
fn yank_and_motion_are_not_repeated() {
    let mut h = Harness::new(&["a b c"]);
    h.keys("xyyw.");
    assert_eq!(h.lines(), vec!["  c"]);
}
