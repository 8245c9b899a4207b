use super::*;
use pretty_assertions::assert_eq;

#[test]
fn all_is_in_index_order() {
    assert_eq!(LexicalSuperstate::ALL.len(), LexicalSuperstate::COUNT);
    for (index, superstate) in LexicalSuperstate::ALL.iter().enumerate() {
        assert_eq!(superstate.index(), index);
        assert_eq!(LexicalSuperstate::from_index(index), Some(*superstate));
    }
    assert_eq!(LexicalSuperstate::from_index(LexicalSuperstate::COUNT), None);
}

#[test]
fn comment_slots_match_commentable_table() {
    for (slot, superstate) in LexicalSuperstate::COMMENTABLE.iter().enumerate() {
        assert_eq!(superstate.comment_slot(), Some(slot));
    }
    let commentable = LexicalSuperstate::ALL
        .iter()
        .filter(|s| s.is_commentable())
        .count();
    assert_eq!(commentable, LexicalSuperstate::COMMENTABLE_COUNT);
}

#[test]
fn strings_cannot_hold_comments() {
    assert!(!LexicalSuperstate::I7String.is_commentable());
    assert!(!LexicalSuperstate::I6Comment.is_commentable());
    assert!(LexicalSuperstate::I7InI6Comment.is_commentable());
}

#[test]
fn movable_comment_levels_are_commentable() {
    let movable: Vec<_> = LexicalSuperstate::ALL
        .iter()
        .filter(|s| s.has_movable_comments())
        .collect();
    assert_eq!(movable.len(), 4);
    assert!(movable.iter().all(|s| s.is_commentable()));
}

#[test]
fn display_strings() {
    assert_eq!(LexicalSuperstate::I7.to_string(), "7");
    assert_eq!(LexicalSuperstate::I6.to_string(), "(-6-)");
    assert_eq!(LexicalSuperstate::I7InExtract.to_string(), "*:7");
    assert_eq!(
        LexicalSuperstate::I7SubstitutionInI6CommentInRoutineInExtract.to_string(),
        "*:[!(+\"[7]\"+)]"
    );
}

#[test]
fn state_display_includes_depth() {
    assert_eq!(INITIAL_LEXICAL_STATE.to_string(), "7");
    let nested = LexicalState::with_depth(LexicalSuperstate::I7InI6, 2);
    assert_eq!(nested.to_string(), "(+7+)+2");
    assert!(nested.in_comment());
    assert!(!INITIAL_LEXICAL_STATE.in_comment());
}
