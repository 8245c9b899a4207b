use super::*;

#[test]
fn test_intern_and_lookup() {
    let mut vocabulary = Vocabulary::new();

    let hello = vocabulary.intern("hello");
    let world = vocabulary.intern("world");
    let hello2 = vocabulary.intern("hello");

    assert_eq!(hello, hello2);
    assert_ne!(hello, world);

    assert_eq!(vocabulary.lookup(hello), "hello");
    assert_eq!(vocabulary.lookup(world), "world");
}

#[test]
fn test_empty_string() {
    let mut vocabulary = Vocabulary::new();
    assert_eq!(vocabulary.intern(""), Word::EMPTY);
    assert_eq!(vocabulary.lookup(Word::EMPTY), "");
    assert_eq!(vocabulary.len(), 1);
    assert!(!vocabulary.is_empty());
}

#[test]
fn test_get_does_not_intern() {
    let mut vocabulary = Vocabulary::new();
    assert_eq!(vocabulary.get("lantern"), None);
    assert_eq!(vocabulary.len(), 1);

    let lantern = vocabulary.intern("lantern");
    assert_eq!(vocabulary.get("lantern"), Some(lantern));
}

#[test]
fn test_non_ascii_texts() {
    let mut vocabulary = Vocabulary::new();
    let cafe = vocabulary.intern("café");
    let kanji = vocabulary.intern("部屋");
    assert_eq!(vocabulary.lookup(cafe), "café");
    assert_eq!(vocabulary.lookup(kanji), "部屋");
}

#[test]
fn test_words_are_dense() {
    let mut vocabulary = Vocabulary::new();
    let words: Vec<Word> = ["a", "b", "c"].iter().map(|t| vocabulary.intern(t)).collect();
    let raws: Vec<u32> = words.iter().map(|w| w.raw()).collect();
    assert_eq!(raws, vec![1, 2, 3]);
}
