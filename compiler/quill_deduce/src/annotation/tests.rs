use super::*;
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Note {
    Color(&'static str),
    Size(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum NoteKind {
    Color,
    Size,
}

impl Annotation for Note {
    type Kind = NoteKind;

    fn kind(&self) -> NoteKind {
        match self {
            Note::Color(_) => NoteKind::Color,
            Note::Size(_) => NoteKind::Size,
        }
    }
}

fn sorted_sizes(annotations: &Annotations<Note>) -> Vec<u32> {
    let mut sizes: Vec<u32> = annotations
        .of_kind(NoteKind::Size)
        .filter_map(|note| match note {
            Note::Size(size) => Some(*size),
            Note::Color(_) => None,
        })
        .collect();
    sizes.sort_unstable();
    sizes
}

// === Annotations ===

#[test]
fn add_reports_new_presence() {
    let mut annotations = Annotations::new();
    assert!(annotations.add(Note::Size(3)));
    assert!(!annotations.add(Note::Size(3)));
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations.count(&Note::Size(3)), 2);
}

#[test]
fn remove_counts_down_and_drops_empty_buckets() {
    let mut annotations = Annotations::new();
    annotations.add(Note::Color("red"));
    annotations.add(Note::Color("red"));
    assert!(!annotations.remove(&Note::Color("red")));
    assert!(annotations.has(&Note::Color("red")));
    assert!(annotations.remove(&Note::Color("red")));
    assert!(!annotations.has(&Note::Color("red")));
    assert!(annotations.is_empty());
    assert!(!annotations.remove(&Note::Color("red")));
}

#[test]
fn kinds_are_separate() {
    let mut annotations = Annotations::new();
    annotations.add(Note::Size(2));
    annotations.add(Note::Size(1));
    annotations.add(Note::Color("blue"));
    assert_eq!(sorted_sizes(&annotations), vec![1, 2]);
    assert_eq!(annotations.of_kind(NoteKind::Color).count(), 1);
    assert_eq!(annotations.iter().count(), 3);
    assert_eq!(annotations.get(&Note::Size(2)), Some(&Note::Size(2)));
    assert_eq!(annotations.get(&Note::Size(5)), None);
}

// === Fact Annotations ===

#[test]
fn negations_hold_until_marked() {
    let mut facts = FactAnnotations::new();
    assert!(facts.holds_negation(&Note::Size(0)));
    facts.surreptitiously_make_false(Note::Size(0));
    assert!(!facts.holds_negation(&Note::Size(0)));
    assert!(facts.justified().is_empty());

    assert!(facts.justify_negation(Note::Size(0)));
    assert!(facts.holds_negation(&Note::Size(0)));
    assert!(!facts.justify_negation(Note::Size(0)));
    assert_eq!(facts.justified().to_vec(), vec![Note::Size(0)]);

    assert!(facts.unjustify_negation(Note::Size(0)));
    assert!(!facts.unjustify_negation(Note::Size(0)));
    assert!(facts.justified().is_empty());
}

#[test]
fn justified_lists_both_senses() {
    let mut facts = FactAnnotations::new();
    facts.add(Note::Color("green"));
    facts.surreptitiously_make_false(Note::Size(1));
    facts.justify_negation(Note::Size(1));
    let mut justified = facts.justified().to_vec();
    justified.sort_by_key(|note| format!("{note:?}"));
    assert_eq!(justified, vec![Note::Color("green"), Note::Size(1)]);
    // Negations are not positive annotations.
    assert!(!facts.has(&Note::Size(1)));
    assert!(!facts.is_empty());
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Distinct size follows set semantics whatever the multiplicities.
        #[test]
        fn distinct_size_matches_set(ops in prop::collection::vec((any::<bool>(), 0u32..6), 0..64)) {
            let mut annotations = Annotations::new();
            let mut model: std::collections::HashMap<u32, u32> = std::collections::HashMap::new();
            for (add, value) in ops {
                if add {
                    let fresh = annotations.add(Note::Size(value));
                    let count = model.entry(value).or_insert(0);
                    *count += 1;
                    prop_assert_eq!(fresh, *count == 1);
                } else {
                    let gone = annotations.remove(&Note::Size(value));
                    let count = model.entry(value).or_insert(0);
                    let expected = *count == 1;
                    *count = count.saturating_sub(1);
                    prop_assert_eq!(gone, expected);
                }
            }
            let live = model.values().filter(|&&count| count > 0).count();
            prop_assert_eq!(annotations.len(), live);
            prop_assert_eq!(annotations.is_empty(), live == 0);
        }
    }
}
