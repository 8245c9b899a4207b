use super::*;
use pretty_assertions::assert_eq;

/// Non-commutative test monoid: string concatenation ordered by length.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Concat(String);

impl Monoid for Concat {
    fn identity() -> Self {
        Concat(String::new())
    }

    fn combine(&self, other: &Self) -> Self {
        Concat(format!("{}{}", self.0, other.0))
    }
}

impl MonoidOrd for Concat {
    fn precedes(&self, other: &Self) -> bool {
        self.0.len() < other.0.len()
    }
}

/// Commutative test monoid.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Count(u64);

impl Monoid for Count {
    const COMMUTATIVE: bool = true;

    fn identity() -> Self {
        Count(0)
    }

    fn combine(&self, other: &Self) -> Self {
        Count(self.0 + other.0)
    }
}

impl MonoidOrd for Count {
    fn precedes(&self, other: &Self) -> bool {
        self.0 < other.0
    }
}

fn concat(text: &str) -> Concat {
    Concat(text.to_string())
}

fn build(parts: &[&str]) -> MonoidSequence<Concat> {
    let mut sequence = MonoidSequence::new();
    for part in parts {
        sequence.insert(sequence.end(), concat(part));
    }
    sequence
}

fn contents(sequence: &MonoidSequence<Concat>) -> Vec<String> {
    sequence.iter().map(|(_, value)| value.0.clone()).collect()
}

// === Construction ===

#[test]
fn empty_sequence() {
    let sequence: MonoidSequence<Concat> = MonoidSequence::new();
    assert!(sequence.is_empty());
    assert_eq!(sequence.len(), 0);
    assert_eq!(sequence.begin(), sequence.end());
    assert_eq!(sequence.total(), Concat::identity());
    assert_eq!(sequence.find(&concat("")), sequence.end());
}

#[test]
fn append_preserves_order() {
    let sequence = build(&["ab", "c", "def"]);
    assert_eq!(contents(&sequence), vec!["ab", "c", "def"]);
    assert_eq!(sequence.total(), concat("abcdef"));
    assert_eq!(sequence.len(), 3);
}

#[test]
fn insert_before_position() {
    let mut sequence = build(&["a", "c"]);
    let c = sequence.nth(1);
    let b = sequence.insert(c, concat("b"));
    assert_eq!(contents(&sequence), vec!["a", "b", "c"]);
    assert_eq!(sequence.get(b), Some(&concat("b")));
    assert_eq!(sequence.next(b), c);
}

// === Navigation ===

#[test]
fn next_and_prev_saturate() {
    let sequence = build(&["x", "y"]);
    let first = sequence.begin();
    let second = sequence.next(first);
    assert_eq!(sequence.prev(first), first);
    assert_eq!(sequence.next(second), sequence.end());
    assert_eq!(sequence.next(sequence.end()), sequence.end());
    assert_eq!(sequence.prev(sequence.end()), second);
    assert_eq!(sequence.last(), second);
}

#[test]
fn rank_and_nth_agree() {
    let sequence = build(&["a", "b", "c", "d", "e", "f", "g"]);
    for rank in 0..sequence.len() {
        assert_eq!(sequence.rank(sequence.nth(rank)), rank);
    }
    assert_eq!(sequence.nth(7), sequence.end());
    assert_eq!(sequence.rank(sequence.end()), 7);
}

// === Erasure ===

#[test]
fn erase_returns_following_position() {
    let mut sequence = build(&["a", "b", "c"]);
    let b = sequence.nth(1);
    let after = sequence.erase(b);
    assert_eq!(sequence.get(after), Some(&concat("c")));
    assert_eq!(contents(&sequence), vec!["a", "c"]);
    assert_eq!(sequence.total(), concat("ac"));
}

#[test]
fn erased_leaves_go_stale() {
    let mut sequence = build(&["a", "b"]);
    let leaf = sequence.begin().leaf();
    let Some(leaf) = leaf else {
        panic!("non-empty sequence has a first leaf");
    };
    sequence.erase(sequence.begin());
    assert!(!sequence.contains(leaf));
    assert_eq!(sequence.get_leaf(leaf), None);
    // The freed slot is reused without resurrecting the old leaf.
    sequence.insert(sequence.end(), concat("z"));
    assert_eq!(sequence.get_leaf(leaf), None);
    assert_eq!(sequence.cursor(leaf), None);
}

#[test]
fn erase_last_element_empties() {
    let mut sequence = build(&["only"]);
    let after = sequence.erase(sequence.begin());
    assert_eq!(after, sequence.end());
    assert!(sequence.is_empty());
}

// === Sums ===

#[test]
fn prefix_sums_are_in_order() {
    let sequence = build(&["ab", "cd", "ef", "gh"]);
    let third = sequence.nth(2);
    assert_eq!(sequence.prefix_sum(third), concat("abcd"));
    assert_eq!(sequence.prefix_sum(sequence.begin()), concat(""));
    assert_eq!(sequence.prefix_sum(sequence.end()), concat("abcdefgh"));
}

#[test]
fn interval_sums() {
    let sequence = build(&["a", "b", "c", "d", "e"]);
    let b = sequence.nth(1);
    let e = sequence.nth(4);
    assert_eq!(sequence.sum_over_interval(b, e), concat("bcd"));
    assert_eq!(sequence.sum_over_interval(e, b), concat(""));
    assert_eq!(sequence.sum_over_interval(b, sequence.end()), concat("bcde"));
}

#[test]
fn find_locates_running_sum() {
    let sequence = build(&["ab", "cde", "f"]);
    // Running sums: 2, 5, 6.
    assert_eq!(sequence.find(&concat("")), sequence.nth(0));
    assert_eq!(sequence.find(&concat("x")), sequence.nth(0));
    assert_eq!(sequence.find(&concat("xx")), sequence.nth(1));
    assert_eq!(sequence.find(&concat("xxxx")), sequence.nth(1));
    assert_eq!(sequence.find(&concat("xxxxx")), sequence.nth(2));
    assert_eq!(sequence.find(&concat("xxxxxx")), sequence.end());
}

#[test]
fn commutative_sequence_sums() {
    let mut sequence = MonoidSequence::new();
    for n in 1..=100 {
        let at = sequence.nth(sequence.len() / 2);
        sequence.insert(at, Count(n));
    }
    assert_eq!(sequence.total(), Count(5050));
    assert_eq!(sequence.find(&Count(0)), sequence.begin());
    let mut running = 0;
    for (cursor, value) in sequence.iter() {
        assert_eq!(sequence.prefix_sum(cursor), Count(running));
        running += value.0;
    }
}

// === Balance ===

#[test]
fn appends_stay_shallow() {
    let mut sequence = MonoidSequence::new();
    for n in 0..4096 {
        sequence.insert(sequence.end(), Count(n));
    }
    // log2(4096) = 12; weight balance keeps height within log_{4/3}.
    assert!(sequence.height() <= 40, "height {}", sequence.height());
}

#[test]
fn front_inserts_stay_shallow() {
    let mut sequence = MonoidSequence::new();
    for n in 0..4096 {
        sequence.insert(sequence.begin(), Count(n));
    }
    assert!(sequence.height() <= 40, "height {}", sequence.height());
    assert_eq!(sequence.get(sequence.begin()), Some(&Count(4095)));
}

#[test]
fn erasing_every_other_element_keeps_weight_balance() {
    let mut sequence = MonoidSequence::new();
    for n in 0..1024 {
        sequence.insert(sequence.end(), Count(n));
        assert_eq!(sequence.imbalance(), None);
    }
    let mut cursor = sequence.begin();
    while !cursor.is_end() {
        cursor = sequence.erase(cursor);
        cursor = sequence.next(cursor);
        assert_eq!(sequence.imbalance(), None);
    }
    assert_eq!(sequence.len(), 512);
    assert_eq!(sequence.get(sequence.begin()), Some(&Count(1)));
}

// === Property Tests ===

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Insert(usize, char),
        Erase(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (any::<usize>(), prop::char::range('a', 'z')).prop_map(|(at, c)| Op::Insert(at, c)),
            1 => any::<usize>().prop_map(Op::Erase),
        ]
    }

    proptest! {
        /// Sums always split: sum(i, k) == sum(i, j) + sum(j, k).
        #[test]
        fn interval_sums_split(ops in prop::collection::vec(op(), 1..120), i in any::<usize>(), j in any::<usize>(), k in any::<usize>()) {
            let mut sequence = MonoidSequence::new();
            let mut model: Vec<char> = Vec::new();
            for op in ops {
                match op {
                    Op::Insert(at, c) => {
                        let at = at % (model.len() + 1);
                        sequence.insert(sequence.nth(at), Concat(c.to_string()));
                        model.insert(at, c);
                    }
                    Op::Erase(at) => {
                        if !model.is_empty() {
                            let at = at % model.len();
                            sequence.erase(sequence.nth(at));
                            model.remove(at);
                        }
                    }
                }
            }
            let text: String = model.iter().collect();
            prop_assert_eq!(sequence.total(), Concat(text.clone()));

            let mut bounds = [i % (model.len() + 1), j % (model.len() + 1), k % (model.len() + 1)];
            bounds.sort_unstable();
            let [i, j, k] = bounds;
            let (ci, cj, ck) = (sequence.nth(i), sequence.nth(j), sequence.nth(k));
            let whole = sequence.sum_over_interval(ci, ck);
            prop_assert_eq!(whole.clone(), Concat(text[i..k].to_string()));
            prop_assert_eq!(sequence.sum_over_interval(ci, cj).combine(&sequence.sum_over_interval(cj, ck)), whole);
            prop_assert_eq!(sequence.prefix_sum(cj), Concat(text[..j].to_string()));
        }

        /// No vertex lets one side outgrow the other by more than the balance ratio.
        #[test]
        fn edits_keep_weight_balance(ops in prop::collection::vec(op(), 1..200)) {
            let mut sequence = MonoidSequence::new();
            let mut len = 0;
            for op in ops {
                match op {
                    Op::Insert(at, c) => {
                        sequence.insert(sequence.nth(at % (len + 1)), Concat(c.to_string()));
                        len += 1;
                    }
                    Op::Erase(at) => {
                        if len > 0 {
                            sequence.erase(sequence.nth(at % len));
                            len -= 1;
                        }
                    }
                }
                prop_assert_eq!(sequence.imbalance(), None);
            }
            prop_assert_eq!(sequence.len(), len);
        }

        /// `find` returns the first position whose inclusive prefix passes the target.
        #[test]
        fn find_matches_linear_scan(lengths in prop::collection::vec(0_u64..5, 0..60), target in 0_u64..200) {
            let mut sequence = MonoidSequence::new();
            for &length in &lengths {
                sequence.insert(sequence.end(), Count(length));
            }
            let mut running = 0;
            let mut expected = lengths.len();
            for (index, &length) in lengths.iter().enumerate() {
                running += length;
                if target < running {
                    expected = index;
                    break;
                }
            }
            prop_assert_eq!(sequence.rank(sequence.find(&Count(target))), expected);
        }
    }
}
