use super::*;
use pretty_assertions::assert_eq;

#[test]
fn insert_is_set_valued() {
    let mut map = MultiMap::new();
    assert!(map.insert("digits", 1));
    assert!(map.insert("digits", 2));
    assert!(!map.insert("digits", 1));
    assert_eq!(map.count(&"digits"), 2);
    assert_eq!(map.len(), 2);
}

#[test]
fn remove_drops_empty_buckets() {
    let mut map = MultiMap::new();
    map.insert(1, 'x');
    assert!(map.remove(&1, &'x'));
    assert!(!map.remove(&1, &'x'));
    assert!(map.is_empty());
    assert_eq!(map.keys().count(), 0);
}

#[test]
fn get_of_missing_key_is_empty() {
    let map: MultiMap<u8, u8> = MultiMap::new();
    assert_eq!(map.get(&9).count(), 0);
    assert!(!map.contains(&9, &9));
}

#[test]
fn get_yields_every_value() {
    let mut map = MultiMap::new();
    for value in [3, 1, 2] {
        map.insert("k", value);
    }
    let mut values: Vec<i32> = map.get(&"k").copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 2, 3]);
}
