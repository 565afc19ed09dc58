//! Non-mutating set algebra over ordered sets.
//!
//! Symmetric operations iterate the smaller operand; results never depend on
//! operand order. `difference(a, b)` is the one asymmetric operation: the
//! elements of `a` absent from `b`.

use std::collections::BTreeSet;

/// Feature names supported by one browser version.
pub type FeatureSet = BTreeSet<String>;

fn by_size<'a, T>(a: &'a BTreeSet<T>, b: &'a BTreeSet<T>) -> (&'a BTreeSet<T>, &'a BTreeSet<T>) {
    if b.len() < a.len() { (b, a) } else { (a, b) }
}

#[must_use]
pub fn union<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    let (small, large) = by_size(a, b);
    let mut result = large.clone();
    result.extend(small.iter().cloned());
    result
}

#[must_use]
pub fn intersection<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    let (small, large) = by_size(a, b);
    small
        .iter()
        .filter(|item| large.contains(*item))
        .cloned()
        .collect()
}

#[must_use]
pub fn difference<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.iter().filter(|item| !b.contains(*item)).cloned().collect()
}

#[must_use]
pub fn symmetric_difference<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    let (small, large) = by_size(a, b);
    let mut result = large.clone();
    for item in small {
        if !result.remove(item) {
            result.insert(item.clone());
        }
    }
    result
}

pub fn is_subset_of<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    a.len() <= b.len() && a.iter().all(|item| b.contains(item))
}

pub fn is_superset_of<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    is_subset_of(b, a)
}

pub fn is_disjoint_from<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    let (small, large) = by_size(a, b);
    !small.iter().any(|item| large.contains(item))
}

/// Keep only the elements of `a` that are also in `b`.
pub fn intersect_in_place<T: Ord>(a: &mut BTreeSet<T>, b: &BTreeSet<T>) {
    a.retain(|item| b.contains(item));
}
