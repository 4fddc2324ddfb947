//! Group-by counts and sums feeding charts and maps.
//!
//! Ordering rules:
//!
//! - [`count_by`] and [`sum_by`] emit groups in first-seen order.
//! - [`top_n`] keeps the `n` largest groups; ties keep first-seen order.
//! - [`sort_groups`] is a stable sort, so equal values keep their relative order.
//! - [`shares`] carries exact percentages; rounding happens in [`Share::display`].

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    hash::Hash,
};

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<K, V = usize> {
    pub key: K,
    pub value: V,
}

impl<K, V> Group<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Value,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

pub fn count_by<'a, T, K, I, F>(rows: I, mut key: F) -> Vec<Group<K>>
where
    T: 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K>> = Vec::new();
    for row in rows {
        let k = key(row);
        match positions.get(&k) {
            Some(&idx) => groups[idx].value += 1,
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push(Group::new(k, 1));
            }
        }
    }
    groups
}

/// Sums `value` per key; rows whose value is `None` still create their group.
pub fn sum_by<'a, T, K, I, F, G>(rows: I, mut key: F, mut value: G) -> Vec<Group<K, f64>>
where
    T: 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
    G: FnMut(&T) -> Option<f64>,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K, f64>> = Vec::new();
    for row in rows {
        let k = key(row);
        let amount = value(row).unwrap_or(0.0);
        match positions.get(&k) {
            Some(&idx) => groups[idx].value += amount,
            None => {
                positions.insert(k.clone(), groups.len());
                groups.push(Group::new(k, amount));
            }
        }
    }
    groups
}

fn compare_values<V: PartialOrd>(a: &V, b: &V) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// The `n` largest groups by value; `n == 0` keeps every group. Ties keep input order.
pub fn top_n<K, V: PartialOrd>(mut groups: Vec<Group<K, V>>, n: usize) -> Vec<Group<K, V>> {
    groups.sort_by(|a, b| compare_values(&b.value, &a.value));
    if n > 0 && groups.len() > n {
        groups.truncate(n);
    }
    groups
}

pub fn sort_groups<K: Ord, V: PartialOrd>(
    groups: &mut [Group<K, V>],
    by: SortBy,
    direction: Direction,
) {
    groups.sort_by(|a, b| {
        let ordering = match by {
            SortBy::Value => compare_values(&a.value, &b.value),
            SortBy::Category => a.key.cmp(&b.key),
        };
        match direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share<K> {
    pub key: K,
    pub count: usize,
    pub percent: f64,
}

impl<K> Share<K> {
    pub fn display(&self) -> String {
        format!("{:.2}%", self.percent)
    }
}

/// Percentage of the groups' own total per group, unrounded.
pub fn shares<K: Clone>(groups: &[Group<K>]) -> Vec<Share<K>> {
    let total = groups.iter().map(|g| g.value).sum();
    shares_of(groups, total)
}

/// Percentage of `total` per group, unrounded. Pass the size of the whole
/// subset when `groups` has already been cut down by [`top_n`].
pub fn shares_of<K: Clone>(groups: &[Group<K>], total: usize) -> Vec<Share<K>> {
    if total == 0 {
        return Vec::new();
    }
    groups
        .iter()
        .map(|group| Share {
            key: group.key.clone(),
            count: group.value,
            percent: group.value as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Distinct keys among `rows`. Return `Option` keys to let missing values collapse into one.
pub fn distinct_count<'a, T, K, I, F>(rows: I, mut key: F) -> usize
where
    T: 'a + ?Sized,
    I: IntoIterator<Item = &'a T>,
    K: Eq + Hash,
    F: FnMut(&'a T) -> K,
{
    rows.into_iter().map(&mut key).collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(pairs: &[(&'static str, usize)]) -> Vec<Group<&'static str>> {
        pairs.iter().map(|(k, v)| Group::new(*k, *v)).collect()
    }

    fn keys<V>(groups: &[Group<&'static str, V>]) -> Vec<&'static str> {
        groups.iter().map(|g| g.key).collect()
    }

    #[test]
    fn count_by_keeps_first_seen_order() {
        let rows = ["b", "a", "b", "c", "a", "b"];
        let counted = count_by(rows.iter(), |s: &&str| *s);
        assert_eq!(counted, groups(&[("b", 3), ("a", 2), ("c", 1)]));
    }

    #[test]
    fn top_n_breaks_ties_by_first_seen_order() {
        let input = groups(&[("C", 5), ("A", 10), ("B", 10)]);
        let top = top_n(input, 2);
        assert_eq!(keys(&top), vec!["A", "B"]);

        let reversed = groups(&[("C", 5), ("B", 10), ("A", 10)]);
        assert_eq!(keys(&top_n(reversed, 2)), vec!["B", "A"]);
    }

    #[test]
    fn top_zero_keeps_everything() {
        let input = groups(&[("x", 1), ("y", 3)]);
        assert_eq!(keys(&top_n(input, 0)), vec!["y", "x"]);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let mut input = groups(&[("p", 2), ("q", 1), ("r", 2), ("s", 1)]);
        sort_groups(&mut input, SortBy::Value, Direction::Asc);
        assert_eq!(keys(&input), vec!["q", "s", "p", "r"]);

        let mut input = groups(&[("p", 2), ("q", 1), ("r", 2), ("s", 1)]);
        sort_groups(&mut input, SortBy::Value, Direction::Desc);
        assert_eq!(keys(&input), vec!["p", "r", "q", "s"]);

        sort_groups(&mut input, SortBy::Category, Direction::Desc);
        assert_eq!(keys(&input), vec!["s", "r", "q", "p"]);
    }

    #[test]
    fn shares_sum_to_one_hundred_without_rounding() {
        let input = groups(&[("a", 1), ("b", 1), ("c", 1)]);
        let result = shares(&input);
        let total: f64 = result.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(result[0].display(), "33.33%");
        assert!(shares::<&str>(&[]).is_empty());
    }

    #[test]
    fn shares_after_top_n_keep_the_subset_total() {
        let input = groups(&[("a", 1), ("b", 6), ("c", 3)]);
        let total = input.iter().map(|g| g.value).sum();
        let kept = top_n(input, 1);
        let result = shares_of(&kept, total);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].key, "b");
        assert!((result[0].percent - 60.0).abs() < 1e-9);
        assert!(shares_of(&kept, 0).is_empty());
    }

    #[test]
    fn sum_by_accumulates_and_skips_missing_values() {
        let rows = [("a", Some(1.5)), ("b", None), ("a", Some(2.0))];
        let summed = sum_by(rows.iter(), |r: &(&str, Option<f64>)| r.0, |r| r.1);
        assert_eq!(summed, vec![Group::new("a", 3.5), Group::new("b", 0.0)]);
    }

    #[test]
    fn distinct_count_collapses_duplicates_and_nulls() {
        let codes = [Some("S1"), Some("S1"), Some("S2"), None, None];
        assert_eq!(distinct_count(codes.iter(), |c| *c), 3);
    }
}
