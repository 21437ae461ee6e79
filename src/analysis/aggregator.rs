//! Aggregate statistics over table rows.
//!
//! These are the building blocks of the question set: rankings, frequency
//! counts, cohort splits and the two-variable statistics. Every ranking
//! here is deterministic: numeric rankings are stable with respect to input
//! order, frequency rankings break ties alphabetically.

use chrono::{DateTime, Datelike, TimeZone, Weekday};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Rows matching `predicate`, sorted by `key` descending, first `k`.
///
/// Ties keep their input order.
pub fn top_k_by<'a, T, P, K>(rows: &'a [T], predicate: P, key: K, k: usize) -> Vec<&'a T>
where
    P: Fn(&T) -> bool,
    K: Fn(&T) -> f64,
{
    let mut selected: Vec<&T> = rows.iter().filter(|row| predicate(*row)).collect();
    selected.sort_by(|a, b| key(*b).partial_cmp(&key(*a)).unwrap_or(Ordering::Equal));
    selected.truncate(k);
    selected
}

/// First `n` rows by ascending `key`. Ties keep their input order.
pub fn earliest_n<'a, T, K, F>(rows: &'a [T], key: F, n: usize) -> Vec<&'a T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut sorted: Vec<&T> = rows.iter().collect();
    sorted.sort_by_key(|row| key(*row));
    sorted.truncate(n);
    sorted
}

/// Count non-empty values, most frequent first, ties alphabetical.
pub fn frequencies<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for value in values {
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// The `k` most frequent non-empty values.
pub fn top_k_frequent<'a, I>(values: I, k: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    frequencies(values)
        .into_iter()
        .take(k)
        .map(|(value, _)| value)
        .collect()
}

/// The `n`-th (1-based) most frequent non-empty value.
pub fn nth_most_frequent<'a, I>(values: I, n: usize) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let index = n.checked_sub(1)?;
    frequencies(values).into_iter().nth(index).map(|(value, _)| value)
}

/// Most frequent non-empty value.
pub fn mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    nth_most_frequent(values, 1)
}

/// Every value tied at the highest count, sorted alphabetically.
pub fn tied_at_max(ranked: &[(String, usize)]) -> Vec<String> {
    let Some(max) = ranked.iter().map(|(_, count)| *count).max() else {
        return Vec::new();
    };

    let mut tied: Vec<String> = ranked
        .iter()
        .filter(|(_, count)| *count == max)
        .map(|(value, _)| value.clone())
        .collect();
    tied.sort();
    tied
}

/// Partition rows into (matching, not matching).
pub fn split_cohorts<'a, T, P>(rows: &'a [T], predicate: P) -> (Vec<&'a T>, Vec<&'a T>)
where
    P: Fn(&T) -> bool,
{
    rows.iter().partition(|row| predicate(*row))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation coefficient.
///
/// `None` when the series differ in length, have fewer than two points or
/// either has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let (sxx, syy, sxy) = centered_sums(xs, ys)?;
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

/// Ordinary least squares slope of `ys` regressed on `xs`.
///
/// `None` when the series differ in length, have fewer than two points or
/// `xs` has zero variance.
pub fn ols_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let (sxx, _, sxy) = centered_sums(xs, ys)?;
    if sxx == 0.0 {
        return None;
    }
    Some(sxy / sxx)
}

/// Sums of squared deviations and cross deviations.
fn centered_sums(xs: &[f64], ys: &[f64]) -> Option<(f64, f64, f64)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    Some((sxx, syy, sxy))
}

/// Group `(category, value)` pairs, average each group, return the group
/// with the highest mean. Empty categories are skipped; ties go to the
/// alphabetically first category.
pub fn max_group_mean<'a, I>(pairs: I) -> Option<(String, f64)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for (category, value) in pairs {
        if category.is_empty() {
            continue;
        }
        let entry = groups.entry(category).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut best: Option<(&str, f64)> = None;
    for (category, (sum, count)) in groups {
        let avg = sum / count as f64;
        if best.map_or(true, |(_, top)| avg > top) {
            best = Some((category, avg));
        }
    }

    best.map(|(category, avg)| (category.to_string(), avg))
}

/// `mean(a) - mean(b)`, `None` if either cohort is empty.
pub fn difference_of_means(a: &[f64], b: &[f64]) -> Option<f64> {
    Some(mean(a)? - mean(b)?)
}

/// Whether a timestamp falls on Saturday or Sunday in its own time zone.
pub fn is_weekend<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> bool {
    matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Render a number with exactly three decimals.
pub fn format_decimal(value: f64) -> String {
    format!("{:.3}", value)
}

/// Comma-join a list, preserving order.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}
