//! Aggregate statistics over a snapshot of visit records.
//!
//! Every function here is pure: it reads the slice it is given, never mutates
//! it, and returns fresh values. Empty input degrades to `0.0`, an empty
//! `Vec`, or [`NO_RECORDS_LABEL`] instead of failing.
//!
//! Grouping goes through an insertion-ordered [`IndexMap`] and rankings use a
//! stable sort, so groups with equal averages (or equal counts) keep the
//! order in which they were first seen in the input.

use indexmap::IndexMap;
use serde::Serialize;

use crate::records::VisitRecord;

/// Label returned by [`most_common_type`] when there is nothing to count.
pub const NO_RECORDS_LABEL: &str = "无记录";

pub const DEFAULT_TOP_LIMIT: usize = 5;

/// Number of entries in the "top rated" section of a [`Summary`].
pub const SUMMARY_TOP_LIMIT: usize = 10;

/// Inclusive `[start, end]` range over `YYYY-MM-DD` date strings.
///
/// Both bounds are always present; a half-open range is never applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Builds a range only when both bounds are given and non-empty.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        match (start, end) {
            (Some(s), Some(e)) if !s.is_empty() && !e.is_empty() => Some(Self::new(s, e)),
            _ => None,
        }
    }

    /// Raw string comparison; correct for zero-padded `YYYY-MM-DD` dates.
    pub fn contains(&self, date: &str) -> bool {
        self.start.as_str() <= date && date <= self.end.as_str()
    }
}

/// Optional exact-match filters applied before averaging.
///
/// An empty name or type string is treated the same as no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub date_range: Option<DateRange>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn matches(&self, record: &VisitRecord) -> bool {
        if let Some(name) = non_empty(&self.name) {
            if record.name != name {
                return false;
            }
        }
        if let Some(category) = non_empty(&self.category) {
            if record.category != category {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(&record.date) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A restaurant and its mean score across all of its visits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantScore {
    pub name: String,
    pub average: f64,
}

impl From<RestaurantScore> for (String, f64) {
    fn from(score: RestaurantScore) -> Self {
        (score.name, score.average)
    }
}

/// A ranking row enriched with its position and the restaurant's type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRestaurant {
    pub rank: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub average: f64,
}

/// Share of all visits that fall under one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub category: String,
    pub count: usize,
    pub percentage: f64,
    pub average: f64,
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean score of the records that pass `filter`, or `0.0` if none do.
pub fn average_score(records: &[VisitRecord], filter: &RecordFilter) -> f64 {
    let scores: Vec<f64> = records
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| r.score)
        .collect();
    mean(&scores)
}

/// Per-restaurant mean score, highest first.
///
/// Restaurants with equal averages stay in first-encounter order.
pub fn restaurant_average_scores(records: &[VisitRecord]) -> Vec<RestaurantScore> {
    rank_by_average(records.iter())
}

/// The most visited type as `"<type> (<count>次)"`.
///
/// When two types share the highest count the one seen first wins.
pub fn most_common_type(records: &[VisitRecord], date_range: Option<&DateRange>) -> String {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in records {
        if date_range.is_some_and(|range| !range.contains(&record.date)) {
            continue;
        }
        *counts.entry(record.category.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (category, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((category, count));
        }
    }

    match best {
        Some((category, count)) => format!("{category} ({count}次)"),
        None => NO_RECORDS_LABEL.to_string(),
    }
}

/// The `limit` best-rated restaurants, optionally within a single type.
pub fn top_restaurants(
    records: &[VisitRecord],
    limit: usize,
    category: Option<&str>,
) -> Vec<RestaurantScore> {
    let category = category.filter(|c| !c.is_empty());
    let mut ranked = rank_by_average(
        records
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c)),
    );
    ranked.truncate(limit);
    ranked
}

/// Visit count, share of all visits and mean score for every type, in
/// first-encounter order.
pub fn type_distribution(records: &[VisitRecord]) -> Vec<TypeShare> {
    let total = records.len();
    let mut groups: IndexMap<&str, (f64, usize)> = IndexMap::new();
    for record in records {
        let entry = groups.entry(record.category.as_str()).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(category, (sum, count))| TypeShare {
            category: category.to_string(),
            count,
            percentage: pct(count, total),
            average: sum / count as f64,
        })
        .collect()
}

/// Type of the first record carrying `name`.
pub fn restaurant_category<'a>(records: &'a [VisitRecord], name: &str) -> Option<&'a str> {
    records
        .iter()
        .find(|r| r.name == name)
        .map(|r| r.category.as_str())
}

/// Attaches rank numbers and restaurant types to a ranking.
///
/// Types are looked up in `records`, so pass the same slice the ranking was
/// computed from.
pub fn label_ranking(
    records: &[VisitRecord],
    scores: Vec<RestaurantScore>,
) -> Vec<RankedRestaurant> {
    scores
        .into_iter()
        .enumerate()
        .map(|(i, score)| RankedRestaurant {
            rank: i + 1,
            category: restaurant_category(records, &score.name)
                .unwrap_or_default()
                .to_string(),
            name: score.name,
            average: score.average,
        })
        .collect()
}

/// [`top_restaurants`] with rank numbers, each row labelled with the type it
/// was ranked under.
pub fn ranked_top(
    records: &[VisitRecord],
    limit: usize,
    category: Option<&str>,
) -> Vec<RankedRestaurant> {
    let category = category.filter(|c| !c.is_empty());
    let in_category: Vec<VisitRecord> = records
        .iter()
        .filter(|r| category.is_none_or(|c| r.category == c))
        .cloned()
        .collect();
    let top = top_restaurants(&in_category, limit, None);
    label_ranking(&in_category, top)
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

fn rank_by_average<'a>(records: impl Iterator<Item = &'a VisitRecord>) -> Vec<RestaurantScore> {
    let mut groups: IndexMap<&str, (f64, usize)> = IndexMap::new();
    for record in records {
        let entry = groups.entry(record.name.as_str()).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;
    }

    let mut ranked: Vec<RestaurantScore> = groups
        .into_iter()
        .map(|(name, (sum, count))| RestaurantScore {
            name: name.to_string(),
            average: sum / count as f64,
        })
        .collect();

    // sort_by is stable: ties keep first-encounter order.
    ranked.sort_by(|a, b| b.average.total_cmp(&a.average));
    ranked
}

/// Everything the statistics report shows, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub date_range: Option<DateRange>,
    pub total_records: usize,
    pub average_score: f64,
    pub most_common_type: String,
    pub ranking: Vec<RankedRestaurant>,
    pub types: Vec<TypeShare>,
    pub top: Vec<RankedRestaurant>,
}

impl Summary {
    /// Summarises `records`, restricted to `date_range` when one is given.
    pub fn from_records(records: &[VisitRecord], date_range: Option<&DateRange>) -> Self {
        let in_range: Vec<VisitRecord> = records
            .iter()
            .filter(|r| date_range.is_none_or(|range| range.contains(&r.date)))
            .cloned()
            .collect();

        let ranking = label_ranking(&in_range, restaurant_average_scores(&in_range));
        let top = ranking.iter().take(SUMMARY_TOP_LIMIT).cloned().collect();

        Summary {
            date_range: date_range.cloned(),
            total_records: in_range.len(),
            average_score: average_score(&in_range, &RecordFilter::new()),
            most_common_type: most_common_type(&in_range, None),
            types: type_distribution(&in_range),
            ranking,
            top,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}
