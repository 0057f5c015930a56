use std::collections::{BTreeMap, HashMap};
use tracing::trace;

use crate::domain::SurveyColumn;
use crate::table::Table;

pub const PEOPLE_COUNT: &str = "Number of People";
pub const COUNT: &str = "Count";
pub const INTERESTED_YES: &str = "Yes";

/// Category value to row count, in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    pub key_name: &'static str,
    pub count_name: &'static str,
    pub rows: Vec<(String, usize)>,
}

impl FrequencyTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, c)| c).sum()
    }

    /// Share of each value in percent of the counted rows.
    pub fn shares(&self) -> Vec<(String, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        self.rows
            .iter()
            .map(|(k, c)| (k.clone(), *c as f64 * 100.0 / total as f64))
            .collect()
    }
}

/// Descending count, ties in first seen order. Missing values are not counted.
pub fn value_counts(table: &Table, rows: &[usize], column: SurveyColumn) -> FrequencyTable {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &r in rows {
        if let Some(v) = table.value(column, r) {
            let count = counts.entry(v).or_insert_with(|| {
                order.push(v);
                0
            });
            *count += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| (v.to_string(), counts[v]))
        .collect();
    // stable, keeps first seen order between equal counts
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    FrequencyTable {
        key_name: column.name(),
        count_name: PEOPLE_COUNT,
        rows: sorted,
    }
}

/// Ascending key order. Missing values are not counted.
pub fn group_counts(
    table: &Table,
    rows: &[usize],
    column: SurveyColumn,
    count_name: &'static str,
) -> FrequencyTable {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &r in rows {
        if let Some(v) = table.value(column, r) {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    FrequencyTable {
        key_name: column.name(),
        count_name,
        rows: counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect(),
    }
}

pub fn constituency_counts(table: &Table, rows: &[usize]) -> FrequencyTable {
    value_counts(table, rows, SurveyColumn::Constituency)
}

pub fn gender_counts(table: &Table, rows: &[usize]) -> FrequencyTable {
    value_counts(table, rows, SurveyColumn::Gender)
}

pub fn occupation_counts(table: &Table, rows: &[usize]) -> FrequencyTable {
    group_counts(table, rows, SurveyColumn::Occupation, COUNT)
}

/// Rows whose Interested field is exactly "Yes".
pub fn interested_rows(table: &Table, rows: &[usize]) -> Vec<usize> {
    rows.iter()
        .copied()
        .filter(|&r| table.value(SurveyColumn::Interested, r) == Some(INTERESTED_YES))
        .collect()
}

pub fn interested_constituency_counts(table: &Table, rows: &[usize]) -> FrequencyTable {
    let interested = interested_rows(table, rows);
    group_counts(table, &interested, SurveyColumn::Constituency, PEOPLE_COUNT)
}

/// Everything the dashboard charts need for one filtered row set.
#[derive(Debug, Clone)]
pub struct Aggregates {
    pub constituency: FrequencyTable,
    pub gender: FrequencyTable,
    pub occupation: FrequencyTable,
    pub interested_constituency: FrequencyTable,
    pub interested_rows: Vec<usize>,
}

impl Aggregates {
    pub fn build(table: &Table, rows: &[usize]) -> Self {
        let aggregates = Self {
            constituency: constituency_counts(table, rows),
            gender: gender_counts(table, rows),
            occupation: occupation_counts(table, rows),
            interested_constituency: interested_constituency_counts(table, rows),
            interested_rows: interested_rows(table, rows),
        };
        trace!(
            "Aggregated {} rows: {} constituencies, {} interested",
            rows.len(),
            aggregates.constituency.rows.len(),
            aggregates.interested_rows.len()
        );
        aggregates
    }
}
