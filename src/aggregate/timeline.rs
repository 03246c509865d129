//! Time Bucketer Module
//! Counts binned categories per calendar month in long format.

use super::{AggregateError, Taxonomy};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One observed (month, category) combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCategoryCount {
    pub month: String,
    pub category: String,
    pub count: u64,
}

/// Monthly bucketing of labeled accident tables.
pub struct TimeBucketer;

impl TimeBucketer {
    /// Year-month key, e.g. `2020-03`.
    pub fn month_key(date: NaiveDate) -> String {
        date.format("%Y-%m").to_string()
    }

    /// Count rows per (month, label).
    ///
    /// Rows are sorted by month, then by the label's position in `taxonomy`.
    /// Only observed combinations are returned; rows with a null date or label
    /// are skipped.
    pub fn monthly_counts(
        df: &DataFrame,
        date_column: &str,
        label_column: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Vec<MonthlyCategoryCount>, AggregateError> {
        let dates = df.column(date_column)?.as_materialized_series();
        let dates = dates.date()?;
        let labels = df.column(label_column)?.cast(&DataType::String)?;
        let labels = labels.str()?;

        let mut buckets: BTreeMap<(String, usize, String), u64> = BTreeMap::new();
        for (date, label) in dates.as_date_iter().zip(labels.into_iter()) {
            let (Some(date), Some(label)) = (date, label) else {
                continue;
            };
            let rank = taxonomy.position(label).unwrap_or(usize::MAX);
            *buckets
                .entry((Self::month_key(date), rank, label.to_string()))
                .or_insert(0) += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|((month, _, category), count)| MonthlyCategoryCount {
                month,
                category,
                count,
            })
            .collect())
    }

    /// Distinct months across `rows`, oldest first.
    pub fn months<'a>(rows: impl IntoIterator<Item = &'a MonthlyCategoryCount>) -> Vec<String> {
        rows.into_iter()
            .map(|r| r.month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
