//! Region Aggregator Module
//! Sums the severity counters per region and fixes the region display order.

use super::AggregateError;
use crate::data::columns::{DEATHS, LIGHT_INJURIES, REGION, SEVERE_INJURIES};
use polars::prelude::*;
use serde::Serialize;

const ACCIDENTS: &str = "accidents";

/// Totals for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub accidents: u64,
    pub deaths: i64,
    pub severe_injuries: i64,
    pub light_injuries: i64,
}

/// Groups accident tables by region.
pub struct RegionAggregator;

impl RegionAggregator {
    /// Per-region totals, most accidents first.
    ///
    /// Regions with equal accident counts keep the order in which they first
    /// appear in `df`. Rows without a region are ignored.
    pub fn summarize(df: &DataFrame) -> Result<Vec<RegionSummary>, AggregateError> {
        let summary = df
            .clone()
            .lazy()
            .filter(col(REGION).is_not_null())
            .group_by_stable([col(REGION)])
            .agg([
                len().alias(ACCIDENTS),
                col(DEATHS).sum(),
                col(SEVERE_INJURIES).sum(),
                col(LIGHT_INJURIES).sum(),
            ])
            .sort_by_exprs(
                [col(ACCIDENTS)],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .collect()?;

        let regions = summary.column(REGION)?.cast(&DataType::String)?;
        let accidents = summary.column(ACCIDENTS)?.cast(&DataType::UInt64)?;
        let deaths = Self::totals(&summary, DEATHS)?;
        let severe = Self::totals(&summary, SEVERE_INJURIES)?;
        let light = Self::totals(&summary, LIGHT_INJURIES)?;

        let summaries = regions
            .str()?
            .into_iter()
            .zip(accidents.u64()?.into_iter())
            .enumerate()
            .map(|(i, (region, count))| RegionSummary {
                region: region.unwrap_or_default().to_string(),
                accidents: count.unwrap_or(0),
                deaths: deaths[i],
                severe_injuries: severe[i],
                light_injuries: light[i],
            })
            .collect();

        Ok(summaries)
    }

    /// Region sequence shared by every per-severity series.
    pub fn order(summaries: &[RegionSummary]) -> Vec<String> {
        summaries.iter().map(|s| s.region.clone()).collect()
    }

    fn totals(summary: &DataFrame, name: &str) -> PolarsResult<Vec<i64>> {
        let column = summary.column(name)?.cast(&DataType::Int64)?;
        Ok(column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AccidentLoader;
    use crate::test_support::normalized_frame;

    #[test]
    fn summarize_orders_by_accident_count() {
        let summaries = RegionAggregator::summarize(&normalized_frame()).unwrap();

        assert_eq!(RegionAggregator::order(&summaries), vec!["PHA", "JHM", "STC"]);
        assert_eq!(
            summaries[0],
            RegionSummary {
                region: "PHA".to_string(),
                accidents: 3,
                deaths: 0,
                severe_injuries: 1,
                light_injuries: 3,
            }
        );
        assert_eq!(summaries[1].deaths, 3);
        assert_eq!(summaries[1].light_injuries, 4);
        assert_eq!(summaries[2].severe_injuries, 1);
    }

    #[test]
    fn ties_keep_first_encounter_order() {
        let raw = df!(
            "region" => ["LBK", "JHM", "JHM", "LBK", "OLK"],
            "p2a" => ["2020-01-01"; 5],
            "p13a" => [0i64; 5],
            "p13b" => [0i64; 5],
            "p13c" => [1i64, 2, 3, 4, 5],
            "p12" => [100i64; 5],
            "p53" => [0.0; 5],
            "p16" => [1i64; 5],
        )
        .unwrap();
        let df = AccidentLoader::normalize(raw, false).unwrap();

        let summaries = RegionAggregator::summarize(&df).unwrap();

        assert_eq!(RegionAggregator::order(&summaries), vec!["LBK", "JHM", "OLK"]);
        assert_eq!(summaries[0].light_injuries, 5);
        assert_eq!(summaries[1].light_injuries, 5);
    }

    #[test]
    fn empty_table_gives_empty_summary() {
        let df = normalized_frame().head(Some(0));

        assert!(RegionAggregator::summarize(&df).unwrap().is_empty());
    }
}
