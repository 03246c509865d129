//! Chart Pipeline Module
//! Shapes the accident table into the tables each chart draws.

use super::ChartKind;
use crate::aggregate::{
    AggregateError, BinError, CategoryBinner, CategoryCount, CrossTab, MonthlyCategoryCount,
    RegionAggregator, RegionSummary, TimeBucketer, CAUSES, DAMAGE_BUCKETS, SURFACE_CONDITIONS,
};
use crate::data::columns::{CAUSE, DAMAGE, DATE, SURFACE};
use log::debug;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Label column added to the working copy by the surface chart.
pub const SURFACE_LABEL: &str = "surface_label";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Bin(#[from] BinError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Table shaped for one region's panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPanel<T> {
    pub region: String,
    pub data: T,
}

/// Every shaped table requested for a run, ready for JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShapedTables {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequences: Option<Vec<RegionSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<Vec<RegionPanel<CrossTab>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<Vec<RegionPanel<Vec<MonthlyCategoryCount>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_totals: Option<Vec<RegionPanel<Vec<CategoryCount>>>>,
}

/// Per-chart data shaping. Each region is processed on its own filtered copy.
pub struct ChartPipeline;

impl ChartPipeline {
    /// Chart 1: per-region severity totals, most accidents first.
    pub fn consequences(df: &DataFrame) -> Result<Vec<RegionSummary>, PipelineError> {
        Ok(RegionAggregator::summarize(df)?)
    }

    /// Chart 2: damage bucket x cause counts for each region.
    pub fn damage(
        df: &DataFrame,
        regions: &[String],
    ) -> Result<Vec<RegionPanel<CrossTab>>, PipelineError> {
        regions
            .par_iter()
            .map(|region| -> Result<_, PipelineError> {
                let working = CategoryBinner::filter_region(df, region)?;
                debug!("damage: {} rows in {region}", working.height());
                let table = CategoryBinner::cross_tab(
                    &working,
                    (DAMAGE, &DAMAGE_BUCKETS),
                    (CAUSE, &CAUSES),
                )?;
                Ok(RegionPanel {
                    region: region.clone(),
                    data: table,
                })
            })
            .collect()
    }

    /// Chart 3: monthly counts per surface condition for each region.
    pub fn surface(
        df: &DataFrame,
        regions: &[String],
    ) -> Result<Vec<RegionPanel<Vec<MonthlyCategoryCount>>>, PipelineError> {
        regions
            .par_iter()
            .map(|region| -> Result<_, PipelineError> {
                let mut working = CategoryBinner::filter_region(df, region)?;
                debug!("surface: {} rows in {region}", working.height());
                CategoryBinner::assign(&mut working, SURFACE, &SURFACE_CONDITIONS, SURFACE_LABEL)?;
                let rows = TimeBucketer::monthly_counts(
                    &working,
                    DATE,
                    SURFACE_LABEL,
                    &SURFACE_CONDITIONS,
                )?;
                Ok(RegionPanel {
                    region: region.clone(),
                    data: rows,
                })
            })
            .collect()
    }

    /// Surface condition frequencies over the whole period for each region.
    pub fn surface_totals(
        df: &DataFrame,
        regions: &[String],
    ) -> Result<Vec<RegionPanel<Vec<CategoryCount>>>, PipelineError> {
        regions
            .par_iter()
            .map(|region| -> Result<_, PipelineError> {
                let working = CategoryBinner::filter_region(df, region)?;
                let counts = CategoryBinner::frequency(&working, SURFACE, &SURFACE_CONDITIONS)?;
                Ok(RegionPanel {
                    region: region.clone(),
                    data: counts,
                })
            })
            .collect()
    }

    /// Shape the tables behind `kind`.
    pub fn tables(
        df: &DataFrame,
        regions: &[String],
        kind: ChartKind,
    ) -> Result<ShapedTables, PipelineError> {
        let mut tables = ShapedTables::default();
        if kind.includes(ChartKind::Consequences) {
            tables.consequences = Some(Self::consequences(df)?);
        }
        if kind.includes(ChartKind::Damage) {
            tables.damage = Some(Self::damage(df, regions)?);
        }
        if kind.includes(ChartKind::Surface) {
            tables.surface = Some(Self::surface(df, regions)?);
            tables.surface_totals = Some(Self::surface_totals(df, regions)?);
        }
        Ok(tables)
    }
}
