//! Aggregate module - binning, per-region totals and monthly buckets

mod binner;
mod regions;
mod timeline;

use polars::prelude::PolarsError;
use thiserror::Error;

pub use binner::{
    BinError, CategoryBinner, CategoryCount, CrossTab, Taxonomy, CAUSES, DAMAGE_BUCKETS,
    SURFACE_CONDITIONS,
};
pub use regions::{RegionAggregator, RegionSummary};
pub use timeline::{MonthlyCategoryCount, TimeBucketer};

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
