//! Accident Dataset Loader Module
//! Handles reading the accident table and normalizing its column types using Polars.

use crate::data::columns::{self, DAMAGE, DATE, REGION, SEVERITY_COUNTERS, SOURCE_DATE};
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Format of the source date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load dataset: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Invalid date '{value}' in row {row}, expected YYYY-MM-DD")]
    InvalidDate { row: usize, value: String },
    #[error("Column '{0}' contains non-numeric values")]
    NotNumeric(String),
}

/// Reads accident tables from CSV and normalizes them for aggregation.
#[derive(Debug, Clone)]
pub struct AccidentLoader {
    separator: u8,
    infer_schema_length: usize,
}

impl Default for AccidentLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl AccidentLoader {
    pub fn new(separator: u8) -> Self {
        Self {
            separator,
            infer_schema_length: 10000,
        }
    }

    /// Read and normalize the table at `path`.
    pub fn load(&self, path: &Path, verbose: bool) -> Result<DataFrame, LoaderError> {
        let df = self.read_table(path)?;
        debug!("Read {} rows from {}", df.height(), path.display());
        Self::normalize(df, verbose)
    }

    /// Deserialize the table without touching column types.
    pub fn read_table(&self, path: &Path) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_separator(self.separator)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .finish()?
            .collect()?;

        Ok(df)
    }

    /// Normalize column types.
    ///
    /// Derives `date` from `p2a`, casts the severity counters to integers and the
    /// damage amount to floats, keeps `region` as plain text and stores every other
    /// column as categorical. Running it on an already normalized table is a no-op.
    pub fn normalize(df: DataFrame, verbose: bool) -> Result<DataFrame, LoaderError> {
        Self::require_columns(&df)?;

        if verbose {
            info!("orig_size={:.1} MB", Self::memory_footprint_mb(&df));
        }

        let date = Self::parse_dates(df.column(SOURCE_DATE)?)?;

        let mut normalized: Vec<Column> = Vec::with_capacity(df.width() + 1);
        for column in df.get_columns() {
            let name = column.name().as_str();
            let converted = if SEVERITY_COUNTERS.contains(&name) {
                Self::to_numeric(column, &DataType::Int64)?
            } else if name == DAMAGE {
                Self::to_numeric(column, &DataType::Float64)?
            } else if name == REGION {
                column.cast(&DataType::String)?
            } else if name == DATE {
                // Re-derived from the source field below.
                continue;
            } else {
                Self::to_categorical(column)?
            };
            normalized.push(converted);
        }
        normalized.push(date);

        let df = DataFrame::new(normalized)?;

        if verbose {
            info!("new_size={:.1} MB", Self::memory_footprint_mb(&df));
        }

        Ok(df)
    }

    /// Estimated in-memory size of the table in megabytes.
    pub fn memory_footprint_mb(df: &DataFrame) -> f64 {
        df.estimated_size() as f64 / BYTES_PER_MB
    }

    fn require_columns(df: &DataFrame) -> Result<(), LoaderError> {
        match columns::REQUIRED
            .iter()
            .find(|name| df.get_column_index(name).is_none())
        {
            Some(missing) => Err(LoaderError::MissingColumn(*missing)),
            None => Ok(()),
        }
    }

    fn parse_dates(column: &Column) -> Result<Column, LoaderError> {
        let text = column.cast(&DataType::String)?;
        let text = text.str()?;

        let mut dates = Vec::with_capacity(text.len());
        for (row, value) in text.into_iter().enumerate() {
            let value = value.ok_or_else(|| LoaderError::InvalidDate {
                row,
                value: "null".to_string(),
            })?;
            let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
                LoaderError::InvalidDate {
                    row,
                    value: value.to_string(),
                }
            })?;
            dates.push(date);
        }

        Ok(Column::from(
            DateChunked::from_naive_date(DATE.into(), dates).into_series(),
        ))
    }

    fn to_numeric(column: &Column, dtype: &DataType) -> Result<Column, LoaderError> {
        // Categorical codes have to go through their text form.
        let source = if matches!(
            column.dtype(),
            DataType::Categorical(..) | DataType::Enum(..)
        ) {
            column.cast(&DataType::String)?
        } else {
            column.clone()
        };

        source
            .as_materialized_series()
            .strict_cast(dtype)
            .map(Column::from)
            .map_err(|_| LoaderError::NotNumeric(column.name().to_string()))
    }

    fn to_categorical(column: &Column) -> PolarsResult<Column> {
        if column.dtype().is_categorical() {
            return Ok(column.clone());
        }
        column
            .cast(&DataType::String)?
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))
    }
}
