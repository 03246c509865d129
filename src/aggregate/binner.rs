//! Category Binner Module
//! Maps numeric codes onto labeled half-open intervals and counts the results.

use crate::data::columns::REGION;
use log::debug;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Taxonomy '{0}' has no bins")]
    EmptyTaxonomy(&'static str),
    #[error("Taxonomy '{name}' bounds are not strictly increasing at bin {index}")]
    NonMonotonic { name: &'static str, index: usize },
}

/// Ordered set of labels over half-open intervals `[lower, next lower)`.
///
/// Each bin is a `(lower bound, label)` pair; the last bin ends at `upper`
/// (exclusive). The lowest bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Taxonomy {
    pub name: &'static str,
    pub bins: &'static [(f64, &'static str)],
    pub upper: f64,
}

/// Main accident cause (`p12`).
pub const CAUSES: Taxonomy = Taxonomy {
    name: "cause",
    bins: &[
        (100.0, "driver not at fault"),
        (200.0, "unreasonable speed"),
        (300.0, "improper overtaking"),
        (400.0, "failure to yield"),
        (500.0, "improper driving"),
        (600.0, "technical defect"),
    ],
    upper: 700.0,
};

/// Material damage (`p53`, hundreds of CZK), labeled in thousands of CZK.
pub const DAMAGE_BUCKETS: Taxonomy = Taxonomy {
    name: "damage",
    bins: &[
        (0.0, "< 50"),
        (500.0, "50 - 200"),
        (2000.0, "200 - 500"),
        (5000.0, "500 - 1000"),
        (10000.0, "> 1000"),
    ],
    upper: 99_999_999.0,
};

/// Road surface condition (`p16`).
pub const SURFACE_CONDITIONS: Taxonomy = Taxonomy {
    name: "surface",
    bins: &[
        (0.0, "other"),
        (1.0, "dry - clean"),
        (2.0, "dry - dirty"),
        (3.0, "wet"),
        (4.0, "mud"),
        (5.0, "ice - treated"),
        (6.0, "ice - untreated"),
        (7.0, "oil spill"),
        (8.0, "snow layer"),
        (9.0, "sudden change"),
    ],
    upper: 10.0,
};

impl Taxonomy {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.bins.iter().map(|(_, label)| *label).collect()
    }

    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.bins.get(index).map(|(_, label)| *label)
    }

    /// Position of `label` in the taxonomy.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.bins.iter().position(|(_, l)| *l == label)
    }

    /// All bin edges, lower bounds followed by the upper bound.
    pub fn edges(&self) -> Vec<f64> {
        self.bins
            .iter()
            .map(|(lower, _)| *lower)
            .chain(std::iter::once(self.upper))
            .collect()
    }

    /// Index of the bin containing `value`.
    ///
    /// Values below the lowest bound, at or above `upper`, or NaN have no bin.
    pub fn classify(&self, value: f64) -> Option<usize> {
        let lowest = self.bins.first()?.0;
        debug_assert!(self.validate().is_ok(), "taxonomy '{}' is mis-declared", self.name);
        if value.is_nan() || value < lowest || value >= self.upper {
            return None;
        }
        let above = self.bins.partition_point(|(lower, _)| *lower <= value);
        Some(above - 1)
    }

    pub fn classify_label(&self, value: f64) -> Option<&'static str> {
        self.classify(value).and_then(|index| self.label(index))
    }

    /// Check that the bounds are strictly increasing.
    pub fn validate(&self) -> Result<(), BinError> {
        if self.bins.is_empty() {
            return Err(BinError::EmptyTaxonomy(self.name));
        }
        let edges = self.edges();
        match edges.windows(2).position(|pair| pair[0] >= pair[1]) {
            Some(index) => Err(BinError::NonMonotonic {
                name: self.name,
                index,
            }),
            None => Ok(()),
        }
    }
}

/// Dense count matrix over two taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub row_labels: Vec<&'static str>,
    pub column_labels: Vec<&'static str>,
    /// `counts[row][column]`
    pub counts: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.row_labels.iter().position(|l| *l == row)?;
        let c = self.column_labels.iter().position(|l| *l == column)?;
        Some(self.counts[r][c])
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// One entry of a single-field frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: &'static str,
    pub count: u64,
}

/// Binning operations on accident tables.
pub struct CategoryBinner;

impl CategoryBinner {
    /// Working copy holding only the rows of `region`.
    pub fn filter_region(df: &DataFrame, region: &str) -> Result<DataFrame, BinError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(REGION).eq(lit(region)))
            .collect()?;
        Ok(filtered)
    }

    /// Read `field` as floats. Nulls and unparsable entries become `None`.
    pub fn numeric_values(df: &DataFrame, field: &str) -> Result<Vec<Option<f64>>, BinError> {
        let column = df.column(field)?;
        let column = match column.dtype() {
            DataType::Categorical(..) | DataType::Enum(..) => column.cast(&DataType::String)?,
            _ => column.clone(),
        };
        let values = column.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Bin index of every row; `None` for dropped values.
    pub fn bin_indices(
        df: &DataFrame,
        field: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Vec<Option<usize>>, BinError> {
        taxonomy.validate()?;
        let indices: Vec<Option<usize>> = Self::numeric_values(df, field)?
            .into_iter()
            .map(|value| value.and_then(|v| taxonomy.classify(v)))
            .collect();

        let dropped = indices.iter().filter(|i| i.is_none()).count();
        if dropped > 0 {
            debug!(
                "{dropped} of {} '{field}' values fall outside the {} bins",
                indices.len(),
                taxonomy.name
            );
        }

        Ok(indices)
    }

    /// Add a text column `label_column` with the bin label of `field` (null when dropped).
    pub fn assign(
        df: &mut DataFrame,
        field: &str,
        taxonomy: &Taxonomy,
        label_column: &str,
    ) -> Result<(), BinError> {
        let labels: Vec<Option<&str>> = Self::bin_indices(df, field, taxonomy)?
            .into_iter()
            .map(|index| index.and_then(|i| taxonomy.label(i)))
            .collect();

        df.with_column(Column::new(label_column.into(), labels))?;
        Ok(())
    }

    /// Count rows per (row bin, column bin). Rows dropped by either taxonomy are not counted.
    pub fn cross_tab(
        df: &DataFrame,
        rows: (&str, &Taxonomy),
        columns: (&str, &Taxonomy),
    ) -> Result<CrossTab, BinError> {
        let (row_field, row_taxonomy) = rows;
        let (column_field, column_taxonomy) = columns;

        let row_bins = Self::bin_indices(df, row_field, row_taxonomy)?;
        let column_bins = Self::bin_indices(df, column_field, column_taxonomy)?;

        let mut counts = vec![vec![0u64; column_taxonomy.len()]; row_taxonomy.len()];
        for (r, c) in row_bins.into_iter().zip(column_bins) {
            if let (Some(r), Some(c)) = (r, c) {
                counts[r][c] += 1;
            }
        }

        Ok(CrossTab {
            row_labels: row_taxonomy.labels(),
            column_labels: column_taxonomy.labels(),
            counts,
        })
    }

    /// Count rows per bin of `field`, in taxonomy order.
    pub fn frequency(
        df: &DataFrame,
        field: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Vec<CategoryCount>, BinError> {
        let mut counts = vec![0u64; taxonomy.len()];
        for index in Self::bin_indices(df, field, taxonomy)?.into_iter().flatten() {
            counts[index] += 1;
        }

        Ok(taxonomy
            .labels()
            .into_iter()
            .zip(counts)
            .map(|(label, count)| CategoryCount { label, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::{CAUSE, DAMAGE, SURFACE};
    use crate::test_support::normalized_frame;

    #[test]
    fn declared_taxonomies_are_valid() {
        for taxonomy in [CAUSES, DAMAGE_BUCKETS, SURFACE_CONDITIONS] {
            assert!(taxonomy.validate().is_ok(), "{}", taxonomy.name);
        }
        assert_eq!(CAUSES.edges(), vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0]);
        assert_eq!(
            DAMAGE_BUCKETS.edges(),
            vec![0.0, 500.0, 2000.0, 5000.0, 10000.0, 99_999_999.0]
        );
        assert_eq!(SURFACE_CONDITIONS.edges().len(), 11);
    }

    #[test]
    fn validate_rejects_unordered_bounds() {
        let broken = Taxonomy {
            name: "broken",
            bins: &[(0.0, "a"), (5.0, "b"), (5.0, "c")],
            upper: 10.0,
        };
        assert!(matches!(
            broken.validate(),
            Err(BinError::NonMonotonic { index: 1, .. })
        ));

        let empty = Taxonomy {
            name: "empty",
            bins: &[],
            upper: 1.0,
        };
        assert!(matches!(empty.validate(), Err(BinError::EmptyTaxonomy("empty"))));
        assert_eq!(empty.classify(0.5), None);
    }

    #[test]
    fn binning_rejects_mis_declared_taxonomy() {
        const UNSORTED: Taxonomy = Taxonomy {
            name: "unsorted",
            bins: &[(0.0, "low"), (10.0, "high"), (5.0, "mid")],
            upper: 20.0,
        };
        let df = normalized_frame();

        assert!(matches!(
            CategoryBinner::frequency(&df, SURFACE, &UNSORTED),
            Err(BinError::NonMonotonic { name: "unsorted", index: 1 })
        ));
        assert!(CategoryBinner::cross_tab(&df, (SURFACE, &UNSORTED), (CAUSE, &CAUSES)).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "mis-declared")]
    fn classify_panics_on_mis_declared_taxonomy_in_debug() {
        let unsorted = Taxonomy {
            name: "unsorted",
            bins: &[(0.0, "low"), (10.0, "high"), (5.0, "mid")],
            upper: 20.0,
        };
        unsorted.classify(7.0);
    }

    #[test]
    fn boundary_value_belongs_to_next_bin() {
        assert_eq!(CAUSES.classify_label(199.0), Some("driver not at fault"));
        assert_eq!(CAUSES.classify_label(200.0), Some("unreasonable speed"));
        assert_eq!(CAUSES.classify_label(100.0), Some("driver not at fault"));
        assert_eq!(CAUSES.classify_label(699.0), Some("technical defect"));
    }

    #[test]
    fn out_of_range_values_are_dropped() {
        assert_eq!(CAUSES.classify(99.0), None);
        assert_eq!(CAUSES.classify(700.0), None);
        assert_eq!(CAUSES.classify(f64::NAN), None);
        assert_eq!(DAMAGE_BUCKETS.classify(-1.0), None);
    }

    #[test]
    fn damage_bucket_scenarios() {
        assert_eq!(DAMAGE_BUCKETS.classify_label(0.0), Some("< 50"));
        assert_eq!(DAMAGE_BUCKETS.classify_label(499.0), Some("< 50"));
        assert_eq!(DAMAGE_BUCKETS.classify_label(500.0), Some("50 - 200"));
        assert_eq!(DAMAGE_BUCKETS.classify_label(10000.0), Some("> 1000"));
        assert_eq!(DAMAGE_BUCKETS.classify_label(99_999_999.0), None);
    }

    #[test]
    fn surface_scenarios() {
        assert_eq!(SURFACE_CONDITIONS.classify_label(3.0), Some("wet"));
        assert_eq!(SURFACE_CONDITIONS.classify_label(0.0), Some("other"));
        assert_eq!(SURFACE_CONDITIONS.classify_label(9.0), Some("sudden change"));
        assert_eq!(SURFACE_CONDITIONS.classify_label(10.0), None);
    }

    #[test]
    fn filter_region_keeps_matching_rows() {
        let df = normalized_frame();
        let pha = CategoryBinner::filter_region(&df, "PHA").unwrap();
        assert_eq!(pha.height(), 3);

        let none = CategoryBinner::filter_region(&df, "ZLK").unwrap();
        assert_eq!(none.height(), 0);
    }

    #[test]
    fn assign_reads_categorical_codes() {
        let mut df = normalized_frame();
        CategoryBinner::assign(&mut df, CAUSE, &CAUSES, "cause_label").unwrap();

        let labels: Vec<Option<String>> = df
            .column("cause_label")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|l| l.map(str::to_string))
            .collect();

        assert_eq!(
            labels,
            vec![
                Some("driver not at fault".to_string()),
                Some("unreasonable speed".to_string()),
                Some("unreasonable speed".to_string()),
                Some("technical defect".to_string()),
                None,
                None,
            ]
        );
    }

    #[test]
    fn cross_tab_skips_rows_dropped_by_either_axis() {
        let df = normalized_frame();
        let table =
            CategoryBinner::cross_tab(&df, (DAMAGE, &DAMAGE_BUCKETS), (CAUSE, &CAUSES)).unwrap();

        assert_eq!(table.row_labels, DAMAGE_BUCKETS.labels());
        assert_eq!(table.column_labels, CAUSES.labels());
        assert_eq!(table.total(), 3);
        assert_eq!(table.get("< 50", "driver not at fault"), Some(1));
        assert_eq!(table.get("< 50", "unreasonable speed"), Some(1));
        assert_eq!(table.get("50 - 200", "unreasonable speed"), Some(1));
        assert_eq!(table.get("> 1000", "technical defect"), Some(0));
        assert_eq!(table.max_count(), 1);
    }

    #[test]
    fn frequency_counts_in_taxonomy_order() {
        let df = normalized_frame();
        let counts = CategoryBinner::frequency(&df, SURFACE, &SURFACE_CONDITIONS).unwrap();

        assert_eq!(counts.len(), SURFACE_CONDITIONS.len());
        assert_eq!(counts[0], CategoryCount { label: "other", count: 1 });
        assert_eq!(counts[1], CategoryCount { label: "dry - clean", count: 1 });
        assert_eq!(counts[3], CategoryCount { label: "wet", count: 2 });
        assert_eq!(counts[9], CategoryCount { label: "sudden change", count: 1 });
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 5);
    }
}
