//! Shared fixtures for unit tests.

use crate::data::AccidentLoader;
use polars::prelude::*;

/// Six raw accidents across three regions, as read from CSV.
pub(crate) fn raw_frame() -> DataFrame {
    df!(
        "region" => ["PHA", "JHM", "PHA", "STC", "JHM", "PHA"],
        "p2a" => ["2020-01-15", "2020-01-28", "2020-02-03", "2021-05-01", "2020-01-15", "2020-02-10"],
        "p13a" => [0i64, 1, 0, 0, 2, 0],
        "p13b" => [1i64, 0, 0, 1, 0, 0],
        "p13c" => [2i64, 1, 1, 0, 3, 0],
        "p12" => [100i64, 200, 201, 699, 700, 99],
        "p53" => [499.0, 500.0, 0.0, 99_999_999.0, 10_000.0, 2_000.0],
        "p16" => [3i64, 3, 1, 10, 0, 9],
    )
    .unwrap()
}

/// `raw_frame` after normalization.
pub(crate) fn normalized_frame() -> DataFrame {
    AccidentLoader::normalize(raw_frame(), false).unwrap()
}
