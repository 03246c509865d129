//! Accident Charts - Traffic Accident Data Shaping & Static Chart Generator
//!
//! Loads police accident records, bins and aggregates them, and renders
//! consequence, damage and road-surface charts.

pub mod aggregate;
pub mod charts;
pub mod cli;
pub mod config;
pub mod data;

#[cfg(test)]
mod test_support;
