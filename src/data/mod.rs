//! Data module - accident table loading and normalization

pub mod columns;
mod loader;

pub use loader::{AccidentLoader, LoaderError, DATE_FORMAT};
