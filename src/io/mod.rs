//! File output for sweep results.

pub mod export;
