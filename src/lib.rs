//! Effective-rate analysis of time-of-use tariffs across load factors.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod tariff;
