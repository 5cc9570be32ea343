//! Shared utilities for the admissions platform services.

pub mod logging;
