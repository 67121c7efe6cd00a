//! Data models for label extraction and scan records.

pub mod config;
pub mod label;
pub mod record;
