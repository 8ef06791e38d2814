//! Core data models for the product catalogue.
//!
//! Products live in the document store, access-log entries in the
//! relational store. Both serialize as JSON via `serde`.

pub mod access_log;
pub mod product;
