//! Command implementations for the kissql CLI

pub mod catalog;
pub mod databases;
pub mod metadata;
pub mod output;
pub mod query;
