// ibfundamental/src/lib.rs
// Main entry point for the fundamental-report extraction library

//! # ibfundamental
//!
//! Typed extraction from IBKR fundamental-data XML reports:
//!
//! - Ownership (issuer float and beneficial owners) from `ReportsOwnership`
//! - Dividends, dividend-per-share, revenue and EPS from `ReportsFinSummary`
//! - Analyst forecast and ratio snapshot from `ReportSnapshot`
//! - Forward-year consensus estimates and actuals from `RESC`
//!
//! Reports are parsed once into a `DocumentBundle`; a `FundamentalParser`
//! then runs extractions against it, memoizing the common ones.

mod base;
mod memo;
mod xml_tree;
pub mod bundle;
pub mod coerce;
pub mod data;
pub mod financial_report_parser;
pub mod parser;
pub mod table;

#[cfg(test)]
mod fixtures;

pub use base::FundamentalError;
pub use bundle::DocumentBundle;
pub use parser::{ExtractionKey, FundamentalParser, ParserConfig};
pub use table::{Table, TableRecord};
pub use xml_tree::XmlElement;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
