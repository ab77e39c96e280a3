//! Output writers used by the CLI driver.
//!
//! - [`json`]: curated records as date-grouped JSON files, plus the run summary
//! - [`corpus`]: harvested candidates as a `;`-delimited file for labelling

pub mod corpus;
pub mod json;
