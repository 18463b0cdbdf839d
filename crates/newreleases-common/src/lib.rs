//! Newreleases-Common: Shared domain types, dates, and errors.
//!
//! This crate provides the data model used across newreleases:
//!
//! - **Typed IDs**: String wrappers for catalog artist and release identifiers
//! - **Core Types**: Artists, source tags, raw and classified releases
//! - **Dates**: Partial-precision release dates and recency comparisons
//! - **Error Handling**: Common error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use newreleases_common::{ArtistId, PartialDate, Result};
//!
//! let id = ArtistId::from("4Z8W4fKeB5YxbusRsdQVPb");
//! assert!(!id.is_empty());
//!
//! let date = PartialDate::parse("2025-08").unwrap();
//! let now = Utc.with_ymd_and_hms(2025, 8, 5, 12, 0, 0).unwrap();
//! assert!(date.is_within(10, now));
//!
//! fn example() -> Result<PartialDate> {
//!     PartialDate::parse("not a date")
//! }
//! assert!(example().is_err());
//! ```

pub mod date;
pub mod error;
pub mod ids;
pub mod types;

pub use date::{compare_newest_first, DatePrecision, PartialDate};
pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
