//! Core types and trait definitions for the Docket record aggregation layer.
//!
//! This crate is deliberately free of HTTP dependencies. Backend connectors
//! (`docket-cases`, `docket-submissions`) implement [`connector::Connector`];
//! the [`aggregator::Aggregator`] combines them and [`format`] shapes the
//! result for display.

pub mod aggregator;
pub mod connector;
pub mod error;
pub mod format;
pub mod identity;
pub mod record;

pub use aggregator::{Aggregator, AggregatorBuilder, Listing};
pub use connector::Connector;
pub use error::{Error, Result};
pub use identity::Identity;
