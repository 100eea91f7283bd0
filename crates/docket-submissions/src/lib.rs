//! Connector for the submission-storage backend.
//!
//! Submissions are records created by online forms. The backend is treated as
//! untrusted: every payload is decoded against a fixed schema and validated
//! before anything derived from it leaves this crate.

mod connector;
mod schema;

pub use connector::{DEFAULT_ID, SubmissionConnector};

#[cfg(test)]
mod tests;
