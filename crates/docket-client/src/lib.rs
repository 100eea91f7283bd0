//! Authenticated JSON client for paginated record backends.
//!
//! Backends answer list queries with an envelope of the form
//! `{"results": [...], "next": "<url>" | null}`. [`PaginatingClient`] follows
//! `next` transparently and hands back one merged envelope.

mod client;

pub use client::{ClientConfig, Credentials, Envelope, PaginatingClient};
