//! Connector for the authoritative case-management backend.
//!
//! Talks to the catalogue, case, role and document resources of the backend
//! through a [`docket_client::PaginatingClient`]. Reference metadata is loaded
//! once per connector and shared by all requests; visibility is restricted by
//! an optional [`DomainAllowList`] and, per record, by the role assignments
//! linking the caller to the case.

mod connector;
mod metadata;
mod progression;
mod tasks;
mod wire;

pub use connector::{CaseConnector, DEFAULT_ID};
pub use metadata::DomainAllowList;
pub use tasks::TaskConnector;
