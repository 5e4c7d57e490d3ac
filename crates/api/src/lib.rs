//! HTTP client for the placement REST backend.

pub mod backend;
pub mod payload;

pub use backend::{BackendClient, BackendError, Tenant};
pub use payload::{decode_entity, decode_list};
