//! Wire shapes shared by the server and the HTTP client.

pub mod envelope;

pub use envelope::{ApiEnvelope, ErrorBody};
