//! Worker thread that owns the tokio runtime and the HTTP client.

pub mod runtime;
