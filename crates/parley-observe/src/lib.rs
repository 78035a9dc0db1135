//! Observability for Parley: subscriber initialization and shutdown.

pub mod tracing_setup;
