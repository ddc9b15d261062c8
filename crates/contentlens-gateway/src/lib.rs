//! HTTP gateway for ContentLens.
//!
//! Exposes document processing, manual scoring and capability metrics over
//! axum, and ships workflow traces to Langfuse.
//!
//! # Main types
//!
//! - [`GatewayServer`]: Builds the axum [`Router`](axum::Router).
//! - [`AppState`]: Workflow, file loader and optional tracing backend shared by handlers.
//! - [`LangfuseClient`] / [`LangfuseObserver`]: Langfuse API client and workflow observer.

/// Handler error type.
pub mod error;
/// Langfuse tracing backend.
pub mod langfuse;
/// Routes and handlers.
pub mod server;

pub use error::ApiError;
pub use langfuse::{
    to_ingestion, IngestionEvent, LangfuseClient, LangfuseConfig, LangfuseObserver, ManualScore,
    TraceBackend, DEFAULT_QUEUE_CAPACITY,
};
pub use server::{AppState, GatewayServer, ScoreRequest};
