//! # Utility Modules
//!
//! Supporting pieces around the codec.
//!
//! ## Components
//! - **Metrics**: process-wide atomic counters for streams and decode failures
//! - **Logging**: `tracing-subscriber` setup from a [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Stream Pool**: recycled streams for one-stream-per-message servers
//! - **Dump**: bit and hex renderings of stream content for diagnostics

pub mod dump;
pub mod logging;
pub mod metrics;
pub mod stream_pool;

pub use stream_pool::{PooledStream, StreamPool};
