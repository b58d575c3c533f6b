//! # Error Types
//!
//! Recoverable failures of the bit-stream codec.
//!
//! Two classes of failure exist in this crate. Programmer-contract violations
//! (growing a stream by zero bits, using an aligned fast path on an unaligned
//! cursor, finishing a decode with bits left over) panic, because they point at
//! a logic bug rather than at bad input. Everything that can be caused by the
//! bytes on the wire is reported through [`CodecError`] so that a server fed
//! untrusted packets can drop the packet instead of crashing.
//!
//! ## Error Categories
//! - **Payload errors**: reading or skipping more bits than were written
//! - **Range errors**: values outside declared `[min, max]` bounds or float limits
//! - **Format errors**: unknown address families, over-long length prefixes
//! - **Configuration errors**: invalid or unreadable configuration
//!
//! ## Example Usage
//! ```rust
//! use netbits::core::reader::BitReader;
//! use netbits::core::io::BitRead;
//! use netbits::error::CodecError;
//!
//! let mut reader = BitReader::new(&[0xAB]);
//! let mut out = [0u8; 2];
//! match reader.read_bytes(&mut out) {
//!     Err(CodecError::InsufficientPayload { requested, available }) => {
//!         assert_eq!((requested, available), (16, 8));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static error messages, borrowed rather than allocated on the error path.
pub mod constants {
    /// Stream contract violations (these are panic messages)
    pub const ERR_ZERO_GROWTH: &str = "ensure_capacity called with zero additional bits";
    pub const ERR_UNALIGNED_WRITE: &str = "aligned write requires a byte-aligned write cursor";
    pub const ERR_UNALIGNED_READ: &str = "aligned read requires a byte-aligned read cursor";
    pub const ERR_STREAM_NOT_CONSUMED: &str = "stream payload not fully consumed: reads did not match writes";

    /// Decode errors
    pub const ERR_EMPTY_RANGE: &str = "range maximum is below its minimum";
    pub const ERR_DEGENERATE_FLOAT_RANGE: &str = "float range must satisfy min < max";
    pub const ERR_AXIS_INDEX: &str = "axis-aligned vector carries an invalid axis index";

    /// Configuration errors
    pub const ERR_CONFIG_OPEN: &str = "Failed to open config file";
    pub const ERR_CONFIG_PARSE: &str = "Failed to parse TOML";
}

/// CodecError is the error type for every fallible stream operation
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum CodecError {
    #[error("Insufficient payload: requested {requested} bits, {available} available")]
    InsufficientPayload { requested: usize, available: usize },

    #[error("Value {value} outside range [{min}, {max}]")]
    OutOfRange {
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Float {0} outside the normalized range [-1, 1]")]
    FloatOutOfRange(f64),

    #[error("Invalid address family: {0}")]
    InvalidAddressFamily(u8),

    #[error("Length prefix {length} exceeds limit {limit}")]
    LengthLimitExceeded { length: usize, limit: usize },

    #[error("Malformed data: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl CodecError {
    /// Build an [`CodecError::OutOfRange`] from any displayable bounds
    pub fn out_of_range<T: std::fmt::Display>(value: T, min: T, max: T) -> Self {
        CodecError::OutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Whether this error was caused by the bytes on the wire (as opposed to
    /// configuration or the environment)
    pub fn is_decode_error(&self) -> bool {
        !matches!(
            self,
            CodecError::ConfigError(_) | CodecError::LoggingError(_)
        )
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
