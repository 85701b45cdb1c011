//! UUID value type, generation and CQL column marshalling.
//!
//! This crate wraps the [`uuid`](::uuid) crate with a small value type that storage code can pass
//! around without caring which library sits underneath. It adds three things on top of the
//! library:
//!
//! - A [`Uuid`] value with strict and lenient (`_or_nil`) parsing from text and bytes.
//! - Version 1 and version 4 generation through a [`UuidGenerator`]. A process-wide generator is
//!   created lazily on first use, or callers can hold their own handle.
//! - An adapter for the marshal contract of a CQL driver ([`Marshaler`] / [`Unmarshaler`]), so a
//!   [`Uuid`] can be written to and read from `uuid` and `timeuuid` columns directly.
//!
//! ## Encodings
//! - Bytes: 16 raw bytes in RFC 4122 field order (time-low, time-mid, time-hi-and-version,
//!   clock-seq-hi-and-reserved, clock-seq-low, node).
//! - Text: `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, lowercase hex.
//!
//! ## Example
//!
//! ```
//! use cql_uuid::{marshal, unmarshal, CqlType, TypeInfo, Uuid};
//!
//! # fn main() -> Result<(), cql_uuid::UuidError> {
//! let id = Uuid::new_v4()?;
//! let info = TypeInfo::new(CqlType::Uuid);
//!
//! let bytes = marshal(&info, &id)?;
//! let mut decoded = Uuid::nil();
//! unmarshal(&info, &bytes, &mut decoded)?;
//!
//! assert_eq!(decoded, id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Node identifiers
//! Version 1 UUIDs embed a 6-byte node id. This crate never reads the host's hardware address:
//! node ids are random with the multicast and locally-administered bits set, so they cannot
//! collide with a real network card.

mod codec;
mod generator;
mod value;

pub use codec::{marshal, unmarshal, CqlType, Marshaler, TypeInfo, Unmarshaler};
pub use generator::{default_generator, random_node_id, GeneratorConfig, UuidGenerator};
pub use value::{timestamp_from_v1, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Input bytes were not 16 long, or input text did not match the UUID grammar.
    #[error("{context}: {source}")]
    Format {
        context: &'static str,
        #[source]
        source: ::uuid::Error,
    },

    /// The UUID has a different version than the operation requires.
    #[error("UUID version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: usize, found: usize },

    /// The OS secure random source could not supply entropy.
    #[error("random source unavailable: {0}")]
    RandomSourceUnavailable(#[from] rand::Error),

    /// The embedded timestamp cannot be represented as a calendar time.
    #[error("invalid timestamp")]
    InvalidTimestamp,
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
