//! The [`Uuid`] value type.
//!
//! Parsing, formatting and byte layout are delegated to [`::uuid::Uuid`]. This type pins down the
//! behaviour storage code relies on: strict constructors that report a [`UuidError::Format`],
//! lenient `_or_nil` constructors that fall back to the nil UUID, and a canonical hyphenated
//! lowercase text form.

use crate::generator::default_generator;
use crate::{UuidError, UuidResult};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

/// 100 ns intervals between 1582-10-15 (the Gregorian epoch of v1 UUIDs) and 1970-01-01.
const GREGORIAN_TO_UNIX_TICKS: i64 = 0x01B2_1DD2_1381_4000;
/// v1 timestamps count 100 ns intervals.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// A 16-byte RFC 4122 identifier.
///
/// `Uuid` is `Copy` and compares, orders and hashes by its raw bytes. The [`Default`] value is
/// the nil UUID (all zero bytes), which is a valid value rather than an error state.
///
/// # Construction
/// - [`Uuid::new_v4`] / [`Uuid::new_v1`] generate a fresh identifier from the process-wide
///   generator.
/// - [`Uuid::from_bytes`] / [`Uuid::parse`] validate external input.
/// - [`Uuid::from_bytes_or_nil`] / [`Uuid::parse_or_nil`] swallow the error and return
///   [`Uuid::nil`].
///
/// # Display format
/// Always the canonical hyphenated form, for example
/// `550e8400-e29b-41d4-a716-446655440000`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid(::uuid::Uuid);

impl Uuid {
    /// The all-zero UUID.
    pub const fn nil() -> Self {
        Self(::uuid::Uuid::nil())
    }

    /// Generates a random (version 4) UUID using the process-wide generator.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::RandomSourceUnavailable`] if the OS random source fails.
    pub fn new_v4() -> UuidResult<Self> {
        default_generator()?.new_v4()
    }

    /// Generates a time-based (version 1) UUID using the process-wide generator.
    ///
    /// The first call in the process initialises the generator, drawing a random node id and
    /// clock sequence.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::RandomSourceUnavailable`] if the generator has to be initialised and
    /// the OS random source fails.
    pub fn new_v1() -> UuidResult<Self> {
        default_generator()?.new_v1()
    }

    /// Parses a UUID from a raw byte buffer.
    ///
    /// # Arguments
    ///
    /// * `input` - Exactly 16 bytes in RFC 4122 field order.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::Format`] if `input` is not 16 bytes long. The underlying error names
    /// the expected and actual length.
    pub fn from_bytes(input: &[u8]) -> UuidResult<Self> {
        ::uuid::Uuid::from_slice(input)
            .map(Self)
            .map_err(|source| UuidError::Format {
                context: "failed to convert bytes to UUID",
                source,
            })
    }

    /// Same as [`Uuid::from_bytes`], but returns [`Uuid::nil`] instead of an error.
    ///
    /// # Arguments
    ///
    /// * `input` - Candidate byte buffer of any length.
    ///
    /// # Returns
    ///
    /// Returns the parsed UUID, or the nil UUID if `input` is not 16 bytes long.
    pub fn from_bytes_or_nil(input: &[u8]) -> Self {
        Self::from_bytes(input).unwrap_or_default()
    }

    /// Parses a UUID from text.
    ///
    /// Accepted forms, with hex digits in either case:
    /// - hyphenated: `550e8400-e29b-41d4-a716-446655440000`
    /// - simple: `550e8400e29b41d4a716446655440000`
    /// - braced: `{550e8400-e29b-41d4-a716-446655440000}`
    /// - URN: `urn:uuid:550e8400-e29b-41d4-a716-446655440000`
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::Format`] if `input` matches none of these forms.
    pub fn parse(input: &str) -> UuidResult<Self> {
        ::uuid::Uuid::try_parse(input)
            .map(Self)
            .map_err(|source| UuidError::Format {
                context: "failed to convert string to UUID",
                source,
            })
    }

    /// Same as [`Uuid::parse`], but returns [`Uuid::nil`] instead of an error.
    ///
    /// # Arguments
    ///
    /// * `input` - Candidate UUID text in any of the forms [`Uuid::parse`] accepts.
    ///
    /// # Returns
    ///
    /// Returns the parsed UUID, or the nil UUID if `input` is malformed.
    pub fn parse_or_nil(input: &str) -> Self {
        Self::parse(input).unwrap_or_default()
    }

    /// Returns `true` if every byte is zero.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the 4-bit version field (0 for the nil UUID).
    pub fn version(&self) -> usize {
        self.0.get_version_num()
    }

    /// Returns `true` if the variant bits follow RFC 4122.
    pub fn is_rfc4122_variant(&self) -> bool {
        self.0.get_variant() == ::uuid::Variant::RFC4122
    }

    /// Returns the node id embedded in a version 1 UUID.
    ///
    /// # Returns
    ///
    /// Returns `None` for any other version.
    pub fn node_id(&self) -> Option<[u8; 6]> {
        if self.version() != 1 {
            return None;
        }
        self.0.get_node_id()
    }

    /// Returns the timestamp embedded in a version 1 UUID.
    ///
    /// Equivalent to [`timestamp_from_v1`].
    pub fn timestamp(&self) -> UuidResult<DateTime<Utc>> {
        timestamp_from_v1(*self)
    }

    /// Returns the canonical 16-byte encoding.
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    /// Borrows the canonical 16-byte encoding.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Returns the canonical hyphenated text form.
    pub fn to_hyphenated_string(&self) -> String {
        self.to_string()
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn as_uuid(&self) -> &::uuid::Uuid {
        &self.0
    }
}

/// Returns the timestamp embedded within a version 1 UUID.
///
/// Version 1 timestamps count 100 ns intervals since 1582-10-15, so values before the Unix epoch
/// are valid and come back as negative Unix times.
///
/// # Arguments
///
/// * `uuid` - The UUID to inspect.
///
/// # Returns
///
/// Returns the embedded time in UTC, truncated to 100 ns.
///
/// # Errors
///
/// - [`UuidError::VersionMismatch`] if `uuid` is any version other than 1.
/// - [`UuidError::InvalidTimestamp`] if the embedded time cannot be represented by `chrono`.
pub fn timestamp_from_v1(uuid: Uuid) -> UuidResult<DateTime<Utc>> {
    let found = uuid.version();
    if found != 1 {
        return Err(UuidError::VersionMismatch { expected: 1, found });
    }

    let timestamp = uuid
        .0
        .get_timestamp()
        .ok_or(UuidError::VersionMismatch { expected: 1, found })?;
    // Gregorian ticks are unsigned, but v1 UUIDs may predate the Unix epoch.
    let (ticks, _) = timestamp.to_gregorian();
    let ticks = i64::try_from(ticks).map_err(|_| UuidError::InvalidTimestamp)?;
    let unix_ticks = ticks - GREGORIAN_TO_UNIX_TICKS;

    let seconds = unix_ticks.div_euclid(TICKS_PER_SECOND);
    // Always in 0..10_000_000 after rem_euclid, so the cast cannot truncate.
    let nanos = (unix_ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;

    DateTime::<Utc>::from_timestamp(seconds, nanos).ok_or(UuidError::InvalidTimestamp)
}

impl fmt::Display for Uuid {
    /// Formats the UUID in canonical hyphenated lowercase form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Uuid {
    type Err = UuidError;

    /// Equivalent to [`Uuid::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse(s)
    }
}

impl From<::uuid::Uuid> for Uuid {
    fn from(uuid: ::uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Uuid> for ::uuid::Uuid {
    fn from(uuid: Uuid) -> Self {
        uuid.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(bytes: [u8; 16]) -> Self {
        Self(::uuid::Uuid::from_bytes(bytes))
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = UuidError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Uuid::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Uuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0.hyphenated())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Uuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Uuid::parse(&s).map_err(serde::de::Error::custom)
    }
}
