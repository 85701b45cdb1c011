//! Version 1 and version 4 UUID generation.
//!
//! A [`UuidGenerator`] owns the state version 1 UUIDs need: a clock sequence and a node id. Random
//! bits for both generators, and for the node id itself, come from the OS secure random source
//! ([`OsRng`]) so a failing source surfaces as [`UuidError::RandomSourceUnavailable`] instead of a
//! panic.
//!
//! Most callers use the process-wide generator through [`Uuid::new_v1`] / [`Uuid::new_v4`] or
//! [`default_generator`]. It is created on first use. Callers that do not want hidden global state
//! can build their own handle with [`UuidGenerator::new`] or [`UuidGenerator::from_config`].

use crate::{Uuid, UuidError, UuidResult};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::{Builder, ContextV1, Timestamp};

/// Bit 0 of the first node byte: multicast.
const NODE_MULTICAST_BIT: u8 = 0x01;
/// Bit 1 of the first node byte: locally administered.
const NODE_LOCAL_BIT: u8 = 0x02;
/// The clock sequence field is 14 bits wide.
const CLOCK_SEQUENCE_MASK: u16 = 0x3fff;

static DEFAULT_GENERATOR: RwLock<Option<Arc<UuidGenerator>>> = RwLock::new(None);

/// Optional overrides used when constructing a [`UuidGenerator`].
///
/// Anything left as `None` is drawn from the OS random source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    node_id: Option<[u8; 6]>,
    clock_sequence: Option<u16>,
}

impl GeneratorConfig {
    /// Creates a config with no overrides; every value is drawn at random.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed node id instead of a random one.
    ///
    /// # Arguments
    ///
    /// * `node_id` - The 6-byte node id. Used as given; the multicast and local bits are not
    ///   forced, so callers passing a real hardware address get it embedded verbatim.
    ///
    /// # Returns
    ///
    /// Returns the updated config.
    pub fn with_node_id(mut self, node_id: [u8; 6]) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Seed the clock sequence.
    ///
    /// # Arguments
    ///
    /// * `clock_sequence` - Initial clock sequence. Only the low 14 bits are kept, since that is
    ///   the width of the field in a version 1 UUID.
    ///
    /// # Returns
    ///
    /// Returns the updated config.
    pub fn with_clock_sequence(mut self, clock_sequence: u16) -> Self {
        self.clock_sequence = Some(clock_sequence & CLOCK_SEQUENCE_MASK);
        self
    }

    /// Returns the node id override, if any.
    pub fn node_id(&self) -> Option<[u8; 6]> {
        self.node_id
    }

    /// Returns the (already masked) clock sequence override, if any.
    pub fn clock_sequence(&self) -> Option<u16> {
        self.clock_sequence
    }
}

/// Generator for version 1 and version 4 UUIDs.
///
/// The generator is `Send + Sync`; share it behind an [`Arc`] and call it from any thread. The
/// clock sequence is advanced atomically so concurrent version 1 calls never hand out the same
/// value.
pub struct UuidGenerator {
    context: ContextV1,
    node_id: [u8; 6],
}

impl UuidGenerator {
    /// Creates a generator with a random node id and a random clock sequence.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::RandomSourceUnavailable`] if the OS random source fails.
    pub fn new() -> UuidResult<Self> {
        Self::from_config(GeneratorConfig::default())
    }

    /// Creates a generator from explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::RandomSourceUnavailable`] if a value has to be drawn from the OS random
    /// source and the source fails.
    pub fn from_config(config: GeneratorConfig) -> UuidResult<Self> {
        let node_id = match config.node_id {
            Some(node_id) => node_id,
            None => random_node_id()?,
        };
        let clock_sequence = match config.clock_sequence {
            Some(clock_sequence) => clock_sequence,
            None => random_clock_sequence()?,
        };

        Ok(Self {
            context: ContextV1::new(clock_sequence),
            node_id,
        })
    }

    /// Returns the node id embedded in every version 1 UUID from this generator.
    pub fn node_id(&self) -> [u8; 6] {
        self.node_id
    }

    /// Generates a time-based (version 1) UUID from the current time, the next clock sequence
    /// value and this generator's node id.
    ///
    /// # Returns
    ///
    /// Always `Ok`; the `Result` keeps the signature in line with [`UuidGenerator::new_v4`].
    pub fn new_v1(&self) -> UuidResult<Uuid> {
        // Advances the clock sequence when called twice within one 100 ns tick.
        let timestamp = Timestamp::now(&self.context);
        Ok(Uuid::from(::uuid::Uuid::new_v1(timestamp, &self.node_id)))
    }

    /// Generates a random (version 4) UUID.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::RandomSourceUnavailable`] if the OS random source fails.
    pub fn new_v4(&self) -> UuidResult<Uuid> {
        let mut bytes = [0u8; 16];
        fill_random(&mut bytes)?;
        // Builder overwrites the version and variant bits.
        Ok(Uuid::from(Builder::from_random_bytes(bytes).into_uuid()))
    }
}

impl fmt::Debug for UuidGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UuidGenerator")
            .field("node_id", &NodeId(&self.node_id))
            .finish_non_exhaustive()
    }
}

/// Returns the process-wide generator, creating it on first use.
///
/// Concurrent first callers race for the write lock; the winner initialises the generator and
/// every other caller observes the same instance.
///
/// # Errors
///
/// Returns [`UuidError::RandomSourceUnavailable`] if initialisation needs randomness and the OS
/// random source fails. Nothing is stored in that case, so a later call tries again.
pub fn default_generator() -> UuidResult<Arc<UuidGenerator>> {
    get_or_init(&DEFAULT_GENERATOR)
}

/// Double-checked initialisation of a shared generator slot.
///
/// # Arguments
///
/// * `slot` - The lock guarding the shared generator. `None` until the first successful call.
///
/// # Returns
///
/// Returns the generator stored in `slot`, creating and storing one if the slot is empty.
fn get_or_init(slot: &RwLock<Option<Arc<UuidGenerator>>>) -> UuidResult<Arc<UuidGenerator>> {
    if let Some(generator) = slot.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
        return Ok(Arc::clone(generator));
    }

    let mut slot = slot.write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have initialised it between the two locks.
    if let Some(generator) = slot.as_ref() {
        return Ok(Arc::clone(generator));
    }

    let generator = Arc::new(UuidGenerator::new()?);
    tracing::debug!(node_id = %NodeId(&generator.node_id), "initialised shared UUID generator");
    *slot = Some(Arc::clone(&generator));
    Ok(generator)
}

/// Generates a random node id for version 1 UUIDs.
///
/// The multicast and locally-administered bits of the first byte are set so the value can never
/// match the hardware address of a real network interface.
///
/// # Errors
///
/// Returns [`UuidError::RandomSourceUnavailable`] if the OS random source fails.
pub fn random_node_id() -> UuidResult<[u8; 6]> {
    let mut node_id = [0u8; 6];
    fill_random(&mut node_id)?;
    node_id[0] |= NODE_MULTICAST_BIT | NODE_LOCAL_BIT;
    Ok(node_id)
}

fn random_clock_sequence() -> UuidResult<u16> {
    let mut bytes = [0u8; 2];
    fill_random(&mut bytes)?;
    Ok(u16::from_be_bytes(bytes) & CLOCK_SEQUENCE_MASK)
}

fn fill_random(buf: &mut [u8]) -> UuidResult<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        tracing::warn!("failed to read from OS random source: {}", e);
        UuidError::RandomSourceUnavailable(e)
    })
}

/// Formats a node id as colon-separated hex.
struct NodeId<'a>(&'a [u8; 6]);

impl fmt::Display for NodeId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for NodeId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
