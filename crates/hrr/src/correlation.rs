//! Correlation identifiers.
//!
//! Every response writer owns a [`CorrelationId`]. The same identifier is
//! written into the client-visible error envelope and into the server log
//! line, so a user-reported error can be matched with its log entry.
//!
//! An identifier is the hex-encoded SHA-1 of [`ENTROPY_BYTES`] bytes read from
//! the operating system's secure random source. If that source fails, the
//! bytes come from a permutation shuffled by a time-seeded, non-secure
//! generator instead. Such identifiers are far more likely to collide and are
//! marked with [`Entropy::TimeSeeded`] so callers can tell.

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of random bytes hashed into one identifier.
pub const ENTROPY_BYTES: usize = 500;

/// Where the bytes of an identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entropy {
    /// The secure random source supplied every byte.
    Secure,
    /// The secure source failed; a time-seeded permutation was used.
    TimeSeeded,
}

/// Identifier linking an error response to its log entry.
///
/// # Example
///
/// ```rust
/// use hrr::{CorrelationId, Entropy};
///
/// let id = CorrelationId::generate();
///
/// assert_eq!(id.as_str().len(), 40);
/// assert_eq!(id.entropy(), Entropy::Secure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationId {
    value: String,
    #[serde(skip)]
    entropy: Entropy,
}

impl CorrelationId {
    /// Generates an identifier from the operating system's random source.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// Generates an identifier from `rng`, falling back to a time-seeded
    /// permutation if `rng` cannot fill the buffer.
    pub fn from_rng<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0_u8; ENTROPY_BYTES];
        let entropy = match rng.try_fill_bytes(&mut bytes) {
            Ok(()) => Entropy::Secure,
            Err(_) => {
                fill_time_seeded(&mut bytes);
                Entropy::TimeSeeded
            }
        };

        Self {
            value: hex::encode(Sha1::digest(bytes)),
            entropy,
        }
    }

    /// Returns the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns where the identifier's bytes came from.
    #[must_use]
    pub fn entropy(&self) -> Entropy {
        self.entropy
    }

    /// Returns true if the identifier came from the non-secure fallback.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.entropy == Entropy::TimeSeeded
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fill_time_seeded(bytes: &mut [u8; ENTROPY_BYTES]) {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::from(d.subsec_nanos()));
    let mut rng = StdRng::seed_from_u64(seed);

    let mut permutation: Vec<usize> = (0..ENTROPY_BYTES).collect();
    permutation.shuffle(&mut rng);

    for (byte, value) in bytes.iter_mut().zip(permutation) {
        *byte = value as u8;
    }
}
