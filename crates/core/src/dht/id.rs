#![warn(missing_docs)]

//! Identifiers of the ring and the arithmetic on them.
//!
//! The ring is the modular identifier space `[0, 2^m)`. Distances are always measured
//! clockwise, so `distance(a, b)` is `(b - a) mod 2^m`. All ordering predicates used by
//! the protocol are defined through that distance:
//!
//! * `strictly_between(a, b, c)` holds iff `b` lies inside the open arc `(a, c)`.
//! * `in_half_open_arc(a, b, c)` holds iff `b` lies inside the arc `(a, c]`.
//!
//! When `a == c` the open arc is empty and the half-open arc is the whole ring.

use std::net::IpAddr;
use std::net::SocketAddr;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

use crate::consts::DEFAULT_RING_BITS;
use crate::consts::MAX_RING_BITS;
use crate::error::Error;
use crate::error::Result;

/// A position on the ring.
#[derive(
    Copy, Clone, Default, Eq, Ord, PartialEq, PartialOrd, Debug, Serialize, Deserialize, Hash,
)]
pub struct RingId(u128);

impl std::fmt::Display for RingId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RingId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16).map(Self),
            None => s.parse().map(Self),
        }
    }
}

impl RingId {
    /// Raw value of the id.
    pub fn value(&self) -> u128 {
        self.0
    }
}

/// The identifier space `[0, 2^bits)` shared by every node of a ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct IdSpace {
    bits: u32,
}

impl Default for IdSpace {
    fn default() -> Self {
        Self {
            bits: DEFAULT_RING_BITS,
        }
    }
}

impl IdSpace {
    /// Create an identifier space of `bits` bits.
    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > MAX_RING_BITS {
            return Err(Error::InvalidRingBits(bits));
        }
        Ok(Self { bits })
    }

    /// Number of bits, also the size of the finger table.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    fn mask(&self) -> u128 {
        if self.bits == MAX_RING_BITS {
            u128::MAX
        } else {
            (1u128 << self.bits) - 1
        }
    }

    /// Wrap a raw value into the space, rejecting values that do not fit.
    pub fn id(&self, value: u128) -> Result<RingId> {
        if value & !self.mask() != 0 {
            return Err(Error::IdOutOfRange(value, self.bits));
        }
        Ok(RingId(value))
    }

    /// Consistent hash of arbitrary bytes: SHA-1 digest read as a big-endian unsigned
    /// integer, reduced mod `2^bits`.
    pub fn hash_bytes(&self, data: &[u8]) -> RingId {
        let digest = Sha1::digest(data);
        let modulus = BigUint::from(1u8) << self.bits;
        let reduced = BigUint::from_bytes_be(&digest) % modulus;
        let value = reduced
            .to_u64_digits()
            .iter()
            .rev()
            .fold(0u128, |acc, digit| (acc << 64) | u128::from(*digit));
        RingId(value)
    }

    /// Hash of a network endpoint: raw address octets followed by the decimal port.
    pub fn hash_endpoint(&self, endpoint: &SocketAddr) -> RingId {
        let mut data = match endpoint.ip() {
            IpAddr::V4(ip) => ip.octets().to_vec(),
            IpAddr::V6(ip) => ip.octets().to_vec(),
        };
        data.extend_from_slice(endpoint.port().to_string().as_bytes());
        self.hash_bytes(&data)
    }

    /// Clockwise distance from `from` to `to`.
    pub fn distance(&self, from: RingId, to: RingId) -> u128 {
        to.0.wrapping_sub(from.0) & self.mask()
    }

    /// Test b <- (a, c)
    pub fn strictly_between(&self, a: RingId, b: RingId, c: RingId) -> bool {
        b != a && b != c && self.distance(a, b) < self.distance(a, c)
    }

    /// Test b <- (a, c]
    pub fn in_half_open_arc(&self, a: RingId, b: RingId, c: RingId) -> bool {
        if a == c {
            return true;
        }
        b != a && self.distance(a, b) <= self.distance(a, c)
    }

    /// Target of the i-th finger, `(id + 2^(i-1)) mod 2^bits` for i in `1..=bits`.
    pub fn finger_target(&self, id: RingId, i: usize) -> Result<RingId> {
        if i == 0 || i > self.bits as usize {
            return Err(Error::FingerIndexOutOfRange(i, self.bits));
        }
        Ok(RingId(id.0.wrapping_add(1u128 << (i - 1)) & self.mask()))
    }
}
