//! IPv4 CIDR arithmetic.
//!
//! Blocks are handled as a big-endian `u32` network address plus a prefix
//! length. Child blocks are computed as `parent + index * 2^(32 - prefix)`,
//! so stepping past the end of a parent simply yields the sibling block that
//! follows it.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};

/// An IPv4 network in CIDR notation (`10.0.0.0/16`).
///
/// Host bits are cleared on construction, so `10.0.1.7/16` and `10.0.0.0/16`
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Build a block from an address and prefix length.
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> NetResult<Self> {
        if prefix_len > 32 {
            return Err(NetError::InvalidCidr(format!(
                "prefix length /{} exceeds 32 bits",
                prefix_len
            )));
        }

        let network = u32::from(address) & mask_for(prefix_len);
        Ok(Self {
            network: Ipv4Addr::from(network),
            prefix_len,
        })
    }

    /// Parse `a.b.c.d/p`.
    pub fn parse(cidr: impl AsRef<str>) -> NetResult<Self> {
        let cidr = cidr.as_ref().trim();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetError::MalformedInput(format!("invalid CIDR address: {}", cidr)))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetError::MalformedInput(format!("invalid CIDR address: {}", cidr)))?;
        let prefix_len = prefix_str
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| NetError::MalformedInput(format!("invalid CIDR address: {}", cidr)))?;

        Self::new(address, prefix_len)
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// Last address in the block.
    pub fn broadcast(&self) -> Ipv4Addr {
        let last = u64::from(u32::from(self.network)) + self.size() - 1;
        Ipv4Addr::from(last as u32)
    }

    /// Whether `address` falls inside this block.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & mask_for(self.prefix_len) == u32::from(self.network)
    }

    /// Whether `other` lies entirely within this block.
    pub fn contains_block(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_len >= self.prefix_len && self.contains(other.network)
    }

    /// Child block `index` carrying `additional_bits` more prefix bits.
    ///
    /// With `additional_bits == 0`, index 1 is the same-sized block directly
    /// after this one.
    pub fn subnet(&self, additional_bits: u8, index: u32) -> NetResult<Ipv4Cidr> {
        let new_prefix = u32::from(self.prefix_len) + u32::from(additional_bits);
        if new_prefix > 32 {
            return Err(NetError::InvalidCidr(format!(
                "Requested {} new bits, but only {} are available.",
                additional_bits,
                32 - self.prefix_len
            )));
        }

        let step = 1u64 << (32 - new_prefix);
        let address = u64::from(u32::from(self.network)) + u64::from(index) * step;
        if address > u64::from(u32::MAX) {
            return Err(NetError::InvalidCidr(format!(
                "subnet {} of {} with {} new bits lies beyond the IPv4 address space",
                index, self, additional_bits
            )));
        }

        Self::new(Ipv4Addr::from(address as u32), new_prefix as u8)
    }

    /// Whether the two blocks share any address.
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other.network) || other.contains(self.network)
    }
}

fn mask_for(prefix_len: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0)
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Compute child block `index` of `base` with `additional_bits` more prefix bits.
pub fn cidr_subnet_v4(base: &str, additional_bits: u8, index: u32) -> NetResult<Ipv4Cidr> {
    Ipv4Cidr::parse(base)?.subnet(additional_bits, index)
}

/// Round `n` up to the next power of two; `next_pow2(0) == 1`.
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Two blocks overlap iff either base address falls inside the other block.
pub fn do_subnets_overlap(a: &Ipv4Cidr, b: &Ipv4Cidr) -> bool {
    a.overlaps(b)
}
