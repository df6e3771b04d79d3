//! # IPv4 Address Ranges
//!
//! CIDR parsing and sequential, aligned subnet allocation inside a VPC range.

use crate::constants::MAX_SUBNET_PREFIX;
use crate::error::{Result, StackError};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// IPv4 network in CIDR notation, host bits clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(invalid(
                &format!("{network}/{prefix}"),
                "prefix length must be at most 32",
            ));
        }
        let cidr = Self { network, prefix };
        if u32::from(network) & !cidr.mask() != 0 {
            return Err(invalid(&cidr.to_string(), "host bits must be zero"));
        }
        Ok(cidr)
    }

    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the range
    #[must_use]
    pub fn size(&self) -> u64 {
        1_u64 << (32 - u32::from(self.prefix))
    }

    #[must_use]
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix
            && u32::from(other.network) & self.mask() == u32::from(self.network)
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        let (address, prefix) = s
            .split_once('/')
            .ok_or_else(|| invalid(s, "expected <address>/<prefix>"))?;
        let network: Ipv4Addr = address
            .parse()
            .map_err(|e| invalid(s, &format!("bad address: {e}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|e| invalid(s, &format!("bad prefix: {e}")))?;
        Self::new(network, prefix)
    }
}

fn invalid(value: &str, reason: &str) -> StackError {
    StackError::invalid_property("VPC", "cidr", format!("{value}: {reason}"))
}

/// Prefix that gives each of `count` subnets an equal, power-of-two share
/// of `available` addresses
pub fn equal_share_prefix(available: u64, count: usize) -> Result<u8> {
    if count == 0 {
        return Err(StackError::invalid_property(
            "VPC",
            "subnetConfiguration",
            "no subnets to allocate",
        ));
    }
    let share = available / count as u64;
    if share == 0 {
        return Err(StackError::invalid_property(
            "VPC",
            "cidr",
            format!("{count} subnets do not fit in {available} addresses"),
        ));
    }
    // Largest power of two not above the share
    let bits = 63 - share.leading_zeros();
    let prefix = 32_u32.saturating_sub(bits);
    u8::try_from(prefix).map_err(|_| {
        StackError::invalid_property("VPC", "cidr", format!("prefix {prefix} out of range"))
    })
}

/// Hands out aligned, non-overlapping blocks from a range, lowest first
#[derive(Debug, Clone)]
pub struct CidrAllocator {
    range: Ipv4Cidr,
    next_offset: u64,
}

impl CidrAllocator {
    #[must_use]
    pub fn new(range: Ipv4Cidr) -> Self {
        Self {
            range,
            next_offset: 0,
        }
    }

    /// Addresses not yet handed out
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.range.size().saturating_sub(self.next_offset)
    }

    pub fn allocate(&mut self, prefix: u8) -> Result<Ipv4Cidr> {
        if prefix < self.range.prefix || prefix > MAX_SUBNET_PREFIX {
            return Err(StackError::invalid_property(
                "VPC",
                "cidrMask",
                format!(
                    "/{prefix} must be between /{} and /{MAX_SUBNET_PREFIX}",
                    self.range.prefix
                ),
            ));
        }

        let block = 1_u64 << (32 - u32::from(prefix));
        let offset = self.next_offset.div_ceil(block) * block;
        if offset + block > self.range.size() {
            return Err(StackError::invalid_property(
                "VPC",
                "cidr",
                format!("{} has no room left for a /{prefix}", self.range),
            ));
        }

        let base = u64::from(u32::from(self.range.network)) + offset;
        let network = u32::try_from(base).map_err(|_| {
            StackError::invalid_property("VPC", "cidr", "allocation beyond the IPv4 space")
        })?;
        self.next_offset = offset + block;
        Ipv4Cidr::new(Ipv4Addr::from(network), prefix)
    }
}
