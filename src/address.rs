// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Peer address value type.
//!
//! A [`PeerAddress`] identifies one remote write node within a cluster
//! generation by its `(host, port)` pair. Equality and hashing use the pair,
//! which makes the type directly usable as the topology map key.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of a remote write node.
///
/// Immutable value; construct with [`PeerAddress::new`] or parse `"host:port"`
/// via [`FromStr`]. IPv6 hosts may be bracketed (`"[::1]:7021"`).
///
/// Ordering is lexicographic by host, then by port, so sorted peer lists come
/// out in a stable, human-scannable order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    host: String,
    port: u16,
}

impl PeerAddress {
    /// Build an address from a known-good host and port.
    ///
    /// The host must be nonempty: an empty host renders as `":port"`, which
    /// the parser rejects. Untrusted input goes through [`FromStr`] instead.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        debug_assert!(!host.is_empty(), "peer host must be nonempty");
        Self { host, port }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bracket IPv6 hosts so the rendered form parses back unambiguously.
        // Hosts that already look bracketed get the same treatment, otherwise
        // the parser would strip a level on the way back in.
        let needs_brackets = self.host.contains(':')
            || (self.host.starts_with('[') && self.host.ends_with(']'));
        if needs_brackets {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for PeerAddress {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| TopologyError::invalid_address(s, "expected host:port"))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(TopologyError::invalid_address(s, "empty host"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| TopologyError::invalid_address(s, "invalid port"))?;

        Ok(Self::new(host, port))
    }
}
