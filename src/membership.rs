// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Membership change events.
//!
//! The discovery mechanism feeds the topology manager a queue of
//! [`MembershipEvent`]s: either a [`ChangeNotification`] describing one
//! peer-set delta, or a terminal `Failed` marker when discovery can no longer
//! report the cluster topology. Closing the queue without a `Failed` marker is
//! a clean end of the stream.
//!
//! Ordering matters: notifications for the same address must arrive in the
//! order the discovery source emitted them. An `Add` for an address is not
//! expected twice without an intervening `Delete`; the reconciler defends
//! against that anyway.

use crate::address::PeerAddress;
use serde::{Deserialize, Serialize};

/// One membership delta emitted by the discovery source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeNotification<T> {
    /// The peer joined the known cluster membership.
    Add(T),
    /// The peer left the known cluster membership.
    Delete(T),
}

impl<T> ChangeNotification<T> {
    /// The address the delta applies to.
    pub fn address(&self) -> &T {
        match self {
            ChangeNotification::Add(addr) | ChangeNotification::Delete(addr) => addr,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, ChangeNotification::Add(_))
    }

    /// Stable label for metrics.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ChangeNotification::Add(_) => "add",
            ChangeNotification::Delete(_) => "delete",
        }
    }
}

/// What travels on the membership queue between a discovery adapter and the
/// topology manager.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    /// A membership delta to apply.
    Changed(ChangeNotification<PeerAddress>),
    /// The discovery stream terminated with an error. Fatal for the manager:
    /// the true cluster topology is unknown from this point on.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> PeerAddress {
        PeerAddress::new("host1", port)
    }

    #[test]
    fn test_address_accessor() {
        assert_eq!(ChangeNotification::Add(addr(1)).address(), &addr(1));
        assert_eq!(ChangeNotification::Delete(addr(2)).address(), &addr(2));
    }

    #[test]
    fn test_is_add() {
        assert!(ChangeNotification::Add(addr(1)).is_add());
        assert!(!ChangeNotification::Delete(addr(1)).is_add());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ChangeNotification::Add(addr(1)).kind_label(), "add");
        assert_eq!(ChangeNotification::Delete(addr(1)).kind_label(), "delete");
    }

    #[test]
    fn test_equality() {
        assert_eq!(ChangeNotification::Add(addr(1)), ChangeNotification::Add(addr(1)));
        assert_ne!(ChangeNotification::Add(addr(1)), ChangeNotification::Delete(addr(1)));
        assert_ne!(ChangeNotification::Add(addr(1)), ChangeNotification::Add(addr(2)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = ChangeNotification::Add(addr(123));
        let json = serde_json::to_string(&original).unwrap();
        let back: ChangeNotification<PeerAddress> = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn test_membership_event_debug() {
        let event = MembershipEvent::Failed("connection refused".to_string());
        let debug = format!("{:?}", event);
        assert!(debug.contains("connection refused"));
    }
}
