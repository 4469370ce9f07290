//! Fuzz target for peer address parsing.
//!
//! This tests that `PeerAddress` parsing never panics on arbitrary input,
//! and that any address it accepts survives a display/parse roundtrip.

#![no_main]

use libfuzzer_sys::fuzz_target;
use replication_topology::address::PeerAddress;

fuzz_target!(|data: &str| {
    // Should never panic
    if let Ok(addr) = data.parse::<PeerAddress>() {
        let rendered = addr.to_string();
        let reparsed = rendered
            .parse::<PeerAddress>()
            .expect("rendered address must parse");
        assert_eq!(addr, reparsed);
    }
});
