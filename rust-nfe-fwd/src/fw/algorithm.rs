//! Shared pipeline and strategy predicates.

use crate::clock::Timestamp;
use crate::table::pit;
use rust_nfe_common::{FaceId, FaceScope, Interest, Name, NameComponent};
use std::sync::OnceLock;

/// Where a duplicate nonce was found in a PIT entry, as a bitmask.
pub const DUPLICATE_NONCE_NONE: u8 = 0;
pub const DUPLICATE_NONCE_IN_SAME: u8 = 1 << 0;
pub const DUPLICATE_NONCE_IN_OTHER: u8 = 1 << 1;
pub const DUPLICATE_NONCE_OUT_SAME: u8 = 1 << 2;
pub const DUPLICATE_NONCE_OUT_OTHER: u8 = 1 << 3;

/// Scans the entry's records for `nonce`, relative to `face`.
pub fn find_duplicate_nonce(entry: &pit::Entry, nonce: u32, face: FaceId) -> u8 {
    let mut found = DUPLICATE_NONCE_NONE;
    for record in entry.in_records() {
        if record.last_nonce == nonce {
            found |= if record.face == face {
                DUPLICATE_NONCE_IN_SAME
            } else {
                DUPLICATE_NONCE_IN_OTHER
            };
        }
    }
    for record in entry.out_records() {
        if record.last_nonce == nonce {
            found |= if record.face == face {
                DUPLICATE_NONCE_OUT_SAME
            } else {
                DUPLICATE_NONCE_OUT_OTHER
            };
        }
    }
    found
}

/// Whether the entry still waits on any upstream that has not nacked.
pub fn has_pending_out_records(entry: &pit::Entry, now: Timestamp) -> bool {
    entry
        .out_records()
        .iter()
        .any(|r| r.expiry > now && r.incoming_nack.is_none())
}

/// Whether the Interest may be forwarded to `face`: it was not already sent
/// there (and is still pending), and some other downstream still wants it.
pub fn can_forward_to(entry: &pit::Entry, face: FaceId, now: Timestamp) -> bool {
    let has_unexpired_out_record = entry
        .out_records()
        .iter()
        .any(|r| r.face == face && r.expiry > now && r.incoming_nack.is_none());
    if has_unexpired_out_record {
        return false;
    }
    entry
        .in_records()
        .iter()
        .any(|r| r.face != face && r.expiry > now)
}

fn localhost_name() -> &'static Name {
    static NAME: OnceLock<Name> = OnceLock::new();
    NAME.get_or_init(|| {
        let mut n = Name::new();
        n.push(NameComponent::new(&b"localhost"[..]));
        n
    })
}

fn localhop_name() -> &'static Name {
    static NAME: OnceLock<Name> = OnceLock::new();
    NAME.get_or_init(|| {
        let mut n = Name::new();
        n.push(NameComponent::new(&b"localhop"[..]));
        n
    })
}

/// Whether `name` falls under the host-only `/localhost` scope.
pub fn is_localhost_name(name: &Name) -> bool {
    localhost_name().is_prefix_of(name)
}

/// Whether sending `interest` out of a face with `out_scope` would leak a
/// scoped name off the host.
///
/// `/localhost` names never cross a non-local face; `/localhop` names may
/// cross at most one link, so they only leave through a non-local face when
/// they entered through a local one.
pub fn would_violate_scope(
    in_scope: FaceScope,
    interest: &Interest,
    out_scope: FaceScope,
) -> bool {
    if out_scope == FaceScope::Local {
        return false;
    }
    if localhost_name().is_prefix_of(&interest.name) {
        return true;
    }
    if localhop_name().is_prefix_of(&interest.name) {
        return in_scope != FaceScope::Local;
    }
    false
}
