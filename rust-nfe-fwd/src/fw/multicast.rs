//! Multicast strategy.
//!
//! Forwards every Interest to all eligible FIB next hops. The safe default
//! when nothing is known about a namespace.

use crate::fw::forwarder::ForwardingContext;
use crate::fw::strategy::Strategy;
use crate::table::pit::PitToken;
use log::debug;
use rust_nfe_common::{FaceId, Interest, LinkType, NackReason};

#[derive(Debug, Default)]
pub struct MulticastStrategy;

impl MulticastStrategy {
    pub const NAME: &'static str = "multicast";

    pub fn new() -> Self {
        Self
    }

    fn is_eligible(
        ctx: &ForwardingContext,
        in_face: FaceId,
        interest: &Interest,
        out_face: FaceId,
    ) -> bool {
        if out_face == in_face && ctx.face_link_type(in_face) != Some(LinkType::AdHoc) {
            return false;
        }
        !ctx.would_violate_scope(in_face, interest, out_face)
    }
}

impl Strategy for MulticastStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn after_receive_interest(
        &mut self,
        ctx: &mut ForwardingContext,
        in_face: FaceId,
        interest: &Interest,
        token: PitToken,
    ) {
        let now = ctx.now();
        let mut sent = 0;
        let mut suppressed = 0;
        for hop in ctx.fib_next_hops(token) {
            if !Self::is_eligible(ctx, in_face, interest, hop.face) {
                continue;
            }
            // an upstream that is already pending aggregates the request
            let pending = ctx.pit_entry(token).is_some_and(|entry| {
                entry
                    .out_records()
                    .iter()
                    .any(|r| r.face == hop.face && r.expiry > now && r.incoming_nack.is_none())
            });
            if pending {
                suppressed += 1;
                continue;
            }
            ctx.send_interest(token, hop.face, interest);
            sent += 1;
        }
        if sent == 0 && suppressed == 0 {
            debug!("no eligible upstream for interest={}", interest);
            ctx.send_nack(token, in_face, NackReason::NoRoute);
            ctx.reject(token);
        }
    }

    fn wants_new_next_hop(&self) -> bool {
        true
    }

    fn after_new_next_hop(&mut self, ctx: &mut ForwardingContext, token: PitToken) {
        let now = ctx.now();
        let (in_face, interest) = match ctx
            .pit_entry(token)
            .and_then(|e| e.in_records().iter().find(|r| r.expiry > now))
        {
            Some(record) => (record.face, record.interest.clone()),
            None => return,
        };
        // only the fresh hop lacks an out-record, so this reaches just it
        for hop in ctx.fib_next_hops(token) {
            if !ctx.can_forward_to(token, hop.face) {
                continue;
            }
            if !Self::is_eligible(ctx, in_face, &interest, hop.face) {
                continue;
            }
            ctx.send_interest(token, hop.face, &interest);
        }
    }
}
