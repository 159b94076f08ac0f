//! Face table and the outbound link boundary.
//!
//! A [`Face`] pairs an id and its link properties with a [`LinkSender`], the
//! trait the embedder implements to actually put packets on the wire.
//! Inbound packets are delivered by calling the forwarder's `on_*` methods
//! directly with the face id.

use log::trace;
use rust_nfe_common::types::FACEID_RESERVED_MAX;
use rust_nfe_common::{Data, FaceId, FaceScope, Interest, LinkType, Nack};
use std::collections::BTreeMap;

/// Outbound half of the boundary: invoked by the engine to emit packets.
pub trait LinkSender {
    fn send_interest(&mut self, interest: &Interest);
    fn send_data(&mut self, data: &Data);
    fn send_nack(&mut self, nack: &Nack);
}

/// A registered communication endpoint.
pub struct Face {
    id: FaceId,
    scope: FaceScope,
    link_type: LinkType,
    sender: Box<dyn LinkSender>,
}

impl Face {
    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn scope(&self) -> FaceScope {
        self.scope
    }

    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    pub fn send_interest(&mut self, interest: &Interest) {
        trace!("{} send interest={}", self.id, interest);
        self.sender.send_interest(interest);
    }

    pub fn send_data(&mut self, data: &Data) {
        trace!("{} send data={}", self.id, data);
        self.sender.send_data(data);
    }

    pub fn send_nack(&mut self, nack: &Nack) {
        trace!("{} send nack={}", self.id, nack);
        self.sender.send_nack(nack);
    }
}

/// All live faces, keyed by id.
pub struct FaceTable {
    faces: BTreeMap<FaceId, Face>,
    next_id: u32,
}

impl FaceTable {
    pub fn new() -> Self {
        Self {
            faces: BTreeMap::new(),
            next_id: FACEID_RESERVED_MAX + 1,
        }
    }

    /// Registers a face and returns its freshly allocated id.
    pub fn add(
        &mut self,
        scope: FaceScope,
        link_type: LinkType,
        sender: Box<dyn LinkSender>,
    ) -> FaceId {
        let id = FaceId(self.next_id);
        self.next_id += 1;
        self.faces.insert(
            id,
            Face {
                id,
                scope,
                link_type,
                sender,
            },
        );
        id
    }

    /// Removes a face. The caller is responsible for table cleanup first.
    pub fn remove(&mut self, id: FaceId) -> Option<Face> {
        self.faces.remove(&id)
    }

    pub fn get(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(&id)
    }

    pub fn get_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(&id)
    }

    pub fn contains(&self, id: FaceId) -> bool {
        self.faces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys().copied()
    }
}
