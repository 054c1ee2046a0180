//! Peer exchange buffers and the communication directory.
//!
//! Each neighbor partition gets one `PeerBuffer` holding the shared nodes in
//! a fixed order plus symmetric send/receive payload arrays. Both sides of a
//! pair register the same shared-node set in node-array order, so the two
//! buffer layouts are isomorphic without any index handshake.

use crate::comm::transport::{ExchangeLink, Transport};
use crate::error::FlowError;
use crate::mesh::node::Node;

/// Staging area for one neighbor partition.
#[derive(Debug, Clone, Default)]
pub struct PeerBuffer {
    /// Neighbor partition id.
    peer: usize,
    /// Shared node indices, in registration order. This order fixes the
    /// payload layout for both ends of the exchange.
    nodes: Vec<usize>,
    send: Vec<f64>,
    recv: Vec<f64>,
}

impl PeerBuffer {
    fn new(peer: usize) -> Self {
        Self {
            peer,
            ..Self::default()
        }
    }

    pub fn peer(&self) -> usize {
        self.peer
    }

    pub fn node_indices(&self) -> &[usize] {
        &self.nodes
    }

    pub fn send_payload(&self) -> &[f64] {
        &self.send
    }

    pub fn recv_payload(&self) -> &[f64] {
        &self.recv
    }

    /// Copy each shared node's mass into the send buffer; one value per
    /// node, receive buffer sized to match.
    fn gather_mass(&mut self, nodes: &[Node]) {
        self.send.resize(self.nodes.len(), 0.0);
        self.recv.resize(self.nodes.len(), 0.0);
        for (slot, &ni) in self.send.iter_mut().zip(&self.nodes) {
            *slot = nodes[ni].mass;
        }
    }

    /// Add each received mass onto the matching node. Additive: the local
    /// contribution is already in place.
    fn distribute_mass(&self, nodes: &mut [Node]) {
        for (&val, &ni) in self.recv.iter().zip(&self.nodes) {
            nodes[ni].mass += val;
        }
    }

    /// Copy each shared node's velocity delta into the send buffer,
    /// interleaved x,y; two values per node.
    fn gather_velocity_delta(&mut self, nodes: &[Node]) {
        self.send.resize(self.nodes.len() * 2, 0.0);
        self.recv.resize(self.nodes.len() * 2, 0.0);
        for (j, &ni) in self.nodes.iter().enumerate() {
            self.send[2 * j] = nodes[ni].velocity_delta.x;
            self.send[2 * j + 1] = nodes[ni].velocity_delta.y;
        }
    }

    fn distribute_velocity_delta(&self, nodes: &mut [Node]) {
        for (j, &ni) in self.nodes.iter().enumerate() {
            nodes[ni].velocity_delta.x += self.recv[2 * j];
            nodes[ni].velocity_delta.y += self.recv[2 * j + 1];
        }
    }
}

/// Owns every peer buffer of one partition and marshals nodal values in and
/// out of them.
#[derive(Debug, Clone, Default)]
pub struct CommDirectory {
    buffers: Vec<PeerBuffer>,
}

impl CommDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared node under a neighbor partition id.
    ///
    /// Call in node-array order: the registration order defines the payload
    /// layout, and the neighbor derives the same order independently from
    /// the shared topology.
    pub fn register_shared_node(&mut self, peer: usize, node: usize) {
        self.find_or_create_peer_buffer(peer).nodes.push(node);
    }

    /// Linear scan; acceptable because this only runs during setup.
    fn find_or_create_peer_buffer(&mut self, peer: usize) -> &mut PeerBuffer {
        if let Some(pos) = self.buffers.iter().position(|b| b.peer == peer) {
            return &mut self.buffers[pos];
        }
        self.buffers.push(PeerBuffer::new(peer));
        self.buffers.last_mut().unwrap()
    }

    pub fn peer_buffers(&self) -> &[PeerBuffer] {
        &self.buffers
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn gather_mass(&mut self, nodes: &[Node]) {
        for buf in &mut self.buffers {
            buf.gather_mass(nodes);
        }
    }

    pub fn distribute_mass(&self, nodes: &mut [Node]) {
        for buf in &self.buffers {
            buf.distribute_mass(nodes);
        }
    }

    pub fn gather_velocity_delta(&mut self, nodes: &[Node]) {
        for buf in &mut self.buffers {
            buf.gather_velocity_delta(nodes);
        }
    }

    pub fn distribute_velocity_delta(&self, nodes: &mut [Node]) {
        for buf in &self.buffers {
            buf.distribute_velocity_delta(nodes);
        }
    }

    /// Exchange every peer buffer's send payload for the neighbor's,
    /// waiting for all transfers before returning. Send and receive sizes
    /// must agree per peer (protocol symmetry).
    pub fn exchange<T: Transport>(&mut self, transport: &T) -> Result<(), FlowError> {
        let mut links = Vec::with_capacity(self.buffers.len());
        for buf in &mut self.buffers {
            if buf.send.len() != buf.recv.len() {
                return Err(FlowError::BufferMismatch {
                    peer: buf.peer,
                    send: buf.send.len(),
                    recv: buf.recv.len(),
                });
            }
            links.push(ExchangeLink {
                peer: buf.peer,
                send: &buf.send,
                recv: &mut buf.recv,
            });
        }
        transport.exchange(&mut links)
    }
}
