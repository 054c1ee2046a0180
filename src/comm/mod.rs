//! Inter-partition communication: peer exchange buffers, the communication
//! directory and the transport backends.

pub mod exchange;
pub mod transport;

pub use exchange::{CommDirectory, PeerBuffer};
#[cfg(feature = "mpi-support")]
pub use transport::MpiTransport;
pub use transport::{ExchangeLink, LocalTransport, NoTransport, Transport};
