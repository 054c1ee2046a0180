//! Time integration: the partition state, the simulation clock and the
//! driver that ties them to a transport.

pub mod clock;
pub mod driver;
pub mod partition;

pub use clock::SimClock;
pub use driver::Driver;
pub use partition::Partition;
