//! Named-data forwarding engine.
//!
//! A sans-IO Interest/Data/Nack forwarder: the embedder registers faces with
//! a [`LinkSender`] for output, feeds received packets into
//! [`Forwarder::on_interest`]/[`Forwarder::on_data`]/[`Forwarder::on_nack`],
//! and drives time through [`Forwarder::process_timers`]. All tables (PIT,
//! Content Store, FIB, Measurements, Strategy Choice, Dead Nonce List) live
//! inside the engine.

pub mod clock;
pub mod config;
pub mod face;
pub mod fw;
pub mod scheduler;
pub mod table;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{ConfigError, TablesConfig};
pub use face::{FaceTable, LinkSender};
pub use fw::forwarder::{Forwarder, ForwarderCounters, ForwarderObserver, ForwardingContext};
pub use fw::strategy::{Strategy, StrategyRegistry, StrategyTimer};
pub use fw::unsolicited::UnsolicitedDataPolicy;
pub use table::pit::PitToken;
