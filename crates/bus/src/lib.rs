//! Message transport between workers and the registry interface.
//!
//! [`Broker`] is the seam: [`MemoryBroker`] keeps queues in process,
//! [`PgBroker`] stores them in the `message_queue` table. Both support
//! fire-and-forget sends, competing consumers with explicit settlement,
//! and request/response calls correlated by message id.

pub mod broker;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod postgres;

pub use broker::{Acker, Broker, Delivery, Subscription};
pub use envelope::{dead_letter_queue, Envelope, Headers, Settlement};
pub use error::BusError;
pub use memory::MemoryBroker;
pub use postgres::PgBroker;
