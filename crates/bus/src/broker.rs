use std::time::Duration;

use async_trait::async_trait;

use crate::envelope::{Envelope, Headers, Settlement};
use crate::error::BusError;

#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError>;

    async fn send(
        &self,
        queue: &str,
        headers: Headers,
        body: serde_json::Value,
    ) -> Result<(), BusError> {
        self.publish(Envelope::new(queue, headers, body)).await
    }

    /// Send `body` to `queue` and wait for the correlated reply.
    async fn call(
        &self,
        queue: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<Envelope, BusError>;

    async fn consume(&self, queue: &str) -> Result<Box<dyn Subscription>, BusError>;
}

/// Competing-consumer handle on one queue.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message.
    async fn next(&mut self) -> Result<Delivery, BusError>;
}

/// Settles one delivery on the broker that produced it.
#[async_trait]
pub trait Acker: Send + Sync {
    async fn settle(
        self: Box<Self>,
        envelope: &Envelope,
        settlement: Settlement,
    ) -> Result<(), BusError>;
}

/// A received message that must be settled exactly once.
pub struct Delivery {
    pub envelope: Envelope,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(envelope: Envelope, acker: Box<dyn Acker>) -> Self {
        Self { envelope, acker }
    }

    pub async fn settle(self, settlement: Settlement) -> Result<(), BusError> {
        self.acker.settle(&self.envelope, settlement).await
    }

    pub async fn ack(self) -> Result<(), BusError> {
        self.settle(Settlement::Ack).await
    }

    pub async fn requeue(self) -> Result<(), BusError> {
        self.settle(Settlement::Requeue).await
    }

    pub async fn reject(self) -> Result<(), BusError> {
        self.settle(Settlement::Reject).await
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}
