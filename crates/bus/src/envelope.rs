//! Message envelope and headers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BusError;

/// Queue that rejected messages are moved to.
pub fn dead_letter_queue(queue: &str) -> String {
    format!("{queue}.dlq")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    pub message_id: Uuid,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl Headers {
    /// Fresh headers with a new message id.
    pub fn new() -> Self {
        Self {
            message_id: Uuid::new_v4(),
            correlation_id: None,
            reply_to: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub queue: String,
    pub headers: Headers,
    pub body: serde_json::Value,
}

impl Envelope {
    pub fn new(queue: impl Into<String>, headers: Headers, body: serde_json::Value) -> Self {
        Self {
            queue: queue.into(),
            headers,
            body,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Response addressed to this message's `reply_to`, correlated by its
    /// message id. `None` when the sender did not ask for a reply.
    pub fn reply(&self, body: serde_json::Value) -> Option<Envelope> {
        let reply_to = self.headers.reply_to.as_ref()?;
        Some(Envelope::new(
            reply_to.clone(),
            Headers::new().with_correlation_id(self.headers.message_id.to_string()),
            body,
        ))
    }
}

/// How a consumer disposes of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Done with the message, remove it.
    Ack,
    /// Put the message back for redelivery.
    Requeue,
    /// Move the message to the dead-letter queue.
    Reject,
}
