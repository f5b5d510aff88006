//! In-process broker.
//!
//! Queues are FIFO deques guarded by one mutex, with a [`Notify`] per queue
//! to wake waiting consumers. Calls register a oneshot sender keyed by the
//! request's message id; a reply published to this broker's reply queue
//! with a matching `correlation_id` completes the waiting call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

use crate::broker::{Acker, Broker, Delivery, Subscription};
use crate::envelope::{dead_letter_queue, Envelope, Headers, Settlement};
use crate::error::BusError;

#[derive(Default)]
struct Queues {
    messages: HashMap<String, VecDeque<Envelope>>,
    notifiers: HashMap<String, Arc<Notify>>,
    pending: HashMap<Uuid, oneshot::Sender<Envelope>>,
}

impl Queues {
    fn notifier(&mut self, queue: &str) -> Arc<Notify> {
        Arc::clone(self.notifiers.entry(queue.to_string()).or_default())
    }
}

struct Inner {
    queues: Mutex<Queues>,
    reply_queue: String,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, envelope: Envelope, front: bool) {
        let notify = {
            let mut queues = self.lock();
            let notify = queues.notifier(&envelope.queue);
            let queue = queues.messages.entry(envelope.queue.clone()).or_default();
            if front {
                queue.push_front(envelope);
            } else {
                queue.push_back(envelope);
            }
            notify
        };
        notify.notify_one();
    }

    /// Hand a reply to the call waiting on it. Returns the envelope back
    /// when nobody is waiting.
    fn complete_call(&self, envelope: Envelope) -> Option<Envelope> {
        let call_id = envelope
            .headers
            .correlation_id
            .as_deref()
            .and_then(|id| id.parse::<Uuid>().ok());
        let Some(call_id) = call_id else {
            return Some(envelope);
        };
        let Some(waiter) = self.lock().pending.remove(&call_id) else {
            return Some(envelope);
        };
        // A dropped receiver means the call already timed out.
        let _ = waiter.send(envelope);
        None
    }
}

#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queues: Mutex::new(Queues::default()),
                reply_queue: format!("reply.{}", Uuid::new_v4()),
            }),
        }
    }

    pub fn reply_queue(&self) -> &str {
        &self.inner.reply_queue
    }

    /// Remove and return everything currently on `queue`.
    pub fn drain(&self, queue: &str) -> Vec<Envelope> {
        self.inner
            .lock()
            .messages
            .get_mut(queue)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.inner
            .lock()
            .messages
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, queue: &str) -> bool {
        self.len(queue) == 0
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        let envelope = if envelope.queue == self.inner.reply_queue {
            match self.inner.complete_call(envelope) {
                Some(orphan) => orphan,
                None => return Ok(()),
            }
        } else {
            envelope
        };
        self.inner.push(envelope, false);
        Ok(())
    }

    async fn call(
        &self,
        queue: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<Envelope, BusError> {
        let headers = Headers::new().with_reply_to(self.inner.reply_queue.clone());
        let call_id = headers.message_id;

        let (tx, rx) = oneshot::channel();
        self.inner.lock().pending.insert(call_id, tx);
        self.inner.push(Envelope::new(queue, headers, body), false);

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BusError::Closed(call_id.to_string())),
            Err(_) => {
                self.inner.lock().pending.remove(&call_id);
                Err(BusError::Timeout {
                    queue: queue.to_string(),
                    timeout,
                })
            }
        }
    }

    async fn consume(&self, queue: &str) -> Result<Box<dyn Subscription>, BusError> {
        let notify = self.inner.lock().notifier(queue);
        Ok(Box::new(MemorySubscription {
            inner: Arc::clone(&self.inner),
            queue: queue.to_string(),
            notify,
        }))
    }
}

struct MemorySubscription {
    inner: Arc<Inner>,
    queue: String,
    notify: Arc<Notify>,
}

impl MemorySubscription {
    fn pop(&self) -> Option<Envelope> {
        self.inner
            .lock()
            .messages
            .get_mut(&self.queue)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Delivery, BusError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(envelope) = self.pop() {
                let acker = MemoryAcker {
                    inner: Arc::clone(&self.inner),
                };
                return Ok(Delivery::new(envelope, Box::new(acker)));
            }
            notified.await;
        }
    }
}

struct MemoryAcker {
    inner: Arc<Inner>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn settle(
        self: Box<Self>,
        envelope: &Envelope,
        settlement: Settlement,
    ) -> Result<(), BusError> {
        match settlement {
            Settlement::Ack => {}
            Settlement::Requeue => self.inner.push(envelope.clone(), true),
            Settlement::Reject => {
                let mut dead = envelope.clone();
                dead.queue = dead_letter_queue(&envelope.queue);
                self.inner.push(dead, false);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn consumer_receives_published_message() {
        let broker = MemoryBroker::new();
        let mut sub = broker.consume("jobs").await.unwrap();

        broker
            .send("jobs", Headers::new().with_correlation_id("j1"), json!({"n": 1}))
            .await
            .unwrap();

        let delivery = sub.next().await.unwrap();
        assert_eq!(delivery.envelope.body["n"], 1);
        assert_eq!(delivery.envelope.headers.correlation_id.as_deref(), Some("j1"));
        delivery.ack().await.unwrap();
        assert!(broker.is_empty("jobs"));
    }

    #[tokio::test]
    async fn consumer_waits_for_late_message() {
        let broker = MemoryBroker::new();
        let mut sub = broker.consume("jobs").await.unwrap();

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher
                .send("jobs", Headers::new(), json!("late"))
                .await
                .unwrap();
        });

        let delivery = tokio::time::timeout(Duration::from_secs(1), sub.next())
            .await
            .expect("delivery within a second")
            .unwrap();
        assert_eq!(delivery.envelope.body, json!("late"));
    }

    #[tokio::test]
    async fn requeue_puts_message_back_first() {
        let broker = MemoryBroker::new();
        broker.send("q", Headers::new(), json!(1)).await.unwrap();
        broker.send("q", Headers::new(), json!(2)).await.unwrap();

        let mut sub = broker.consume("q").await.unwrap();
        sub.next().await.unwrap().requeue().await.unwrap();

        let again = sub.next().await.unwrap();
        assert_eq!(again.envelope.body, json!(1));
    }

    #[tokio::test]
    async fn reject_moves_to_dead_letter_queue() {
        let broker = MemoryBroker::new();
        broker.send("q", Headers::new(), json!("bad")).await.unwrap();

        let mut sub = broker.consume("q").await.unwrap();
        sub.next().await.unwrap().reject().await.unwrap();

        assert!(broker.is_empty("q"));
        let dead = broker.drain("q.dlq");
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].body, json!("bad"));
    }

    #[tokio::test]
    async fn call_returns_correlated_reply() {
        let broker = MemoryBroker::new();
        let mut server = broker.consume("ry-acme-query").await.unwrap();

        let responder = broker.clone();
        tokio::spawn(async move {
            let request = server.next().await.unwrap();
            let reply = request.envelope.reply(json!({"echo": request.envelope.body})).unwrap();
            responder.publish(reply).await.unwrap();
            request.ack().await.unwrap();
        });

        let reply = broker
            .call("ry-acme-query", json!("ping"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(reply.body["echo"], "ping");
    }

    #[tokio::test]
    async fn call_times_out_without_reply() {
        let broker = MemoryBroker::new();
        let result = broker
            .call("ry-acme-query", json!("ping"), Duration::from_millis(10))
            .await;
        assert_matches!(result, Err(BusError::Timeout { queue, .. }) if queue == "ry-acme-query");
        assert!(broker.inner.lock().pending.is_empty());
    }

    #[tokio::test]
    async fn uncorrelated_reply_is_queued() {
        let broker = MemoryBroker::new();
        let reply_queue = broker.reply_queue().to_string();
        broker
            .send(&reply_queue, Headers::new().with_correlation_id("nope"), json!(1))
            .await
            .unwrap();
        assert_eq!(broker.len(&reply_queue), 1);
    }
}
