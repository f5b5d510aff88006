//! Broker tests against a live PostgreSQL (`DATABASE_URL`).
//!
//! Run with `cargo test -p rybridge-bus -- --ignored`.

use std::time::Duration;

use rybridge_bus::{Broker, BusError, Headers, PgBroker};
use serde_json::json;
use sqlx::PgPool;

fn broker(pool: PgPool) -> PgBroker {
    PgBroker::new(pool, Duration::from_millis(10))
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn send_consume_ack(pool: PgPool) {
    let broker = broker(pool.clone());
    broker
        .send("worker_jobs", Headers::new().with_correlation_id("job-1"), json!({"n": 1}))
        .await
        .unwrap();

    let mut sub = broker.consume("worker_jobs").await.unwrap();
    let delivery = sub.next().await.unwrap();
    assert_eq!(delivery.envelope.headers.correlation_id.as_deref(), Some("job-1"));
    delivery.ack().await.unwrap();

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_queue")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn reject_moves_row_to_dead_letter_queue(pool: PgPool) {
    let broker = broker(pool.clone());
    broker.send("worker_jobs", Headers::new(), json!("bad")).await.unwrap();

    let mut sub = broker.consume("worker_jobs").await.unwrap();
    sub.next().await.unwrap().reject().await.unwrap();

    let queue: String = sqlx::query_scalar("SELECT queue FROM message_queue")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(queue, "worker_jobs.dlq");
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn call_round_trip_and_timeout(pool: PgPool) {
    let client = broker(pool.clone());
    let server = broker(pool);

    let responder = tokio::spawn(async move {
        let mut sub = server.consume("ry-acme-query").await.unwrap();
        let request = sub.next().await.unwrap();
        let reply = request.envelope.reply(json!({"pong": true})).unwrap();
        server.publish(reply).await.unwrap();
        request.ack().await.unwrap();
    });

    let reply = client
        .call("ry-acme-query", json!("ping"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reply.body["pong"], true);
    responder.await.unwrap();

    let timed_out = client
        .call("ry-acme-query", json!("ping"), Duration::from_millis(30))
        .await;
    assert!(matches!(timed_out, Err(BusError::Timeout { .. })));
}

async fn queue_rows(pool: &PgPool, queue: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM message_queue WHERE queue = $1")
        .bind(queue)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn unclaimed_replies_expire(pool: PgPool) {
    // A reply to a call that already gave up, one to a process that exited,
    // and an old job notification that must survive.
    for queue in ["reply.late", "reply.gone", "worker_jobs"] {
        sqlx::query(
            "INSERT INTO message_queue (queue, message_id, body, created_at) \
             VALUES ($1, gen_random_uuid(), '{}', NOW() - INTERVAL '1 hour')",
        )
        .bind(queue)
        .execute(&pool)
        .await
        .unwrap();
    }
    sqlx::query("INSERT INTO message_queue (queue, message_id, body) VALUES ('reply.fresh', gen_random_uuid(), '{}')")
        .execute(&pool)
        .await
        .unwrap();

    let client = broker(pool.clone()).with_reply_ttl(Duration::from_secs(60));
    let timed_out = client
        .call("ry-acme-query", json!("ping"), Duration::from_millis(20))
        .await;
    assert!(matches!(timed_out, Err(BusError::Timeout { .. })));

    assert_eq!(queue_rows(&pool, "reply.late").await, 0);
    assert_eq!(queue_rows(&pool, "reply.gone").await, 0);
    assert_eq!(queue_rows(&pool, "reply.fresh").await, 1);
    assert_eq!(queue_rows(&pool, "worker_jobs").await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn requeue_backs_off(pool: PgPool) {
    let broker = broker(pool.clone()).with_requeue_backoff(Duration::from_secs(60));
    broker.send("worker_jobs", Headers::new(), json!(1)).await.unwrap();

    let mut sub = broker.consume("worker_jobs").await.unwrap();
    sub.next().await.unwrap().requeue().await.unwrap();

    let again = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
    assert!(again.is_err(), "requeued message redelivered before its backoff");
}

#[sqlx::test(migrations = "../db/migrations")]
#[ignore = "needs DATABASE_URL"]
async fn message_requeued_too_often_is_dead_lettered(pool: PgPool) {
    let broker = broker(pool.clone())
        .with_requeue_backoff(Duration::ZERO)
        .with_max_deliveries(2);
    broker.send("worker_jobs", Headers::new(), json!(1)).await.unwrap();

    let mut sub = broker.consume("worker_jobs").await.unwrap();
    for _ in 0..2 {
        sub.next().await.unwrap().requeue().await.unwrap();
    }
    let third = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;

    assert!(third.is_err());
    assert_eq!(queue_rows(&pool, "worker_jobs").await, 0);
    assert_eq!(queue_rows(&pool, "worker_jobs.dlq").await, 1);
}
