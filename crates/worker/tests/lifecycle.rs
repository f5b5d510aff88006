mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{accreditation_json, Harness, TRANSFORM_QUEUE};
use rybridge_bus::{dead_letter_queue, Broker, Envelope, Headers, Settlement};
use rybridge_core::{JobKind, JobStatus};
use rybridge_db::models::ProvisionDomainRenew;
use rybridge_protocol::RyRequest;
use rybridge_worker::{handle_delivery, Consumer, JobOutcome, WorkerError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn host_delete() -> serde_json::Value {
    json!({"host_name": "ns1.example.net", "accreditation": accreditation_json()})
}

fn renew(h: &Harness, period: i32) -> uuid::Uuid {
    let renew_id = Uuid::new_v4();
    h.store.insert_provision_renew(ProvisionDomainRenew {
        id: renew_id,
        domain_name: "example.com".into(),
        period,
        current_expiry_date: Utc::now(),
        price_amount: Some(1045.0),
        price_currency: Some("USD".into()),
        price_fraction: Some(100),
    });
    h.submit(
        JobKind::DomainRenew,
        json!({
            "name": "example.com",
            "accreditation": accreditation_json(),
            "provision_domain_renew_id": renew_id,
            // The provision record wins over anything the payload says.
            "period": 5,
        }),
    )
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatched_job_carries_reply_and_correlation_headers() {
    let h = Harness::new();
    let job_id = h.submit(JobKind::HostDelete, host_delete());

    h.run(job_id).await.unwrap();

    let (envelope, request) = h.sent_one(TRANSFORM_QUEUE);
    assert_eq!(envelope.headers.reply_to.as_deref(), Some("host_provision_update"));
    assert_eq!(envelope.headers.correlation_id, Some(job_id.to_string()));
    assert_matches!(request, RyRequest::HostDelete(req) if req.name == "ns1.example.net");
    assert_eq!(h.status(job_id), JobStatus::Processing);
}

#[tokio::test]
async fn non_submitted_job_is_skipped() {
    let h = Harness::new();
    let job_id = h.insert_job(
        JobKind::HostDelete.as_str(),
        JobStatus::Processing,
        host_delete(),
    );

    let outcome = h.run(job_id).await.unwrap();

    assert_eq!(outcome, JobOutcome::Skipped { status: JobStatus::Processing });
    assert!(h.broker.is_empty(TRANSFORM_QUEUE));
    assert_eq!(h.status(job_id), JobStatus::Processing);
}

#[tokio::test]
async fn finished_job_is_skipped_on_redelivery() {
    let h = Harness::new();
    let job_id = h.submit(JobKind::HostDelete, host_delete());
    h.run(job_id).await.unwrap();
    h.broker.drain(TRANSFORM_QUEUE);

    let completed = h.insert_job(
        JobKind::HostDelete.as_str(),
        JobStatus::Completed,
        host_delete(),
    );
    let again = h.run(job_id).await.unwrap();
    let finished = h.run(completed).await.unwrap();

    assert_eq!(again, JobOutcome::Skipped { status: JobStatus::Processing });
    assert_eq!(finished, JobOutcome::Skipped { status: JobStatus::Completed });
    assert!(h.broker.is_empty(TRANSFORM_QUEUE));
}

#[tokio::test]
async fn undecodable_payload_fails_the_job() {
    let h = Harness::new();
    let job_id = h.submit(JobKind::HostDelete, json!({"host_name": 42}));

    let err = h.run(job_id).await.unwrap_err();

    assert_matches!(err, WorkerError::Decode { .. });
    assert_eq!(err.settlement(), Settlement::Ack);
    assert_eq!(h.status(job_id), JobStatus::Failed);
    assert!(h.result_msg(job_id).is_some());
}

#[tokio::test]
async fn send_failure_leaves_job_submitted() {
    let h = Harness::new();
    h.flaky.set_failing(true);
    let job_id = h.submit(JobKind::HostDelete, host_delete());

    let err = h.run(job_id).await.unwrap_err();

    assert_matches!(err, WorkerError::Send { ref queue, .. } if queue == TRANSFORM_QUEUE);
    assert_eq!(err.settlement(), Settlement::Requeue);
    assert_eq!(h.status(job_id), JobStatus::Submitted);

    // Redelivery after the broker recovers goes through.
    h.flaky.set_failing(false);
    h.run(job_id).await.unwrap();
    assert_eq!(h.status(job_id), JobStatus::Processing);
}

#[tokio::test]
async fn zero_period_renew_completes_without_sending() {
    let h = Harness::new();
    let job_id = renew(&h, 0);

    let outcome = h.run(job_id).await.unwrap();

    assert_matches!(outcome, JobOutcome::Completed { .. });
    assert!(h.broker.is_empty(TRANSFORM_QUEUE));
    assert_eq!(h.status(job_id), JobStatus::Completed);
}

#[tokio::test]
async fn renew_uses_provision_period_and_price() {
    let h = Harness::new();
    let job_id = renew(&h, 2);

    h.run(job_id).await.unwrap();

    let (_, request) = h.sent_one(TRANSFORM_QUEUE);
    let renew = assert_matches!(request, RyRequest::DomainRenew(renew) => renew);
    assert_eq!(renew.period.value, 2);
    assert!(renew.extensions.contains_key("fee"));
}

#[tokio::test]
async fn missing_provision_record_fails_the_job() {
    let h = Harness::new();
    let job_id = h.submit(
        JobKind::DomainRenew,
        json!({
            "name": "example.com",
            "accreditation": accreditation_json(),
            "provision_domain_renew_id": Uuid::new_v4(),
        }),
    );

    let err = h.run(job_id).await.unwrap_err();

    assert_matches!(err, WorkerError::JobFailed { .. });
    assert_eq!(h.status(job_id), JobStatus::Failed);
}

#[tokio::test]
async fn unknown_job_type_is_an_error() {
    let h = Harness::new();
    let job_id = h.insert_job("provision_domain_frob", JobStatus::Submitted, json!({}));

    let err = h.run(job_id).await.unwrap_err();

    assert_matches!(err, WorkerError::UnknownJobType(ref name) if name == "provision_domain_frob");
    assert_eq!(err.settlement(), Settlement::Reject);
    assert_eq!(h.status(job_id), JobStatus::Submitted);
}

// ---------------------------------------------------------------------------
// Delivery settlement and consumer loop
// ---------------------------------------------------------------------------

fn notification_envelope(h: &Harness, job_id: Uuid) -> Envelope {
    Envelope::new(
        "worker_jobs",
        Headers::new(),
        serde_json::to_value(h.notification(job_id)).unwrap(),
    )
}

#[tokio::test]
async fn malformed_notification_is_dead_lettered() {
    let h = Harness::new();
    h.broker
        .publish(Envelope::new("worker_jobs", Headers::new(), json!({"job": "?"})))
        .await
        .unwrap();

    let mut subscription = h.broker.consume("worker_jobs").await.unwrap();
    let delivery = subscription.next().await.unwrap();
    let settlement = handle_delivery(&h.ctx, delivery).await;

    assert_eq!(settlement, Settlement::Reject);
    assert_eq!(h.broker.len(&dead_letter_queue("worker_jobs")), 1);
}

#[tokio::test]
async fn consumer_processes_queued_notifications() {
    let h = Harness::new();
    let first = h.submit(JobKind::HostDelete, host_delete());
    let second = h.submit(JobKind::HostDelete, host_delete());
    for job_id in [first, second] {
        h.broker.publish(notification_envelope(&h, job_id)).await.unwrap();
    }

    // One permit: the memory store does not isolate concurrent transactions.
    let cancel = CancellationToken::new();
    let consumer = Consumer::new(h.ctx.clone(), "worker_jobs", 1, Duration::from_secs(5));
    let run = tokio::spawn({
        let cancel = cancel.clone();
        async move { consumer.run(cancel).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.status(first) != JobStatus::Processing || h.status(second) != JobStatus::Processing {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("both jobs dispatched");

    cancel.cancel();
    run.await.unwrap().unwrap();

    assert_eq!(h.sent(TRANSFORM_QUEUE).len(), 2);
    assert!(h.broker.is_empty("worker_jobs"));
}
