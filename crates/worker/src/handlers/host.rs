use std::net::IpAddr;

use async_trait::async_trait;
use rybridge_core::payload::{HostCreateData, HostDeleteData, HostUpdateData};
use rybridge_db::JobTx;
use rybridge_protocol::request::{HostAddRem, HostCreateRequest, HostDeleteRequest, HostUpdateRequest};
use rybridge_protocol::RyRequest;
use tracing::Span;

use super::{tld_flag, BuildOutcome, JobHandler, HOST_IP_REQUIRED_NON_AUTH, IPV6_SUPPORT};
use crate::config::ReplyQueues;
use crate::context::WorkerContext;
use crate::error::HandlerError;

pub struct HostCreate;
pub struct HostUpdate;
pub struct HostDelete;

/// Canonical form used to compare addresses; unparseable input is
/// compared case-insensitively as text.
fn normalize(addr: &str) -> String {
    match addr.trim().parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => addr.trim().to_ascii_lowercase(),
    }
}

/// Entries of `from` missing in `other`, deduplicated, in input order.
fn missing_from(from: &[String], other: &[String]) -> Vec<String> {
    let other: Vec<String> = other.iter().map(|a| normalize(a)).collect();
    let mut out: Vec<String> = Vec::new();
    for addr in from {
        let key = normalize(addr);
        if !other.contains(&key) && !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

/// Add/rem blocks turning `current` into `desired`. Empty blocks are `None`.
pub fn address_diff(
    desired: &[String],
    current: &[String],
) -> (Option<HostAddRem>, Option<HostAddRem>) {
    let block = |addresses: Vec<String>| (!addresses.is_empty()).then_some(HostAddRem { addresses });
    (
        block(missing_from(desired, current)),
        block(missing_from(current, desired)),
    )
}

#[async_trait]
impl JobHandler for HostCreate {
    type Payload = HostCreateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.host
    }

    async fn build(
        &self,
        ctx: &WorkerContext,
        span: &Span,
        tx: &mut dyn JobTx,
        data: HostCreateData,
    ) -> Result<BuildOutcome, HandlerError> {
        if data.host_accreditation.same_identity(&data.accreditation) {
            return Ok(BuildOutcome::dispatch(
                &data.accreditation,
                RyRequest::HostCreate(HostCreateRequest {
                    name: data.host_name,
                    addresses: data.addrs,
                }),
            ));
        }

        // Host lives under another accreditation: its glue is not ours to set.
        let tld_id = data.accreditation_tld.accreditation_tld_id;
        let mut addresses = Vec::new();
        if tld_flag(tx, tld_id, HOST_IP_REQUIRED_NON_AUTH, false).await? {
            let ipv6 = tld_flag(tx, tld_id, IPV6_SUPPORT, false).await?;
            let resolved = ctx
                .resolver
                .resolve(&data.host_name)
                .await
                .map_err(|e| HandlerError::Resolve {
                    host: data.host_name.clone(),
                    reason: e.to_string(),
                })?;
            addresses = resolved
                .into_iter()
                .filter(|ip| ipv6 || ip.is_ipv4())
                .map(|ip| ip.to_string())
                .collect();
            if addresses.is_empty() {
                return Err(HandlerError::validation(format!(
                    "no usable address found for {}",
                    data.host_name
                )));
            }
            tracing::info!(
                parent: span,
                host = %data.host_name,
                addresses = ?addresses,
                "Resolved addresses for non-authoritative host",
            );
        }

        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::HostCreate(HostCreateRequest {
                name: data.host_name,
                addresses,
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for HostUpdate {
    type Payload = HostUpdateData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.host
    }

    async fn build(
        &self,
        ctx: &WorkerContext,
        span: &Span,
        _tx: &mut dyn JobTx,
        data: HostUpdateData,
    ) -> Result<BuildOutcome, HandlerError> {
        let current = ctx
            .remote
            .host_info(&data.accreditation, &data.host_name)
            .await?;
        let (add, rem) = address_diff(&data.addrs, &current.addresses);
        if add.is_none() && rem.is_none() {
            tracing::info!(parent: span, host = %data.host_name, "Host addresses already match");
            return Ok(BuildOutcome::complete("Host addresses already match, no changes"));
        }

        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::HostUpdate(HostUpdateRequest {
                name: data.host_name,
                add,
                rem,
            }),
        ))
    }
}

#[async_trait]
impl JobHandler for HostDelete {
    type Payload = HostDeleteData;

    fn reply_queue(queues: &ReplyQueues) -> &str {
        &queues.host
    }

    async fn build(
        &self,
        _ctx: &WorkerContext,
        _span: &Span,
        _tx: &mut dyn JobTx,
        data: HostDeleteData,
    ) -> Result<BuildOutcome, HandlerError> {
        Ok(BuildOutcome::dispatch(
            &data.accreditation,
            RyRequest::HostDelete(HostDeleteRequest {
                name: data.host_name,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_adds_and_removes() {
        let (add, rem) = address_diff(
            &strings(&["192.0.2.1", "192.0.2.3"]),
            &strings(&["192.0.2.1", "192.0.2.2"]),
        );
        assert_eq!(add.unwrap().addresses, ["192.0.2.3"]);
        assert_eq!(rem.unwrap().addresses, ["192.0.2.2"]);
    }

    #[test]
    fn ipv6_spellings_compare_equal() {
        let (add, rem) = address_diff(
            &strings(&["2001:db8::1"]),
            &strings(&["2001:0DB8:0:0:0:0:0:1"]),
        );
        assert!(add.is_none());
        assert!(rem.is_none());
    }

    #[test]
    fn duplicates_collapse() {
        let (add, rem) = address_diff(&strings(&["192.0.2.9", "192.0.2.9"]), &[]);
        assert_eq!(add.unwrap().addresses, ["192.0.2.9"]);
        assert!(rem.is_none());
    }
}
