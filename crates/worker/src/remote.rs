//! Synchronous registry lookups over the asynchronous broker.
//!
//! A lookup sends an info request to the accreditation's query queue and
//! waits, bounded by a timeout, for the reply correlated with the request's
//! message id. Results are never cached across messages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rybridge_bus::{Broker, BusError};
use rybridge_core::Accreditation;
use rybridge_protocol::request::{DomainInfoRequest, HostInfoRequest};
use rybridge_protocol::{DomainInfoResponse, HostInfoResponse, RyRequest, RyResponse};
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Call failed: {0}")]
    Transport(#[from] BusError),

    #[error("Registry returned {code}: {message}")]
    Registry { code: i32, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RemoteState: Send + Sync {
    async fn domain_info(
        &self,
        accreditation: &Accreditation,
        name: &str,
    ) -> Result<DomainInfoResponse, RemoteError>;

    async fn host_info(
        &self,
        accreditation: &Accreditation,
        name: &str,
    ) -> Result<HostInfoResponse, RemoteError>;
}

pub struct BrokerRemoteState {
    broker: Arc<dyn Broker>,
    timeout: Duration,
}

impl BrokerRemoteState {
    pub fn new(broker: Arc<dyn Broker>, timeout: Duration) -> Self {
        Self { broker, timeout }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        accreditation: &Accreditation,
        request: RyRequest,
    ) -> Result<T, RemoteError> {
        let queue = accreditation.queue(request.queue_kind());
        let body = serde_json::to_value(&request).map_err(BusError::from)?;
        let reply = self.broker.call(&queue, body, self.timeout).await?;

        let response: RyResponse<T> = reply
            .decode()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        if !response.registry_response.is_success {
            return Err(RemoteError::Registry {
                code: response.registry_response.epp_code,
                message: response.registry_response.epp_message,
            });
        }
        response
            .data
            .ok_or_else(|| RemoteError::Malformed("successful response without data".into()))
    }
}

#[async_trait]
impl RemoteState for BrokerRemoteState {
    async fn domain_info(
        &self,
        accreditation: &Accreditation,
        name: &str,
    ) -> Result<DomainInfoResponse, RemoteError> {
        let request = RyRequest::DomainInfo(DomainInfoRequest {
            name: name.to_string(),
        });
        self.call(accreditation, request).await
    }

    async fn host_info(
        &self,
        accreditation: &Accreditation,
        name: &str,
    ) -> Result<HostInfoResponse, RemoteError> {
        let request = RyRequest::HostInfo(HostInfoRequest {
            name: name.to_string(),
        });
        self.call(accreditation, request).await
    }
}
