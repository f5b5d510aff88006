use std::sync::Arc;

use rybridge_bus::Broker;
use rybridge_db::JobStore;
use rybridge_protocol::LookupTables;

use crate::config::ReplyQueues;
use crate::remote::RemoteState;
use crate::resolver::HostResolver;

/// Process-wide collaborators shared by every job.
///
/// Nothing here holds per-message state; each notification opens its own
/// transaction and builds its request from local variables.
pub struct WorkerContext {
    pub store: Arc<dyn JobStore>,
    pub broker: Arc<dyn Broker>,
    pub remote: Arc<dyn RemoteState>,
    pub resolver: Arc<dyn HostResolver>,
    pub tables: Arc<LookupTables>,
    pub queues: ReplyQueues,
}
