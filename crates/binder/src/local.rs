//! In-process loopback transport.
//!
//! Frames go straight into a `Node`, each on its own task so a timed-out
//! caller only stops waiting. Size limits and the call timeout still apply.

use std::sync::Arc;

use transact::ObjectId;

use crate::config::Config;
use crate::node::Node;
use crate::transport::Result;
use crate::transport::Transport;
use crate::transport::TransportError;

pub struct LocalTransport {
    node: Arc<Node>,
    config: Config,
}

impl LocalTransport {
    /// Connects to `node` using the node's own limits.
    pub fn new(node: Arc<Node>) -> Self {
        let config = *node.config();
        Self { node, config }
    }

    pub fn with_config(node: Arc<Node>, config: Config) -> Self {
        Self { node, config }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn transact(&self, target: ObjectId, frame: Vec<u8>) -> Result<Vec<u8>> {
        let max = self.config.max_transaction_len;
        if frame.len() > max {
            return Err(TransportError::PayloadTooLarge { len: frame.len(), max });
        }

        // Runs detached: a caller that stops waiting never cancels the service.
        let node = self.node.clone();
        let call = tokio::spawn(async move { node.transact(target, &frame).await });

        let joined = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| TransportError::Timeout)?,
            None => call.await,
        };
        joined.map_err(|e| TransportError::ConnectionLost(format!("transaction task failed: {}", e)))
    }

    fn release(&self, target: ObjectId) {
        self.node.release(target);
    }
}
