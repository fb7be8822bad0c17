use crate::config::Config;
use crate::error::ProbeError;
use crate::models::{ClusterStatus, NodeStatus};
use async_trait::async_trait;
use futures::future::join_all;
use redis::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Liveness check for a single cache node.
///
/// `Ok(true)` for a healthy reply, `Ok(false)` for an unexpected one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeProbe: Send + Sync {
    async fn ping(&self, node: &str) -> Result<bool, ProbeError>;
}

/// Sends `PING` over a fresh connection and expects `PONG`.
#[derive(Debug, Clone)]
pub struct RedisPing {
    read_timeout: Duration,
}

impl RedisPing {
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

#[async_trait]
impl NodeProbe for RedisPing {
    async fn ping(&self, node: &str) -> Result<bool, ProbeError> {
        let client = Client::open(node)?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let reply = tokio::time::timeout(
            self.read_timeout,
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| ProbeError::Timeout(self.read_timeout.as_millis()))??;

        Ok(reply.eq_ignore_ascii_case("PONG"))
    }
}

/// # Cluster Health Monitor
///
/// Probes every configured cache node on each call and reports:
/// - a per-node status map, so failed nodes are always visible
/// - whether enough nodes are up to meet the quorum
///
/// Nodes are probed concurrently, each under its own deadline, so one
/// dead node delays nobody else. Nothing is cached between calls.
pub struct ClusterHealthMonitor {
    nodes: Vec<String>,
    quorum: usize,
    timeout: Duration,
    probe: Arc<dyn NodeProbe>,
}

impl ClusterHealthMonitor {
    pub fn new(
        nodes: Vec<String>,
        quorum: usize,
        timeout: Duration,
        probe: Arc<dyn NodeProbe>,
    ) -> Self {
        Self {
            nodes,
            quorum,
            timeout,
            probe,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.redis_nodes.clone(),
            config.redis_quorum,
            config.redis_op_timeout(),
            Arc::new(RedisPing::new(config.redis_read_timeout)),
        )
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn required_quorum(&self) -> usize {
        self.quorum
    }

    async fn check_node(&self, node: &str) -> NodeStatus {
        match tokio::time::timeout(self.timeout, self.probe.ping(node)).await {
            Ok(Ok(true)) => NodeStatus::Connected,
            Ok(Ok(false)) => {
                warn!(node, "cache node gave an unexpected PING reply");
                NodeStatus::Disconnected
            }
            Ok(Err(e)) => {
                warn!(node, error = %e, "cache node probe failed");
                NodeStatus::Error(e.to_string())
            }
            Err(_) => {
                let e = ProbeError::Timeout(self.timeout.as_millis());
                warn!(node, error = %e, "cache node probe failed");
                NodeStatus::Error(e.to_string())
            }
        }
    }

    pub async fn cluster_status(&self) -> ClusterStatus {
        let checks = self.nodes.iter().map(|node| async move {
            let status = self.check_node(node).await;
            (node.clone(), status)
        });

        ClusterStatus::new(join_all(checks).await, self.quorum)
    }

    /// `true` when at least `required_quorum` nodes answered.
    pub async fn is_connected(&self) -> bool {
        self.cluster_status().await.has_quorum()
    }
}
