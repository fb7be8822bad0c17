use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Liveness verdict for one cache node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStatus {
    Connected,
    /// The node answered, but not with a PONG.
    Disconnected,
    /// The probe itself failed; the detail is kept for diagnostics.
    Error(String),
}

impl NodeStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("connected"),
            Self::Disconnected => f.write_str("disconnected"),
            Self::Error(detail) => write!(f, "error: {}", detail),
        }
    }
}

impl Serialize for NodeStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// # Cluster Status
///
/// Node address → status, in the configured node order. Built fresh by
/// every health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStatus {
    #[serde(serialize_with = "serialize_nodes")]
    nodes: Vec<(String, NodeStatus)>,
    required_quorum: usize,
    checked_at: DateTime<Utc>,
}

impl ClusterStatus {
    pub fn new(nodes: Vec<(String, NodeStatus)>, required_quorum: usize) -> Self {
        Self {
            nodes,
            required_quorum,
            checked_at: Utc::now(),
        }
    }

    pub fn nodes(&self) -> &[(String, NodeStatus)] {
        &self.nodes
    }

    pub fn get(&self, node: &str) -> Option<&NodeStatus> {
        self.nodes
            .iter()
            .find(|(address, _)| address == node)
            .map(|(_, status)| status)
    }

    pub fn connected_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|(_, status)| status.is_connected())
            .count()
    }

    pub fn required_quorum(&self) -> usize {
        self.required_quorum
    }

    pub fn has_quorum(&self) -> bool {
        self.connected_count() >= self.required_quorum
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }
}

fn serialize_nodes<S: Serializer>(
    nodes: &[(String, NodeStatus)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(nodes.len()))?;
    for (address, status) in nodes {
        map.serialize_entry(address, status)?;
    }
    map.end()
}
