use std::collections::BTreeMap;

/// A topic as declared by the routing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDefinition {
    /// The name of this topic.
    pub name: String,

    /// Number of partitions the topic should have.
    pub partitions: i32,

    /// Number of broker-held copies of each partition.
    pub replication_factor: i16,

    /// Broker topic configs, e.g. `cleanup.policy`.
    pub config: BTreeMap<String, String>,

    /// Whether the topic is under management at all.
    pub active: bool,
}

/// A topic as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedTopic {
    /// The name of this topic.
    pub name: String,

    /// Number of partitions the broker reports.
    pub partition_count: i32,
}

impl ObservedTopic {
    pub fn new(name: impl Into<String>, partition_count: i32) -> Self {
        Self {
            name: name.into(),
            partition_count,
        }
    }
}
