//! In-process cluster model.
//!
//! Validates requests the way a broker does (duplicate creation, unknown topics, partition
//! shrinking, replication above the broker count) and records every mutating request so
//! callers can inspect exactly what was sent.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use super::ClusterAdmin;
use crate::error::{Error, RequestContext, Result};
use crate::topic::ObservedTopic;

/// Default number of brokers in a [`MemoryAdmin`] cluster.
pub const DEFAULT_BROKERS: i16 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Topic '{0}' already exists")]
    TopicAlreadyExists(String),

    #[error("Topic '{0}' does not exist")]
    UnknownTopic(String),

    #[error(
        "Topic currently has {current} partitions, which is higher than the requested {requested}"
    )]
    InvalidPartitions { current: i32, requested: i32 },

    #[error("Replication factor {requested} is larger than the number of brokers {brokers}")]
    InvalidReplicationFactor { requested: i16, brokers: i16 },

    #[error("Request for topic '{0}' rejected by policy")]
    PolicyViolation(String),

    #[error("Cluster unavailable")]
    Unavailable,
}

/// A mutating request received by a [`MemoryAdmin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    CreateTopic {
        name: String,
        num_partitions: i32,
        replication_factor: i16,
        config: BTreeMap<String, String>,
    },
    DeleteTopic {
        name: String,
    },
    CreatePartitions {
        name: String,
        new_total: i32,
    },
}

#[derive(Debug, Clone)]
struct TopicState {
    partitions: i32,
    replication_factor: i16,
    config: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    topics: BTreeMap<String, TopicState>,
    calls: Vec<AdminCall>,
    metadata_requests: usize,
    rejected: HashSet<String>,
    unavailable: bool,
}

#[derive(Debug)]
pub struct MemoryAdmin {
    brokers: i16,
    state: Mutex<State>,
}

impl Default for MemoryAdmin {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self::with_brokers(DEFAULT_BROKERS)
    }

    pub fn with_brokers(brokers: i16) -> Self {
        Self {
            brokers,
            state: Mutex::new(State::default()),
        }
    }

    /// Seed an existing topic without recording a call.
    pub fn with_topic(self, name: impl Into<String>, partitions: i32) -> Self {
        self.state.lock().topics.insert(
            name.into(),
            TopicState {
                partitions,
                replication_factor: 1,
                config: BTreeMap::new(),
            },
        );
        self
    }

    /// Reject every mutating request for `name`.
    pub fn reject_topic(&self, name: impl Into<String>) {
        self.state.lock().rejected.insert(name.into());
    }

    /// Undo [`reject_topic`](Self::reject_topic).
    pub fn accept_topic(&self, name: &str) {
        self.state.lock().rejected.remove(name);
    }

    /// Make every request, including metadata, fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Mutating requests received so far, in order.
    pub fn calls(&self) -> Vec<AdminCall> {
        self.state.lock().calls.clone()
    }

    /// Number of [`ClusterAdmin::cluster_info`] requests served.
    pub fn metadata_requests(&self) -> usize {
        self.state.lock().metadata_requests
    }

    /// Current partition count of `name`, if it exists.
    pub fn partitions(&self, name: &str) -> Option<i32> {
        self.state.lock().topics.get(name).map(|t| t.partitions)
    }

    /// Current replication factor and configs of `name`, if it exists.
    pub fn topic_settings(&self, name: &str) -> Option<(i16, BTreeMap<String, String>)> {
        self.state
            .lock()
            .topics
            .get(name)
            .map(|t| (t.replication_factor, t.config.clone()))
    }
}

impl State {
    fn check(&self, name: &str) -> Result<(), ClusterError> {
        if self.unavailable {
            return Err(ClusterError::Unavailable);
        }
        if self.rejected.contains(name) {
            return Err(ClusterError::PolicyViolation(name.to_string()));
        }
        Ok(())
    }
}

fn topic_error(request: &'static str, name: &str, e: ClusterError) -> Error {
    Error::admin(request, RequestContext::Topic(name.to_string()), e)
}

#[async_trait]
impl ClusterAdmin for MemoryAdmin {
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
        config: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::CreateTopic {
            name: name.to_string(),
            num_partitions,
            replication_factor,
            config: config.clone(),
        });

        let request = "create_topic";
        state.check(name).map_err(|e| topic_error(request, name, e))?;

        if state.topics.contains_key(name) {
            return Err(topic_error(
                request,
                name,
                ClusterError::TopicAlreadyExists(name.to_string()),
            ));
        }
        if num_partitions < 1 {
            return Err(topic_error(
                request,
                name,
                ClusterError::InvalidPartitions {
                    current: 0,
                    requested: num_partitions,
                },
            ));
        }
        if replication_factor < 1 || replication_factor > self.brokers {
            return Err(topic_error(
                request,
                name,
                ClusterError::InvalidReplicationFactor {
                    requested: replication_factor,
                    brokers: self.brokers,
                },
            ));
        }

        debug!(topic = name, num_partitions, replication_factor, "topic created");
        state.topics.insert(
            name.to_string(),
            TopicState {
                partitions: num_partitions,
                replication_factor,
                config: config.clone(),
            },
        );

        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::DeleteTopic {
            name: name.to_string(),
        });

        let request = "delete_topic";
        state.check(name).map_err(|e| topic_error(request, name, e))?;

        if state.topics.remove(name).is_none() {
            return Err(topic_error(
                request,
                name,
                ClusterError::UnknownTopic(name.to_string()),
            ));
        }

        debug!(topic = name, "topic deleted");
        Ok(())
    }

    async fn create_partitions(&self, name: &str, new_total: i32) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(AdminCall::CreatePartitions {
            name: name.to_string(),
            new_total,
        });

        let request = "create_partitions";
        state.check(name).map_err(|e| topic_error(request, name, e))?;

        let topic = state.topics.get_mut(name).ok_or_else(|| {
            topic_error(request, name, ClusterError::UnknownTopic(name.to_string()))
        })?;

        if new_total <= topic.partitions {
            return Err(topic_error(
                request,
                name,
                ClusterError::InvalidPartitions {
                    current: topic.partitions,
                    requested: new_total,
                },
            ));
        }

        debug!(topic = name, from = topic.partitions, to = new_total, "partitions created");
        topic.partitions = new_total;

        Ok(())
    }

    async fn cluster_info(&self) -> Result<Vec<ObservedTopic>> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(Error::admin(
                "cluster_info",
                RequestContext::Cluster,
                ClusterError::Unavailable,
            ));
        }

        state.metadata_requests += 1;

        Ok(state
            .topics
            .iter()
            .map(|(name, topic)| ObservedTopic::new(name.clone(), topic.partitions))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cluster_error(err: Error) -> ClusterError {
        match err {
            Error::Admin { source, .. } => source
                .downcast_ref::<ClusterError>()
                .cloned()
                .expect("cluster error"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let admin = MemoryAdmin::new().with_topic("b", 2);
        let mut config = BTreeMap::new();
        config.insert("cleanup.policy".to_string(), "compact".to_string());

        admin.create_topic("a", 3, 2, &config).await.unwrap();

        assert_eq!(
            admin.cluster_info().await.unwrap(),
            vec![ObservedTopic::new("a", 3), ObservedTopic::new("b", 2)]
        );
        assert_eq!(admin.topic_settings("a"), Some((2, config.clone())));
        assert_eq!(
            admin.calls(),
            vec![AdminCall::CreateTopic {
                name: "a".to_string(),
                num_partitions: 3,
                replication_factor: 2,
                config,
            }]
        );
        assert_eq!(admin.metadata_requests(), 1);
    }

    #[tokio::test]
    async fn test_create_existing() {
        let admin = MemoryAdmin::new().with_topic("a", 1);
        let err = admin
            .create_topic("a", 1, 1, &BTreeMap::new())
            .await
            .unwrap_err();

        assert_matches!(cluster_error(err), ClusterError::TopicAlreadyExists(name) if name == "a");
    }

    #[tokio::test]
    async fn test_create_replication_above_brokers() {
        let admin = MemoryAdmin::with_brokers(1);
        let err = admin
            .create_topic("a", 1, 3, &BTreeMap::new())
            .await
            .unwrap_err();

        assert_matches!(
            cluster_error(err),
            ClusterError::InvalidReplicationFactor {
                requested: 3,
                brokers: 1
            }
        );
        assert_eq!(admin.partitions("a"), None);
    }

    #[tokio::test]
    async fn test_delete_unknown() {
        let admin = MemoryAdmin::new();
        let err = admin.delete_topic("a").await.unwrap_err();

        assert_matches!(cluster_error(err), ClusterError::UnknownTopic(_));
    }

    #[tokio::test]
    async fn test_create_partitions() {
        let admin = MemoryAdmin::new().with_topic("a", 2);

        admin.create_partitions("a", 5).await.unwrap();
        assert_eq!(admin.partitions("a"), Some(5));

        let err = admin.create_partitions("a", 4).await.unwrap_err();
        assert_matches!(
            cluster_error(err),
            ClusterError::InvalidPartitions {
                current: 5,
                requested: 4
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_topic() {
        let admin = MemoryAdmin::new();
        admin.reject_topic("a");

        let err = admin
            .create_topic("a", 1, 1, &BTreeMap::new())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            Error::Admin {
                request: "create_topic",
                context: RequestContext::Topic(_),
                ..
            }
        );
    }

    #[tokio::test]
    async fn test_unavailable() {
        let admin = MemoryAdmin::new();
        admin.set_unavailable(true);

        let err = admin.cluster_info().await.unwrap_err();
        assert_matches!(
            err,
            Error::Admin {
                context: RequestContext::Cluster,
                ..
            }
        );
        assert_eq!(admin.metadata_requests(), 0);
    }
}
