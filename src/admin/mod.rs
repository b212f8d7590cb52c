//! The cluster admin interface the reconciler drives.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::topic::ObservedTopic;

pub mod memory;
#[cfg(feature = "transport-rdkafka")]
pub mod rdkafka;

/// Cluster-wide topic administration.
///
/// Implementations report any failure (transport, auth, broker-side rejection) as
/// [`Error::Admin`](crate::error::Error::Admin). Callers do not retry.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Create a topic.
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
        config: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Delete a topic.
    async fn delete_topic(&self, name: &str) -> Result<()>;

    /// Grow a topic to `new_total` partitions.
    async fn create_partitions(&self, name: &str, new_total: i32) -> Result<()>;

    /// All topics of the cluster, internal topics excluded.
    async fn cluster_info(&self) -> Result<Vec<ObservedTopic>>;
}

#[async_trait]
impl<T> ClusterAdmin for &T
where
    T: ClusterAdmin + ?Sized,
{
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
        config: &BTreeMap<String, String>,
    ) -> Result<()> {
        (**self)
            .create_topic(name, num_partitions, replication_factor, config)
            .await
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        (**self).delete_topic(name).await
    }

    async fn create_partitions(&self, name: &str, new_total: i32) -> Result<()> {
        (**self).create_partitions(name, new_total).await
    }

    async fn cluster_info(&self) -> Result<Vec<ObservedTopic>> {
        (**self).cluster_info().await
    }
}
