//! Observed state: topic metadata fetched from the cluster and cached for one run.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::admin::ClusterAdmin;
use crate::error::Result;
use crate::topic::ObservedTopic;

/// Counts metadata fetches so log lines show which snapshot a decision was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeneration(usize);

impl CacheGeneration {
    pub const START: Self = Self(0);

    pub fn get(&self) -> usize {
        self.0
    }

    fn bump(&mut self) {
        self.0 += 1;
    }
}

/// Cluster topic metadata, fetched lazily and kept until [`invalidate`](Self::invalidate)d.
///
/// A stale cache is never served: after invalidation the next read goes to the cluster.
#[derive(Debug)]
pub struct ClusterState<'a, A: ?Sized> {
    admin: &'a A,
    cached: Option<Vec<ObservedTopic>>,
    generation: CacheGeneration,
}

impl<'a, A> ClusterState<'a, A>
where
    A: ClusterAdmin + ?Sized,
{
    pub fn new(admin: &'a A) -> Self {
        Self {
            admin,
            cached: None,
            generation: CacheGeneration::START,
        }
    }

    /// All topics on the cluster, fetching them if the cache is empty.
    pub async fn observed_topics(&mut self) -> Result<&[ObservedTopic]> {
        if self.cached.is_none() {
            let topics = self.admin.cluster_info().await?;
            self.generation.bump();
            info!(
                topics = topics.len(),
                generation = self.generation.get(),
                "fetched cluster metadata",
            );
            self.cached = Some(topics);
        }

        Ok(self.cached.as_deref().unwrap_or_default())
    }

    pub async fn observed_names(&mut self) -> Result<HashSet<String>> {
        Ok(self
            .observed_topics()
            .await?
            .iter()
            .map(|t| t.name.clone())
            .collect())
    }

    /// Partition count by topic name.
    pub async fn observed_partitions(&mut self) -> Result<HashMap<String, i32>> {
        Ok(self
            .observed_topics()
            .await?
            .iter()
            .map(|t| (t.name.clone(), t.partition_count))
            .collect())
    }

    /// Drop the cached metadata so the next read refetches it.
    pub fn invalidate(&mut self, reason: &'static str) {
        match self.cached.take() {
            Some(_) => info!(
                reason,
                generation = self.generation.get(),
                "invalidating cached cluster metadata",
            ),
            None => debug!(reason, "cluster metadata cache already empty"),
        }
    }

    /// Generation of the last fetch, [`CacheGeneration::START`] before the first one.
    pub fn generation(&self) -> CacheGeneration {
        self.generation
    }
}
