//! The reconciliation engine.
//!
//! Every workflow walks the desired topics in declaration order, decides what to do with
//! each of them against the observed cluster state and applies that decision before moving
//! on to the next topic. Nothing is done concurrently and nothing is retried: the first
//! failing admin request aborts the workflow. Re-running `create` or `repartition` after a
//! partial failure is safe because decisions are recomputed from fresh metadata.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::ops::AddAssign;

use tracing::{debug, info};

use crate::admin::ClusterAdmin;
use crate::cluster::ClusterState;
use crate::desired::DesiredTopics;
use crate::error::Result;
use crate::report::{Event, Reporter};
use crate::routing::RoutingConfig;
use crate::topic::TopicDefinition;

/// Why a topic was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyExists,
    DoesNotExist,
    /// The topic already has this many partitions, at least as many as declared.
    EnoughPartitions(i32),
}

/// What to do with one topic in one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Create,
    Delete,
    /// Add `by` partitions, bringing the topic to `to` in total.
    Grow { by: i32, to: i32 },
    Skip(SkipReason),
}

pub fn decide_create(topic: &TopicDefinition, observed: &HashSet<String>) -> Decision {
    if observed.contains(&topic.name) {
        Decision::Skip(SkipReason::AlreadyExists)
    } else {
        Decision::Create
    }
}

pub fn decide_delete(topic: &TopicDefinition, observed: &HashSet<String>) -> Decision {
    if observed.contains(&topic.name) {
        Decision::Delete
    } else {
        Decision::Skip(SkipReason::DoesNotExist)
    }
}

/// Partitions only ever grow. A topic with more partitions than declared is skipped, a
/// missing topic is never created.
pub fn decide_repartition(topic: &TopicDefinition, observed: &HashMap<String, i32>) -> Decision {
    match observed.get(&topic.name) {
        None => Decision::Skip(SkipReason::DoesNotExist),
        Some(&current) if current < topic.partitions => Decision::Grow {
            by: topic.partitions - current,
            to: topic.partitions,
        },
        Some(&current) => Decision::Skip(SkipReason::EnoughPartitions(current)),
    }
}

/// Outcome counts of a workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub deleted: usize,
    /// Topics that received additional partitions.
    pub grown: usize,
    /// Partitions added across all grown topics.
    pub partitions_added: i32,
    pub skipped: usize,
}

impl Summary {
    /// Number of mutating admin requests issued.
    pub fn changes(&self) -> usize {
        self.created + self.deleted + self.grown
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, rhs: Self) {
        self.created += rhs.created;
        self.deleted += rhs.deleted;
        self.grown += rhs.grown;
        self.partitions_added += rhs.partitions_added;
        self.skipped += rhs.skipped;
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} deleted, {} partitions added to {} topics, {} skipped",
            self.created, self.deleted, self.partitions_added, self.grown, self.skipped
        )
    }
}

/// One command invocation.
///
/// Owns the desired-state collector and the cluster metadata cache for exactly one run;
/// build a new `Reconciler` per command so no metadata outlives it.
#[derive(Debug)]
pub struct Reconciler<'a, A: ?Sized, R> {
    admin: &'a A,
    desired: DesiredTopics<'a>,
    cluster: ClusterState<'a, A>,
    reporter: R,
}

impl<'a, A, R> Reconciler<'a, A, R>
where
    A: ClusterAdmin + ?Sized,
    R: Reporter,
{
    pub fn new(routing: &'a RoutingConfig, admin: &'a A, reporter: R) -> Self {
        Self {
            admin,
            desired: DesiredTopics::new(routing),
            cluster: ClusterState::new(admin),
            reporter,
        }
    }

    /// Create declared topics that do not exist yet. Existing topics are not touched.
    pub async fn create(&mut self) -> Result<Summary> {
        let desired = self.desired.collect();
        if desired.is_empty() {
            debug!("no topics declared, create skips the cluster");
            return Ok(Summary::default());
        }
        let observed = self.cluster.observed_names().await?;

        let mut summary = Summary::default();
        for topic in desired {
            let decision = decide_create(topic, &observed);
            summary += apply(self.admin, &mut self.reporter, topic, decision).await?;
        }

        Ok(summary)
    }

    /// Delete declared topics that exist. Undeclared topics are not touched.
    pub async fn delete(&mut self) -> Result<Summary> {
        let desired = self.desired.collect();
        if desired.is_empty() {
            debug!("no topics declared, delete skips the cluster");
            return Ok(Summary::default());
        }
        let observed = self.cluster.observed_names().await?;

        let mut summary = Summary::default();
        for topic in desired {
            let decision = decide_delete(topic, &observed);
            summary += apply(self.admin, &mut self.reporter, topic, decision).await?;
        }

        Ok(summary)
    }

    /// Grow existing topics that have fewer partitions than declared.
    pub async fn repartition(&mut self) -> Result<Summary> {
        let desired = self.desired.collect();
        if desired.is_empty() {
            debug!("no topics declared, repartition skips the cluster");
            return Ok(Summary::default());
        }
        let observed = self.cluster.observed_partitions().await?;

        let mut summary = Summary::default();
        for topic in desired {
            let decision = decide_repartition(topic, &observed);
            summary += apply(self.admin, &mut self.reporter, topic, decision).await?;
        }

        Ok(summary)
    }

    /// Delete and re-create all declared topics.
    pub async fn reset(&mut self) -> Result<Summary> {
        let mut summary = self.delete().await?;

        // otherwise `create` sees the topics that were just deleted
        self.cluster.invalidate("reset: topics deleted");

        summary += self.create().await?;
        Ok(summary)
    }

    /// Create missing topics, then grow the existing ones.
    pub async fn migrate(&mut self) -> Result<Summary> {
        let mut summary = self.create().await?;

        self.cluster.invalidate("migrate: topics created");

        summary += self.repartition().await?;
        Ok(summary)
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }
}

async fn apply<A, R>(
    admin: &A,
    reporter: &mut R,
    topic: &TopicDefinition,
    decision: Decision,
) -> Result<Summary>
where
    A: ClusterAdmin + ?Sized,
    R: Reporter,
{
    debug!(topic = %topic.name, ?decision, "reconciling topic");

    let name = &topic.name;
    let mut summary = Summary::default();

    match decision {
        Decision::Create => {
            reporter.report(Event::Creating {
                topic: name.clone(),
            });
            admin
                .create_topic(
                    name,
                    topic.partitions,
                    topic.replication_factor,
                    &topic.config,
                )
                .await?;
            info!(
                topic = %name,
                partitions = topic.partitions,
                replication_factor = topic.replication_factor,
                "created topic",
            );
            reporter.report(Event::Created {
                topic: name.clone(),
            });
            summary.created = 1;
        }
        Decision::Delete => {
            reporter.report(Event::Deleting {
                topic: name.clone(),
            });
            admin.delete_topic(name).await?;
            info!(topic = %name, "deleted topic");
            reporter.report(Event::Deleted {
                topic: name.clone(),
            });
            summary.deleted = 1;
        }
        Decision::Grow { by, to } => {
            reporter.report(Event::Growing {
                topic: name.clone(),
                to,
            });
            admin.create_partitions(name, to).await?;
            info!(topic = %name, added = by, total = to, "created partitions");
            reporter.report(Event::Grown {
                topic: name.clone(),
                by,
            });
            summary.grown = 1;
            summary.partitions_added = by;
        }
        Decision::Skip(reason) => {
            reporter.report(Event::Skipped {
                topic: name.clone(),
                reason,
            });
            summary.skipped = 1;
        }
    }

    Ok(summary)
}
