//! Topic management actions and their dispatch.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tracing::info;

use crate::admin::ClusterAdmin;
use crate::error::{Error, Result};
use crate::reconcile::{Reconciler, Summary};
use crate::report::Reporter;
use crate::routing::RoutingConfig;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Action {
    /// Create declared topics that are missing.
    Create,
    /// Delete declared topics that exist.
    Delete,
    /// Delete, then re-create declared topics.
    Reset,
    /// Grow declared topics to their declared partition count.
    Repartition,
    /// Create missing topics, then repartition.
    Migrate,
}

impl Action {
    pub const ALL: [Self; 5] = [
        Self::Create,
        Self::Delete,
        Self::Reset,
        Self::Repartition,
        Self::Migrate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Reset => "reset",
            Self::Repartition => "repartition",
            Self::Migrate => "migrate",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::InvalidAction(s.to_string()))
    }
}

impl<'a, A, R> Reconciler<'a, A, R>
where
    A: ClusterAdmin + ?Sized,
    R: Reporter,
{
    pub async fn run(&mut self, action: Action) -> Result<Summary> {
        match action {
            Action::Create => self.create().await,
            Action::Delete => self.delete().await,
            Action::Reset => self.reset().await,
            Action::Repartition => self.repartition().await,
            Action::Migrate => self.migrate().await,
        }
    }
}

/// Run `action` in a fresh invocation scope.
///
/// Cluster metadata and the desired topics are collected anew and dropped when the run ends.
pub async fn run<A, R>(
    action: Action,
    routing: &RoutingConfig,
    admin: &A,
    reporter: R,
) -> Result<Summary>
where
    A: ClusterAdmin + ?Sized,
    R: Reporter,
{
    info!(%action, "running topics action");

    let summary = Reconciler::new(routing, admin, reporter).run(action).await?;

    info!(%action, %summary, "topics action finished");
    Ok(summary)
}
