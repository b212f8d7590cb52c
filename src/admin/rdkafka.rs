//! [`ClusterAdmin`] backed by librdkafka's admin API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{
    AdminClient, AdminOptions, NewPartitions, NewTopic, TopicReplication, TopicResult,
};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use tracing::{debug, info, warn};

use super::ClusterAdmin;
use crate::error::{Error, RequestContext, Result};
use crate::routing::KafkaConfig;
use crate::topic::ObservedTopic;

pub struct RdKafkaAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,

    /// Broker-side operation timeout and client-side metadata timeout.
    timeout: Duration,
}

impl std::fmt::Debug for RdKafkaAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdKafkaAdmin")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RdKafkaAdmin {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let brokers = config.brokers()?.join(",");
        let timeout_ms = u64::try_from(config.timeout_ms).map_err(|_| {
            Error::InvalidConfig(format!("invalid timeout_ms {}", config.timeout_ms))
        })?;

        info!(%brokers, client_id = %config.client_id, "creating admin client");

        let client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("client.id", &config.client_id)
            .create()
            .map_err(|e| Error::admin("connect", RequestContext::Cluster, e))?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    fn options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(self.timeout))
    }
}

/// Each admin request carries exactly one topic, so exactly one result is expected.
fn exactly_one(request: &'static str, name: &str, results: Vec<TopicResult>) -> Result<()> {
    let context = || RequestContext::Topic(name.to_string());

    let mut results = results.into_iter();
    match (results.next(), results.next()) {
        (Some(Ok(_)), None) => Ok(()),
        (Some(Err((_, code))), None) => {
            Err(Error::admin(request, context(), KafkaError::AdminOp(code)))
        }
        (None, _) => Err(Error::admin(request, context(), "no result for topic")),
        (Some(_), Some(_)) => Err(Error::admin(
            request,
            context(),
            "got more than one result for a single topic",
        )),
    }
}

#[async_trait]
impl ClusterAdmin for RdKafkaAdmin {
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
        config: &BTreeMap<String, String>,
    ) -> Result<()> {
        let request = "create_topic";

        let mut topic = NewTopic::new(
            name,
            num_partitions,
            TopicReplication::Fixed(i32::from(replication_factor)),
        );
        for (key, value) in config {
            topic = topic.set(key, value);
        }

        let results = self
            .client
            .create_topics([&topic], &self.options())
            .await
            .map_err(|e| Error::admin(request, RequestContext::Topic(name.to_string()), e))?;

        exactly_one(request, name, results)
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        let request = "delete_topic";

        let results = self
            .client
            .delete_topics(&[name], &self.options())
            .await
            .map_err(|e| Error::admin(request, RequestContext::Topic(name.to_string()), e))?;

        exactly_one(request, name, results)
    }

    async fn create_partitions(&self, name: &str, new_total: i32) -> Result<()> {
        let request = "create_partitions";
        let context = || RequestContext::Topic(name.to_string());

        let count = usize::try_from(new_total).map_err(|e| Error::admin(request, context(), e))?;
        let partitions = NewPartitions::new(name, count);

        let results = self
            .client
            .create_partitions([&partitions], &self.options())
            .await
            .map_err(|e| Error::admin(request, context(), e))?;

        exactly_one(request, name, results)
    }

    async fn cluster_info(&self) -> Result<Vec<ObservedTopic>> {
        let request = "cluster_info";
        let client = Arc::clone(&self.client);
        let timeout = self.timeout;

        // librdkafka blocks the calling thread until the metadata arrives
        let metadata = tokio::task::spawn_blocking(move || {
            client.inner().fetch_metadata(None, timeout)
        })
        .await
        .map_err(|e| Error::admin(request, RequestContext::Cluster, e))?
        .map_err(|e| Error::admin(request, RequestContext::Cluster, e))?;

        let mut topics = Vec::with_capacity(metadata.topics().len());
        for topic in metadata.topics() {
            if topic.name().starts_with("__") {
                continue;
            }

            if let Some(err) = topic.error() {
                warn!(
                    topic = topic.name(),
                    error = %RDKafkaErrorCode::from(err),
                    "topic metadata reports an error, ignoring topic",
                );
                continue;
            }

            let partition_count = i32::try_from(topic.partitions().len())
                .map_err(|e| Error::admin(request, RequestContext::Cluster, e))?;
            topics.push(ObservedTopic::new(topic.name(), partition_count));
        }

        debug!(topics = topics.len(), "metadata received");
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_exactly_one() {
        exactly_one("create_topic", "a", vec![Ok("a".to_string())]).unwrap();

        assert_matches!(
            exactly_one(
                "create_topic",
                "a",
                vec![Err(("a".to_string(), RDKafkaErrorCode::TopicAlreadyExists))]
            ),
            Err(Error::Admin {
                request: "create_topic",
                context: RequestContext::Topic(_),
                ..
            })
        );
        assert_matches!(
            exactly_one("delete_topic", "a", vec![]),
            Err(Error::Admin { .. })
        );
        assert_matches!(
            exactly_one(
                "delete_topic",
                "a",
                vec![Ok("a".to_string()), Ok("a".to_string())]
            ),
            Err(Error::Admin { .. })
        );
    }

    #[test]
    fn test_requires_brokers() {
        assert_matches!(
            RdKafkaAdmin::new(&KafkaConfig::default()),
            Err(Error::InvalidConfig(_))
        );
    }
}
