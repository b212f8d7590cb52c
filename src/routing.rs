//! Routing configuration: the consumer groups and topics an application declares.
//!
//! The configuration is an explicit value. It is loaded from TOML and handed to
//! [`DesiredTopics`](crate::desired::DesiredTopics), nothing is looked up from global state.
//!
//! ```toml
//! [kafka]
//! bootstrap_brokers = ["localhost:9092"]
//!
//! [[consumer_groups]]
//! name = "orders"
//!
//! [[consumer_groups.topics]]
//! name = "orders_states"
//! partitions = 6
//! replication_factor = 3
//! [consumer_groups.topics.config]
//! "cleanup.policy" = "compact"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::topic::TopicDefinition;

/// Default admin request timeout.
pub const DEFAULT_TIMEOUT_MS: i32 = 5_000;

/// Default client ID used when connecting to the cluster.
pub const DEFAULT_CLIENT_ID: &str = "rskafka-topics";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Cluster connection settings.
    #[serde(default)]
    pub kafka: KafkaConfig,

    /// Declared consumer groups and their topics.
    #[serde(flatten)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KafkaConfig {
    /// Brokers used to bootstrap the admin connection.
    #[serde(default)]
    pub bootstrap_brokers: Vec<String>,

    /// Client ID reported to the brokers.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// How long the broker may take to complete an admin request.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            bootstrap_brokers: vec![],
            client_id: default_client_id(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub consumer_groups: Vec<ConsumerGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerGroup {
    pub name: String,

    #[serde(default)]
    pub topics: Vec<RoutingTopic>,
}

/// A topic declaration inside a consumer group.
///
/// Unknown keys are rejected: a misspelled `partitions` must not fall back to the default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingTopic {
    pub name: String,

    /// Topics with `active = false` are not managed.
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default = "default_partitions")]
    pub partitions: i32,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: i16,

    /// Broker topic configs. Non-string TOML values are rendered to their string form.
    #[serde(default, deserialize_with = "deserialize_topic_config")]
    pub config: BTreeMap<String, String>,
}

impl RoutingTopic {
    pub fn definition(&self) -> TopicDefinition {
        TopicDefinition {
            name: self.name.clone(),
            partitions: self.partitions,
            replication_factor: self.replication_factor,
            config: self.config.clone(),
            active: self.active,
        }
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    /// Replace the bootstrap brokers, e.g. from `KAFKA_CONNECT` or the command line.
    ///
    /// `brokers` is a comma separated list; empty entries are dropped.
    pub fn override_brokers(&mut self, brokers: &str) {
        self.kafka.bootstrap_brokers = brokers
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }

    fn validate(&self) -> Result<()> {
        if self.kafka.timeout_ms <= 0 {
            return Err(Error::InvalidConfig(format!(
                "timeout_ms must be positive, got {}",
                self.kafka.timeout_ms
            )));
        }

        self.routing.validate()
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl KafkaConfig {
    /// Bootstrap brokers, failing when none are configured.
    pub fn brokers(&self) -> Result<&[String]> {
        if self.bootstrap_brokers.is_empty() {
            return Err(Error::InvalidConfig(
                "no bootstrap brokers configured".to_string(),
            ));
        }

        Ok(&self.bootstrap_brokers)
    }
}

impl RoutingConfig {
    /// Iterate all `(consumer group, topic)` declarations in declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = (&ConsumerGroup, &RoutingTopic)> {
        self.consumer_groups
            .iter()
            .flat_map(|group| group.topics.iter().map(move |topic| (group, topic)))
    }

    pub fn validate(&self) -> Result<()> {
        for (group, topic) in self.declarations() {
            if topic.name.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "consumer group \"{}\" declares a topic with an empty name",
                    group.name
                )));
            }

            if topic.partitions < 1 {
                return Err(Error::InvalidConfig(format!(
                    "topic \"{}\" in consumer group \"{}\" must have at least 1 partition, got {}",
                    topic.name, group.name, topic.partitions
                )));
            }

            if topic.replication_factor < 1 {
                return Err(Error::InvalidConfig(format!(
                    "topic \"{}\" in consumer group \"{}\" must have a replication factor \
                     of at least 1, got {}",
                    topic.name, group.name, topic.replication_factor
                )));
            }
        }

        Ok(())
    }
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

fn default_timeout_ms() -> i32 {
    DEFAULT_TIMEOUT_MS
}

fn default_active() -> bool {
    true
}

fn default_partitions() -> i32 {
    1
}

fn default_replication_factor() -> i16 {
    1
}

fn deserialize_topic_config<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, toml::Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
