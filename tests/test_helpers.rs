#![allow(dead_code)]

use std::sync::Once;

use rskafka_topics::routing::{ConsumerGroup, RoutingConfig, RoutingTopic};
use tracing_subscriber::EnvFilter;

/// Get the testing Kafka connection string or return current scope.
///
/// If `TEST_INTEGRATION` and `KAFKA_CONNECT` are set, return the Kafka connection URL to the
/// caller.
///
/// If `TEST_INTEGRATION` is set but `KAFKA_CONNECT` is not set, fail the tests and provide
/// guidance for setting `KAFKA_CONNECT`.
///
/// If `TEST_INTEGRATION` is not set, skip the calling test by returning early.
#[macro_export]
macro_rules! maybe_skip_kafka_integration {
    () => {{
        use std::env;
        dotenvy::dotenv().ok();

        match (
            env::var("TEST_INTEGRATION").is_ok(),
            env::var("KAFKA_CONNECT").ok(),
        ) {
            (true, Some(kafka_connection)) => kafka_connection,
            (true, None) => {
                panic!(
                    "TEST_INTEGRATION is set which requires running integration tests, but \
                    KAFKA_CONNECT is not set. Please run Kafka, perhaps by using the command \
                    `docker-compose up kafka`, then set KAFKA_CONNECT to the host and port where \
                    Kafka is accessible. If running the `docker-compose` command and the Rust \
                    tests on the host, the value for `KAFKA_CONNECT` should be `localhost:9093`. \
                    If running the Rust tests in another container in the `docker-compose` \
                    network as on CI, `KAFKA_CONNECT` should be `kafka:9092`."
                )
            }
            (false, Some(_)) => {
                eprintln!("skipping Kafka integration tests - set TEST_INTEGRATION to run");
                return;
            }
            (false, None) => {
                eprintln!(
                    "skipping Kafka integration tests - set TEST_INTEGRATION and KAFKA_CONNECT to \
                    run"
                );
                return;
            }
        }
    }};
}

static LOG_SETUP: Once = Once::new();

/// Enables debug logging if the `RUST_LOG` environment variable is
/// set. Does nothing if `RUST_LOG` is not set.
pub fn maybe_start_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        start_logging()
    }
}

/// Start logging.
pub fn start_logging() {
    // Set up the logging infrastructure (so we can see the panics)
    LOG_SETUP.call_once(|| {
        tracing_log::LogTracer::init().expect("tracing logger");

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .finish();

        tracing::subscriber::set_global_default(subscriber).expect("tracing subscriber");
    });
}

/// Random topic name with the given prefix.
pub fn random_topic_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4())
}

/// Routing with a single consumer group declaring `topics` as `(name, partitions)`.
pub fn routing(topics: &[(&str, i32)]) -> RoutingConfig {
    RoutingConfig {
        consumer_groups: vec![ConsumerGroup {
            name: "app".to_string(),
            topics: topics
                .iter()
                .map(|(name, partitions)| RoutingTopic {
                    name: name.to_string(),
                    active: true,
                    partitions: *partitions,
                    replication_factor: 1,
                    config: Default::default(),
                })
                .collect(),
        }],
    }
}
