//! Command line surface of `rskafka-topics`.

use std::path::PathBuf;
use std::sync::Once;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::action::{self, Action};
use crate::admin::ClusterAdmin;
use crate::error::Result;
use crate::reconcile::Summary;
use crate::report::Reporter;
use crate::routing::{Config, KafkaConfig};

/// Filter used when `RUST_LOG` is not set. Progress goes to stdout, logs to stderr.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Manage the Kafka topics declared in a routing configuration.
#[derive(Debug, Parser)]
#[command(name = "rskafka-topics", version, about)]
pub struct Args {
    /// Routing configuration file.
    #[arg(short, long, env = "RSKAFKA_TOPICS_CONFIG", default_value = "topics.toml")]
    pub config: PathBuf,

    /// Comma separated bootstrap brokers, overriding the configuration file.
    #[arg(long, env = "KAFKA_CONNECT")]
    pub brokers: Option<String>,

    /// create | delete | reset | repartition | migrate
    pub action: String,
}

impl Args {
    pub fn action(&self) -> Result<Action> {
        self.action.parse()
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::from_path(&self.config)?;
        if let Some(brokers) = &self.brokers {
            config.override_brokers(brokers);
        }
        Ok(config)
    }
}

/// Validate the action, load the configuration, connect and run.
///
/// An unknown action fails before the configuration is read or the cluster is contacted.
pub async fn execute<A, F, R>(args: &Args, connect: F, reporter: R) -> Result<Summary>
where
    A: ClusterAdmin,
    F: FnOnce(&KafkaConfig) -> Result<A> + Send,
    R: Reporter,
{
    let action = args.action()?;
    let config = args.load_config()?;
    let admin = connect(&config.kafka)?;

    action::run(action, &config.routing, &admin, reporter).await
}

static LOG_SETUP: Once = Once::new();

/// Install the global `tracing` subscriber, honoring `RUST_LOG`.
pub fn init_logging() {
    LOG_SETUP.call_once(|| {
        if let Err(e) = tracing_log::LogTracer::init() {
            eprintln!("cannot bridge log records: {e}");
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("cannot install tracing subscriber: {e}");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;
    use crate::admin::memory::MemoryAdmin;
    use crate::error::Error;
    use crate::report::Event;

    fn config_file(contents: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("rskafka-topics-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "rskafka-topics",
            "--config",
            "app.toml",
            "--brokers",
            "a:9092,b:9092",
            "migrate",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("app.toml"));
        assert_eq!(args.brokers.as_deref(), Some("a:9092,b:9092"));
        assert_eq!(args.action().unwrap(), Action::Migrate);
    }

    #[test]
    fn test_action_required() {
        assert!(Args::try_parse_from(["rskafka-topics"]).is_err());
    }

    #[tokio::test]
    async fn test_invalid_action_runs_nothing() {
        let args = Args::try_parse_from([
            "rskafka-topics",
            "--config",
            "/nonexistent.toml",
            "explode",
        ])
        .unwrap();

        let mut connected = false;
        let err = execute(
            &args,
            |_| {
                connected = true;
                Ok(MemoryAdmin::new())
            },
            Vec::<Event>::new(),
        )
        .await
        .unwrap_err();

        assert_matches!(err, Error::InvalidAction(name) if name == "explode");
        assert!(!connected);
    }

    #[tokio::test]
    async fn test_execute() {
        let path = config_file(
            r#"
            [kafka]
            bootstrap_brokers = ["from-file:9092"]

            [[consumer_groups]]
            name = "app"
            [[consumer_groups.topics]]
            name = "x"
            partitions = 3
            "#,
        );
        let args = Args::try_parse_from([
            "rskafka-topics",
            "--config",
            path.to_str().unwrap(),
            "--brokers",
            "from-cli:9092",
            "create",
        ])
        .unwrap();

        let admin = MemoryAdmin::new();
        let mut events: Vec<Event> = vec![];
        let summary = execute(
            &args,
            |kafka| {
                assert_eq!(kafka.bootstrap_brokers, vec!["from-cli:9092".to_string()]);
                Ok(&admin)
            },
            &mut events,
        )
        .await
        .unwrap();

        std::fs::remove_file(&path).unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(admin.partitions("x"), Some(3));
        assert_eq!(
            events.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["Creating topic x...", "Created topic x."]
        );
    }
}
