//! Desired state: the topics under management, derived from the routing configuration.

use std::sync::OnceLock;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::routing::RoutingConfig;
use crate::topic::TopicDefinition;

/// Collects the managed topics of a [`RoutingConfig`].
///
/// Topics are visited consumer group by consumer group in declaration order. Inactive topics
/// are left out. When a name is declared in several consumer groups the first declaration
/// wins, so a single run manages a single cluster.
///
/// The result is computed on first use and reused for the lifetime of the collector.
#[derive(Debug)]
pub struct DesiredTopics<'a> {
    routing: &'a RoutingConfig,
    collected: OnceLock<Vec<TopicDefinition>>,
}

impl<'a> DesiredTopics<'a> {
    pub fn new(routing: &'a RoutingConfig) -> Self {
        Self {
            routing,
            collected: OnceLock::new(),
        }
    }

    /// The managed topics in first-seen order.
    pub fn collect(&self) -> &[TopicDefinition] {
        self.collected.get_or_init(|| collect_topics(self.routing))
    }
}

fn collect_topics(routing: &RoutingConfig) -> Vec<TopicDefinition> {
    let mut topics: Vec<TopicDefinition> = vec![];
    // name -> (index into `topics`, declaring consumer group)
    let mut seen: HashMap<&str, (usize, &str)> = HashMap::new();

    for (group, topic) in routing.declarations() {
        if !topic.active {
            debug!(
                topic = %topic.name,
                consumer_group = %group.name,
                "topic not managed",
            );
            continue;
        }

        let definition = topic.definition();
        match seen.get(topic.name.as_str()) {
            Some((idx, first_group)) => {
                if topics[*idx] != definition {
                    warn!(
                        topic = %topic.name,
                        first_group,
                        ignored_group = %group.name,
                        "conflicting topic declaration ignored, first declaration wins",
                    );
                }
            }
            None => {
                seen.insert(topic.name.as_str(), (topics.len(), group.name.as_str()));
                topics.push(definition);
            }
        }
    }

    topics
}
