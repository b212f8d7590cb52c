use std::fmt::Display;

use thiserror::Error;

/// The object an admin request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    /// Request targeted a single topic.
    Topic(String),

    /// Request targeted the cluster as a whole, e.g. a metadata fetch.
    Cluster,
}

impl Display for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Topic(topic) => write!(f, "topic \"{topic}\""),
            Self::Cluster => write!(f, "cluster"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid topics action: {0}")]
    InvalidAction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot read configuration: {0}")]
    ReadConfig(#[from] std::io::Error),

    #[error("Cannot parse configuration: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("Admin request {request} failed for {context}: {source}")]
    Admin {
        request: &'static str,
        context: RequestContext,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn admin<E>(request: &'static str, context: RequestContext, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Admin {
            request,
            context,
            source: source.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
