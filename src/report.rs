//! Progress narrative of a run.

use std::fmt::{Display, Formatter};
use std::io::Write;

use crate::reconcile::SkipReason;

/// One step of progress, rendered as a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Creating { topic: String },
    Created { topic: String },
    Deleting { topic: String },
    Deleted { topic: String },
    Growing { topic: String, to: i32 },
    Grown { topic: String, by: i32 },
    Skipped { topic: String, reason: SkipReason },
}

impl Event {
    pub fn topic(&self) -> &str {
        match self {
            Self::Creating { topic }
            | Self::Created { topic }
            | Self::Deleting { topic }
            | Self::Deleted { topic }
            | Self::Growing { topic, .. }
            | Self::Grown { topic, .. }
            | Self::Skipped { topic, .. } => topic,
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating { topic } => write!(f, "Creating topic {topic}..."),
            Self::Created { topic } => write!(f, "Created topic {topic}."),
            Self::Deleting { topic } => write!(f, "Deleting topic {topic}..."),
            Self::Deleted { topic } => write!(f, "Deleted topic {topic}."),
            Self::Growing { topic, to } => {
                write!(f, "Increasing number of partitions to {to} on topic {topic}...")
            }
            Self::Grown { topic, by } => {
                write!(f, "Created {by} additional partitions on topic {topic}.")
            }
            Self::Skipped { topic, reason } => match reason {
                SkipReason::AlreadyExists => {
                    write!(f, "Skipping because topic {topic} already exists.")
                }
                SkipReason::DoesNotExist => {
                    write!(f, "Skipping because topic {topic} does not exist.")
                }
                SkipReason::EnoughPartitions(n) => {
                    write!(f, "Skipping because topic {topic} has {n} partitions.")
                }
            },
        }
    }
}

/// Receives progress events as the run makes them.
pub trait Reporter: Send {
    fn report(&mut self, event: Event);
}

impl<R> Reporter for &mut R
where
    R: Reporter + ?Sized,
{
    fn report(&mut self, event: Event) {
        (**self).report(event);
    }
}

/// Collects events, e.g. for inspection after a run.
impl Reporter for Vec<Event> {
    fn report(&mut self, event: Event) {
        self.push(event);
    }
}

/// Writes one line per event.
#[derive(Debug)]
pub struct LineReporter<W> {
    writer: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl LineReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Reporter for LineReporter<W> {
    fn report(&mut self, event: Event) {
        // progress output is best effort, a closed stdout must not abort the run
        if let Err(e) = writeln!(self.writer, "{event}") {
            tracing::warn!(%e, "cannot write progress");
        }
    }
}
