#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

//! Reconciles the Kafka topics declared by an application's routing configuration against
//! a live cluster.
//!
//! # Example
//! ```no_run
//! # async fn test() {
//! use rskafka_topics::{
//!     action::{self, Action},
//!     admin::memory::MemoryAdmin,
//!     report::LineReporter,
//!     routing::Config,
//! };
//!
//! let config = Config::from_path("topics.toml").unwrap();
//! let admin = MemoryAdmin::new();
//!
//! // create missing topics, then grow partitions where the declaration asks for more
//! let summary = action::run(Action::Migrate, &config.routing, &admin, LineReporter::stdout())
//!     .await
//!     .unwrap();
//! println!("{summary}");
//! # }
//! ```

pub mod action;
pub mod admin;
pub mod cli;
pub mod cluster;
pub mod desired;
pub mod error;
pub mod reconcile;
pub mod report;
pub mod routing;
pub mod topic;
