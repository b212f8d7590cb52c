use std::process::ExitCode;

use clap::Parser;
use rskafka_topics::admin::rdkafka::RdKafkaAdmin;
use rskafka_topics::cli::{self, Args};
use rskafka_topics::report::LineReporter;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    cli::init_logging();

    match cli::execute(&args, RdKafkaAdmin::new, LineReporter::stdout()).await {
        Ok(summary) => {
            info!(%summary, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "topics action failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
