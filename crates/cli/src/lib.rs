pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

const LIMIT_HELP: &str = "Maximum number of products (defaults to recommendations.default_limit)";

#[derive(Debug, Parser)]
#[command(
    name = "unishop",
    about = "Unishop operator CLI",
    long_about = "Inspect configuration, prepare the catalog database, and query the \
                  recommendation, chatbot and classifier engines from the shell.",
    after_help = "Examples:\n  unishop config\n  unishop seed\n  \
                  unishop recommend popular --limit 3\n  unishop chat \"what are your hours?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the built-in product catalog into the database (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(subcommand, about = "Query the recommendation engine")]
    Recommend(RecommendCommand),
    #[command(about = "Send one message to the chatbot and print its answer")]
    Chat { message: String },
    #[command(about = "Classify an academic query and print scenario guidance")]
    Classify { query: String },
}

#[derive(Debug, Subcommand)]
enum RecommendCommand {
    #[command(about = "Products in the same category as PRODUCT_ID")]
    Related {
        product_id: String,
        #[arg(long, help = LIMIT_HELP)]
        limit: Option<i64>,
    },
    #[command(about = "Most popular products across the catalog")]
    Popular {
        #[arg(long, help = LIMIT_HELP)]
        limit: Option<i64>,
    },
    #[command(about = "Products matching the academic category of a free-text query")]
    Topic {
        query: String,
        #[arg(long, help = LIMIT_HELP)]
        limit: Option<i64>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Recommend(RecommendCommand::Related { product_id, limit }) => {
            commands::recommend::related(&product_id, limit)
        }
        Command::Recommend(RecommendCommand::Popular { limit }) => {
            commands::recommend::popular(limit)
        }
        Command::Recommend(RecommendCommand::Topic { query, limit }) => {
            commands::recommend::topic(&query, limit)
        }
        Command::Chat { message } => commands::chat::run(&message),
        Command::Classify { query } => commands::classify::run(&query),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
