use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spendwise_core::{classify, TextGenerator};
use spendwise_finance::{ChatClient, FinanceService, SqliteStore};
use spendwise_ingest::Extractor;

mod config;
mod report;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "spendwise",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SPENDWISE_BUILD_SHA"), ")"),
    about = "Turn bank and UPI SMS messages into tracked, budgeted expenses"
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a message through the full pipeline and save it
    Process {
        /// The SMS text (omit with --stdin)
        text: Option<String>,

        /// Read the message from stdin
        #[arg(long, conflicts_with = "text")]
        stdin: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract fields from a message without saving anything (JSON output)
    Parse {
        text: String,
    },

    /// Monthly budget limits
    Budget {
        #[command(subcommand)]
        command: BudgetCommand,
    },

    /// Month-to-date total and per-category spend
    Summary,

    /// Most recent saved transactions
    Transactions {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Most recent budget alerts
    Alerts {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage ~/.spendwise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Set or replace the monthly limit for a category
    Set { category: String, limit: Decimal },
    /// Show limits with this month's spend
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > warn. Logs go to stderr so JSON output stays clean.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    match cli.command {
        Command::Process { text, stdin, json } => {
            let text = message_text(text, stdin)?;
            let cfg = config::load_config()?;
            let service = build_service(&cfg)?;
            let out = service.run_pipeline_from_text(&text).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", report::outcome(&out));
            }
            if !out.ok {
                std::process::exit(1);
            }
        }

        Command::Parse { text } => {
            let extractor = Extractor::new().context("compile extraction patterns")?;
            let extracted = extractor.extract(&text)?;
            let value = serde_json::json!({
                "amount": extracted.amount,
                "merchant": extracted.merchant,
                "payment_mode": extracted.payment_mode,
                "transaction_type": extracted.transaction_type,
                "category": classify(&extracted.merchant),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Command::Budget { command } => {
            let store = open_store(&config::load_config()?)?;
            match command {
                BudgetCommand::Set { category, limit } => {
                    store.set_budget(&category, limit).await?;
                    println!("Budget for {} set to {limit:.2}", category.trim());
                }
                BudgetCommand::List => {
                    print!("{}", report::budgets(&store.list_budgets().await?));
                }
            }
        }

        Command::Summary => {
            let store = open_store(&config::load_config()?)?;
            let total = store.monthly_total().await?;
            let by_category = store.category_summary().await?;
            print!("{}", report::summary(total, &by_category));
        }

        Command::Transactions { limit } => {
            let store = open_store(&config::load_config()?)?;
            print!("{}", report::transactions(&store.recent_transactions(limit).await?));
        }

        Command::Alerts { limit } => {
            let store = open_store(&config::load_config()?)?;
            print!("{}", report::alerts(&store.recent_alerts(limit).await?));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let (path, written) = config::init_config()?;
                if written {
                    println!("Wrote {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                println!("# store.path (effective) = {}", cfg.store.db_path()?.display());
            }
        },
    }

    Ok(())
}

fn message_text(text: Option<String>, stdin: bool) -> Result<String> {
    if stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read message from stdin")?;
        return Ok(buf);
    }
    match text {
        Some(t) => Ok(t),
        None => bail!("pass the message text or use --stdin"),
    }
}

fn open_store(cfg: &Config) -> Result<SqliteStore> {
    let path = cfg.store.db_path()?;
    debug!(path = %path.display(), "opening store");
    SqliteStore::open(&path).with_context(|| format!("open {}", path.display()))
}

fn text_generator(cfg: &Config) -> Option<Arc<dyn TextGenerator>> {
    if cfg.llm.is_disabled() {
        return None;
    }
    let Some(key) = cfg.llm.api_key() else {
        warn!(env = %cfg.llm.api_key_env, "no API key set; advice is disabled");
        return None;
    };
    Some(Arc::new(ChatClient::new(cfg.llm.to_llm_config(), key)))
}

fn build_service(cfg: &Config) -> Result<FinanceService<SqliteStore>> {
    let store = Arc::new(open_store(cfg)?);
    let service = FinanceService::new(
        store,
        text_generator(cfg),
        cfg.pipeline.to_pipeline_config(),
    )?;
    Ok(service)
}
