mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use commands::{BucketSpec, Engine};
use parametric::config::{default_config_path, Config};
use parametric::request::QueryRestrictions;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parametric")]
#[command(about = "Parametric values and numeric histograms over a JSON document set")]
#[command(version)]
struct Cli {
    /// Config file (created with defaults when missing)
    #[arg(short, long, env = "PARAMETRIC_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of documents; overrides engine.documents
    #[arg(short, long)]
    documents: Option<PathBuf>,

    /// Query text; "*" matches everything
    #[arg(short, long, default_value = "*")]
    query: String,

    /// Restrict to a database (repeatable)
    #[arg(long = "database")]
    databases: Vec<String>,

    /// Field text restriction, e.g. MATCH{news}:CATEGORY
    #[arg(long)]
    field_text: Option<String>,

    /// Earliest document date (RFC 3339)
    #[arg(long)]
    min_date: Option<DateTime<Utc>>,

    /// Latest document date (RFC 3339)
    #[arg(long)]
    max_date: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discrete values and counts per field
    Values {
        /// Field to query (repeatable); defaults to every parametric field
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Values kept per field
        #[arg(short, long)]
        max_values: Option<usize>,

        /// alphabetical, reverse_alphabetical, document_count,
        /// number_increasing, number_decreasing or off
        #[arg(short, long)]
        sort: Option<String>,

        /// Glob pattern a value must match (repeatable, any may match)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Numeric histograms
    Buckets {
        /// FIELD:BUCKETS:MIN:MAX (repeatable)
        #[arg(short, long = "bucket", required = true)]
        buckets: Vec<BucketSpec>,
    },

    /// Min, max, average and sum of numeric fields
    Details {
        #[arg(short, long = "field", required = true)]
        fields: Vec<String>,
    },

    /// Value hierarchy, each field conditioned on the previous one
    Dependent {
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// List fields present in the document set
    Fields,

    /// Print the effective configuration
    Config,
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.observability.log_level.clone()),
    );
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.observability.log_format.clone());
    let json = format == "json";

    // Logs go to stderr; stdout carries results.
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_tracing(&config);
    tracing::debug!("Config file: {:?}", config_path);

    if let Commands::Config = cli.command {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let restrictions = QueryRestrictions {
        query_text: cli.query,
        field_text: cli.field_text,
        databases: cli.databases,
        min_date: cli.min_date,
        max_date: cli.max_date,
        ..Default::default()
    };

    let engine = Engine::open(&config, cli.documents.as_deref())?;

    match cli.command {
        Commands::Values {
            fields,
            max_values,
            sort,
            filters,
        } => {
            commands::run_values(&engine, restrictions, &fields, max_values, sort.as_deref(), filters).await?;
        }
        Commands::Buckets { buckets } => {
            commands::run_buckets(&engine, restrictions, &buckets).await?;
        }
        Commands::Details { fields } => {
            commands::run_details(&engine, restrictions, &fields).await?;
        }
        Commands::Dependent { fields } => {
            commands::run_dependent(&engine, restrictions, &fields).await?;
        }
        Commands::Fields => {
            commands::run_fields(&engine)?;
        }
        Commands::Config => {}
    }

    Ok(())
}
