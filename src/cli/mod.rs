//! # lambda-rds-stack CLI
//!
//! Synthesizes the Lambda + RDS stack and inspects what it declares.
//!
//! ## Usage
//!
//! ```bash
//! # Write the cloud assembly to ./cdk.out
//! lambda-rds-stack synth
//!
//! # Print a YAML template for another stack name
//! lambda-rds-stack --stack-name DevStack synth --format yaml --stdout
//!
//! # Pin the environment and add tags
//! lambda-rds-stack --account 123456789012 --region eu-west-1 --tag team=platform synth
//!
//! # List declared resources and their dependencies
//! lambda-rds-stack graph
//!
//! # SQL to run once against the database before the first invocation
//! lambda-rds-stack bootstrap-sql
//! ```
//!
//! Settings fall back to `STACK_NAME`, `CDK_DEFAULT_ACCOUNT`,
//! `CDK_DEFAULT_REGION`, `SYNTH_OUTPUT_DIR`, `SYNTH_OUTPUT_FORMAT`,
//! `PROJECT_DIR` and `LOG_LEVEL`, read from the environment or `.env`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lambda_rds_stack::config::SynthConfig;
use lambda_rds_stack::observability;
use lambda_rds_stack::stack::{Environment, StackProps, DB_NAME, DB_USERNAME};
use lambda_rds_stack::synth::OutputFormat;
use std::path::{Path, PathBuf};

mod bootstrap_sql;
mod graph;
mod outputs;
mod schema;
mod synth;
mod version;

/// Lambda + RDS stack synthesizer
#[derive(Parser)]
#[command(name = "lambda-rds-stack")]
#[command(
    about = "Synthesize a VPC, MySQL database and Rust Lambda stack to CloudFormation",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Stack name (default: STACK_NAME or LambdaRDSStack)
    #[arg(long, global = true)]
    stack_name: Option<String>,

    /// Target account (default: CDK_DEFAULT_ACCOUNT)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Target region (default: CDK_DEFAULT_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Tag applied to every taggable resource, repeatable
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag, global = true)]
    tags: Vec<(String, String)>,

    /// YAML or JSON file with stack properties
    #[arg(long, value_name = "FILE", global = true)]
    props: Option<PathBuf>,

    /// Directory function sources are resolved against (default: PROJECT_DIR or .)
    #[arg(long, value_name = "DIR", global = true)]
    project_dir: Option<PathBuf>,

    /// Log level (default: LOG_LEVEL or info)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the template and asset manifest
    Synth {
        /// Output directory (default: SYNTH_OUTPUT_DIR or cdk.out)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Template format (default: SYNTH_OUTPUT_FORMAT or json)
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Print the template to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },
    /// List declared resources in creation order with their dependencies
    Graph,
    /// List stack outputs
    Outputs,
    /// Print the SQL that creates the IAM-authenticated database user
    #[command(name = "bootstrap-sql")]
    BootstrapSql {
        /// Database to grant access to
        #[arg(long, default_value = DB_NAME)]
        database: String,

        /// Database user to create
        #[arg(long, default_value = DB_USERNAME)]
        user: String,
    },
    /// Print the JSON Schema of the stack properties file
    Schema,
    /// Show build information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Resolved inputs of a stack definition
pub(crate) struct StackInput {
    pub name: String,
    pub props: StackProps,
    pub project_dir: PathBuf,
}

fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = SynthConfig::from_env();
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    observability::init_tracing(&config.log_level)?;

    match cli.command {
        Commands::Synth {
            ref output,
            format,
            stdout,
        } => {
            let output_dir = output.clone().unwrap_or_else(|| config.output_dir.clone());
            let format = format.map_or(config.output_format, OutputFormat::from);
            let input = stack_input(&cli, &config)?;
            synth::synth_command(&input, &output_dir, format, stdout)
        }
        Commands::Graph => graph::graph_command(&stack_input(&cli, &config)?),
        Commands::Outputs => outputs::outputs_command(&stack_input(&cli, &config)?),
        Commands::BootstrapSql {
            ref database,
            ref user,
        } => bootstrap_sql::bootstrap_sql_command(database, user),
        Commands::Schema => schema::schema_command(),
        Commands::Version => {
            version::version_command();
            Ok(())
        }
    }
}

/// Merge the properties file, environment and flags; flags win
fn stack_input(cli: &Cli, config: &SynthConfig) -> Result<StackInput> {
    let mut props = match &cli.props {
        Some(path) => load_props(path)?,
        None => StackProps::default(),
    };

    let env = props.env.get_or_insert_with(Environment::default);
    if let Some(account) = cli.account.clone().or_else(|| config.account.clone()) {
        if cli.account.is_some() || env.account.is_none() {
            env.account = Some(account);
        }
    }
    if let Some(region) = cli.region.clone().or_else(|| config.region.clone()) {
        if cli.region.is_some() || env.region.is_none() {
            env.region = Some(region);
        }
    }
    if props
        .env
        .as_ref()
        .is_some_and(|e| e.account.is_none() && e.region.is_none())
    {
        props.env = None;
    }

    props.tags.extend(cli.tags.iter().cloned());

    Ok(StackInput {
        name: cli
            .stack_name
            .clone()
            .unwrap_or_else(|| config.stack_name.clone()),
        props,
        project_dir: cli
            .project_dir
            .clone()
            .unwrap_or_else(|| config.project_dir.clone()),
    })
}

fn load_props(path: &Path) -> Result<StackProps> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stack properties from {}", path.display()))?;
    // YAML is a superset of JSON, one parser covers both
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse stack properties in {}", path.display()))
}

fn parse_tag(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err("tag key must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}
