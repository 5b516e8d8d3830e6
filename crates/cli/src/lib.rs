pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;

use commands::clusters::ClusterFilterArgs;

#[derive(Debug, Parser)]
#[command(
    name = "clusterpilot",
    about = "Clusterpilot operator CLI",
    long_about = "Browse marketing clusters, generate campaign recommendations, and operate the cluster warehouse.",
    after_help = "Examples:\n  clusterpilot seed\n  clusterpilot clusters --interest esportes --device mobile\n  clusterpilot recommend cl-002 --notes \"cobertura das eleições\"\n  clusterpilot doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List clusters matching the given filters, with facets and rejected rows")]
    Clusters {
        #[command(flatten)]
        filters: FilterFlags,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Recommend a campaign (channel, send time, message, offer) for one cluster")]
    Recommend {
        #[arg(help = "Cluster id, e.g. cl-002")]
        cluster_id: String,
        #[arg(long, default_value = "", help = "Free-text campaign objective notes")]
        notes: String,
        #[arg(long, help = "Ask the configured LLM to paraphrase the message under guard rules")]
        enrich: bool,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Load the deterministic demo clusters into the warehouse")]
    Seed,
    #[command(about = "Apply pending warehouse migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, warehouse connectivity, cluster table, and LLM readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct FilterFlags {
    #[arg(long = "interest", value_delimiter = ',', help = "Content interest (repeatable)")]
    interests: Vec<String>,
    #[arg(long = "location", value_delimiter = ',', help = "Location (repeatable)")]
    locations: Vec<String>,
    #[arg(long = "engagement", value_delimiter = ',', help = "Previous engagement channel")]
    engagements: Vec<String>,
    #[arg(long, help = "Only subscribers (true) or non-subscribers (false)")]
    subscriber: Option<bool>,
    #[arg(long = "device", value_delimiter = ',', help = "Device type (repeatable)")]
    devices: Vec<String>,
    #[arg(long = "age", value_delimiter = ',', help = "Exact age (repeatable)")]
    ages: Vec<u32>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    peak_hour_from: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    peak_hour_to: Option<u8>,
    #[arg(long, help = "Minimum average daily minutes")]
    minutes_from: Option<f64>,
    #[arg(long, help = "Maximum average daily minutes")]
    minutes_to: Option<f64>,
}

impl From<FilterFlags> for ClusterFilterArgs {
    fn from(flags: FilterFlags) -> Self {
        Self {
            interests: flags.interests,
            locations: flags.locations,
            engagements: flags.engagements,
            subscriber: flags.subscriber,
            devices: flags.devices,
            ages: flags.ages,
            peak_hour_from: flags.peak_hour_from,
            peak_hour_to: flags.peak_hour_to,
            minutes_from: flags.minutes_from,
            minutes_to: flags.minutes_to,
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Clusters { filters, json } => commands::clusters::run(&filters.into(), json),
        Command::Recommend { cluster_id, notes, enrich, json } => {
            commands::recommend::run(&cluster_id, &notes, enrich, json)
        }
        Command::Seed => commands::seed::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::CommandResult::text(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::text(commands::doctor::run(json)),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
