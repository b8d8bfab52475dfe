pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "proforma",
    about = "Proforma proposal engine operator CLI",
    long_about = "Price deals, compute ROI, persist quotes, trigger proposal document rendering, and watch for the finished link.",
    after_help = "Examples:\n  proforma propose 901 --preview\n  proforma render 901 --watch\n  proforma doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a deal and persist the quote; --preview computes without writing")]
    Propose {
        deal_id: String,
        #[arg(long, help = "Compute pricing and ROI only, skip catalog and quote writes")]
        preview: bool,
    },
    #[command(about = "Check once whether the proposal document link has landed")]
    Link { deal_id: String },
    #[command(about = "Trigger proposal document rendering via the configured webhook")]
    Render {
        deal_id: String,
        #[arg(long, help = "Poll the record store until the link lands, the budget runs out, or ctrl-c")]
        watch: bool,
    },
    #[command(about = "Print the pricing and ROI reference tables")]
    Tiers,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, token and webhook shape, and CRM reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Propose { deal_id, preview } => commands::propose::run(&deal_id, preview),
        Command::Link { deal_id } => commands::link::run(&deal_id),
        Command::Render { deal_id, watch } => commands::render::run(&deal_id, watch),
        Command::Tiers => commands::tiers::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
