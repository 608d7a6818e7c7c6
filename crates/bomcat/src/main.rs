use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod classify;
mod rows;
mod rules;

#[derive(Parser)]
#[command(name = "bomcat")]
#[command(about = "Classify, merge and report electronic BOM entries", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify BOM rows from a CSV or JSON file
    #[command(alias = "c")]
    Classify(classify::ClassifyArgs),

    /// Inspect and extend the learned-rules file
    Rules(rules::RulesArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG still overrides.
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Classify(args) => classify::execute(args),
        Commands::Rules(args) => rules::execute(args),
    }
}
