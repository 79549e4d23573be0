//! logsieve CLI entry point

use clap::Parser;
use logsieve::cli::common::{EXIT_ERROR, EXIT_SUCCESS, init_logging};
use logsieve::cli::{Command, args::Cli};
use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();

    let exit_code = match &cli.command {
        Command::Analyze(args) => logsieve::cli::analyze::run_analyze(config_path, cli.color, args),
        Command::Rules { rule_args, format } => {
            logsieve::cli::rules::run_rules(config_path, rule_args, *format)
        }
        Command::Validate {
            log,
            rule_ids,
            rule_args,
            format,
        } => logsieve::cli::validate::run_validate(config_path, log, rule_ids, rule_args, *format),
        Command::Init { force } => match logsieve::cli::init::run_init(*force) {
            Ok(result) => {
                for name in &result.created {
                    println!("Created {}", name);
                }
                for name in &result.overwritten {
                    println!("Overwrote {}", name);
                }
                for name in &result.skipped {
                    println!("Skipped {} (already exists, use --force to overwrite)", name);
                }
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
    };

    process::exit(exit_code);
}
