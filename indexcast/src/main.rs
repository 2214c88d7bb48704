use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indexcast::handlers::{RunOptions, handle_crawl, handle_init, handle_ping, handle_submit};
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    init_tracing(chosen_command.get_count("verbose"));

    if let Err(e) = dispatch(&chosen_command).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(chosen_command: &ArgMatches) -> anyhow::Result<()> {
    match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("crawl", primary_command)) => {
            handle_crawl(&RunOptions::from_matches(primary_command)?).await
        }
        Some(("ping", primary_command)) => {
            handle_ping(&RunOptions::from_matches(primary_command)?).await
        }
        Some(("submit", primary_command)) => {
            let threads = primary_command
                .get_one::<usize>("threads")
                .copied()
                .unwrap_or(1);
            handle_submit(&RunOptions::from_matches(primary_command)?, threads).await
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, raised by each `-v`.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
