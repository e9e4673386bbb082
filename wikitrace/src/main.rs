use colored::Colorize;
use commands::command_argument_builder;
use tracing_subscriber::EnvFilter;
use wikitrace::handlers::{
    GlobalOptions, handle_clear, handle_edges, handle_init, handle_intent, handle_load,
    handle_replay, handle_tree,
};

mod commands;

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let options = GlobalOptions::from_matches(&chosen_command);

    let result = match chosen_command.subcommand() {
        None => {
            // No subcommand provided, just show the banner
            if !quiet {
                print_banner();
            }
            Ok(())
        }
        Some(("init", primary_command)) => handle_init(primary_command, &options),
        Some(("intent", primary_command)) => handle_intent(primary_command, &options),
        Some(("load", primary_command)) => handle_load(primary_command, &options),
        Some(("replay", primary_command)) => handle_replay(primary_command, &options),
        Some(("tree", primary_command)) => handle_tree(primary_command, &options),
        Some(("edges", primary_command)) => handle_edges(primary_command, &options),
        Some(("clear", primary_command)) => handle_clear(primary_command, &options),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        "{} {}",
        "wikitrace".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_white()
    );
    println!("Maps how you wander from page to page. Run with --help for commands.");
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
