use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;
use wikitrace::handlers::DEFAULT_DATA_DIR;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikitrace")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikitrace")
        .about("Turns link clicks and page loads into a tree of how you browsed")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(--"data-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory holding the wikitrace database and config")
                .default_value(DEFAULT_DATA_DIR),
        )
        .arg(
            arg!(--"window-ms" <MS>)
                .required(false)
                .global(true)
                .help("How long a click may wait for its page load, overriding config.toml")
                .value_parser(clap::value_parser!(u64)),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Creates the wikitrace database and default config")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the wikitrace data (default: --data-dir)"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Forces the overwriting of any existing database and config at the \
                        specified location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("intent")
                .about("Records that a link was activated on a page")
                .arg(
                    arg!(--"from" <TITLE>)
                        .required(true)
                        .help("Title of the page the link was clicked on"),
                )
                .arg(
                    arg!(--"target" <URL>)
                        .required(true)
                        .help("The link's destination, as the later page load will report it"),
                )
                .arg(
                    arg!(--"page-url" <URL>)
                        .required(false)
                        .help("URL of the page the link was on, used to resolve a relative target"),
                ),
        )
        .subcommand(
            command!("load")
                .about("Records that a page finished loading and prints any edge it confirms")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("URL of the loaded page"),
                )
                .arg(
                    arg!(-t --"title" <TITLE>)
                        .required(false)
                        .help("Title of the loaded page")
                        .conflicts_with("html"),
                )
                .arg(
                    arg!(--"html" <FILE>)
                        .required(false)
                        .help("Saved HTML of the loaded page to read its title from")
                        .value_parser(clap::value_parser!(PathBuf))
                        .conflicts_with("title"),
                ),
        )
        .subcommand(
            command!("replay")
                .about("Feeds a JSON-lines log of intent and load events through the tracker")
                .arg(
                    arg!(<FILE>)
                        .required(true)
                        .help("Path to the event log")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            command!("tree")
                .about("Shows the navigation history as a tree")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the tree to a file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"max-label" <CHARS>)
                        .required(false)
                        .help("Truncate page titles longer than this; 0 keeps them whole")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"no-pager")
                        .required(false)
                        .help("Print straight to the terminal instead of through less")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("edges")
                .about("Lists every recorded navigation edge")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                ),
        )
        .subcommand(command!("clear").about("Forgets all recorded navigation"))
}
