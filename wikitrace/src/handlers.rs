use crate::render::{
    DEFAULT_LABEL_WIDTH, EMPTY_PLACEHOLDER, EdgeRow, OutputFormat, describe_reason,
    render_edges_csv, render_edges_json, render_edges_text, render_tree_json,
    render_tree_markdown, render_tree_text, save_output,
};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pager::Pager;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use wikitrace_core::config::CONFIG_FILE_NAME;
use wikitrace_core::{Edge, KeyValueStore, NavigationTracker, PageTitle, SqliteStore, TrackerConfig};
use wikitrace_host::{
    HostEvent, extract_page_title, host_of, is_article_link, is_same_site, load_event_log,
    navigation_key, resolve_link, title_from_url,
};

pub const DEFAULT_DATA_DIR: &str = "~/.config/wikitrace/";
pub const DATABASE_FILE_NAME: &str = "wikitrace.db";

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data_dir: PathBuf,
    pub window_ms: Option<u64>,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let raw_dir = matches
            .get_one::<String>("data-dir")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DATA_DIR);
        Self {
            data_dir: expand_data_dir(raw_dir),
            window_ms: matches.get_one::<u64>("window-ms").copied(),
            quiet: matches.get_flag("quiet"),
        }
    }
}

pub fn expand_data_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE_NAME)
}

/// Opens the tracker stored under `data_dir`, creating the directory and
/// database on first use.
pub fn open_tracker(
    data_dir: &Path,
    window_override: Option<u64>,
) -> Result<NavigationTracker<SqliteStore>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let config_path = data_dir.join(CONFIG_FILE_NAME);
    let mut config = TrackerConfig::load(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    if let Some(window_ms) = window_override {
        config = config.with_window_ms(window_ms);
    }

    let db_path = database_path(data_dir);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    debug!("Opened tracker at {} with {:?}", db_path.display(), config);

    Ok(NavigationTracker::new(store, config)?)
}

/// Absolute form of an intent target when the page it was clicked on is
/// known; otherwise the target is used as given.
pub fn resolve_target(target: &str, page_url: Option<&str>) -> String {
    page_url
        .and_then(|page| resolve_link(page, target))
        .unwrap_or_else(|| target.to_string())
}

/// Only article links on the site the click happened on are followed.
/// Without a page URL there is nothing to compare against, so only the
/// article check applies.
pub fn is_tracked_target(target: &str, page_url: Option<&str>) -> bool {
    if !is_article_link(target) {
        return false;
    }
    match page_url.and_then(host_of) {
        Some(host) => is_same_site(target, &host),
        None => true,
    }
}

/// Correlation key for a click, or `None` when the link is not followed.
/// Loads are keyed with [`navigation_key`] on the loaded URL, so both sides
/// agree whatever form the URLs arrive in.
pub fn intent_key(target: &str, page_url: Option<&str>) -> Option<String> {
    let target = resolve_target(target, page_url);
    is_tracked_target(&target, page_url).then(|| navigation_key(&target))
}

/// Title for a page load: an explicit title wins, then the page's own
/// heading, then the URL.
pub fn resolve_load_title(url: &str, title: Option<&str>, html: Option<&Path>) -> Result<PageTitle> {
    if let Some(title) = title {
        return Ok(PageTitle::new(title.trim())?);
    }
    if let Some(html_path) = html {
        let html = fs::read_to_string(html_path)
            .with_context(|| format!("Failed to read {}", html_path.display()))?;
        if let Some(title) = extract_page_title(&html) {
            return Ok(PageTitle::new(title)?);
        }
        warn!(
            "No title found in {}, falling back to the URL",
            html_path.display()
        );
    }
    Ok(PageTitle::new(title_from_url(url)?)?)
}

/// Counts from feeding an event log through a tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub intents: usize,
    pub loads: usize,
    pub skipped: usize,
    pub edges: Vec<Edge>,
}

impl ReplaySummary {
    pub fn events(&self) -> usize {
        self.intents + self.loads + self.skipped
    }
}

/// Feeds `events` through `tracker` in order. Events without a timestamp are
/// stamped with the current time; events that cannot be interpreted are
/// counted and skipped.
pub fn replay_events<S: KeyValueStore>(
    tracker: &mut NavigationTracker<S>,
    events: &[HostEvent],
    progress: &ProgressBar,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for event in events {
        let now = event.at().unwrap_or_else(Utc::now);
        match event {
            HostEvent::Intent { origin, target, .. } => match PageTitle::new(origin.trim()) {
                Ok(origin) => {
                    tracker.on_intent(origin, &navigation_key(target), now)?;
                    summary.intents += 1;
                }
                Err(e) => {
                    warn!("Skipping intent towards {}: {}", target, e);
                    summary.skipped += 1;
                }
            },
            HostEvent::Load { url, .. } => {
                let title = match event.page_title() {
                    Some(Ok(title)) => PageTitle::new(title.trim()).ok(),
                    Some(Err(e)) => {
                        warn!("Skipping load of {}: {}", url, e);
                        None
                    }
                    None => None,
                };
                match title {
                    Some(title) => {
                        if let Some(edge) =
                            tracker.on_completion(&navigation_key(url), title, now)?
                        {
                            progress.set_message(edge.to_string());
                            summary.edges.push(edge);
                        }
                        summary.loads += 1;
                    }
                    None => summary.skipped += 1,
                }
            }
        }
        progress.inc(1);
    }

    Ok(summary)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

pub fn handle_init(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let data_dir = args
        .get_one::<String>("PATH")
        .map(|raw| expand_data_dir(raw))
        .unwrap_or_else(|| options.data_dir.clone());
    let force = args.get_flag("force");
    let db_path = database_path(&data_dir);
    let config_path = data_dir.join(CONFIG_FILE_NAME);

    if !options.quiet {
        print_divider();
        println!("{}", "  WIKITRACE INITIALIZATION".bright_white().bold());
        print_divider();
        println!();
        println!(
            "{} Target: {}",
            "→".blue(),
            data_dir.display().to_string().bright_white()
        );
        println!();
    }

    let db_exists = SqliteStore::exists(&db_path);
    if db_exists && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("Database already exists at:");
        println!(
            "  {} {}",
            "•".yellow(),
            db_path.display().to_string().bright_white()
        );
        println!();
        println!(
            "{}",
            "Overwriting it discards all recorded navigation.".yellow()
        );

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();
        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    if db_exists {
        SqliteStore::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!("{} Existing database removed", "✓".green().bold());
    }
    SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to create database {}", db_path.display()))?;
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );

    if force || !config_path.exists() {
        let mut config = TrackerConfig::default();
        if let Some(window_ms) = options.window_ms {
            config = config.with_window_ms(window_ms);
        }
        config
            .save(&config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!(
            "{} Config: {}",
            "✓".green().bold(),
            config_path.display().to_string().bright_white()
        );
    } else {
        println!(
            "{} Keeping existing config: {}",
            "ℹ".blue(),
            config_path.display().to_string().bright_white()
        );
    }

    println!();
    println!("{} Wikitrace initialization complete!", "✓".green().bold());
    Ok(())
}

pub fn handle_intent(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let from = args
        .get_one::<String>("from")
        .context("--from is required")?;
    let target = args
        .get_one::<String>("target")
        .context("--target is required")?;
    let page_url = args.get_one::<String>("page-url").map(String::as_str);

    let origin = PageTitle::new(from.trim()).context("Origin title must not be empty")?;
    let Some(key) = intent_key(target, page_url) else {
        if !options.quiet {
            println!(
                "{} {} is not an article on this site; not tracked",
                "ℹ".blue(),
                resolve_target(target, page_url).bright_white()
            );
        }
        return Ok(());
    };
    let target = resolve_target(target, page_url);

    let mut tracker = open_tracker(&options.data_dir, options.window_ms)?;
    tracker.on_intent(origin.clone(), &key, Utc::now())?;

    if !options.quiet {
        println!(
            "{} Waiting for {} (from {})",
            "→".blue().bold(),
            target.bright_white(),
            origin.to_string().cyan()
        );
    }
    Ok(())
}

pub fn handle_load(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let url = args.get_one::<String>("url").context("--url is required")?;
    let title = args.get_one::<String>("title").map(String::as_str);
    let html = args.get_one::<PathBuf>("html").map(PathBuf::as_path);

    let title = resolve_load_title(url, title, html)?;
    let mut tracker = open_tracker(&options.data_dir, options.window_ms)?;

    match tracker.on_completion(&navigation_key(url), title.clone(), Utc::now())? {
        Some(edge) => println!(
            "{} Edge recorded: {} → {}",
            "✓".green().bold(),
            edge.from.to_string().cyan(),
            edge.to.to_string().cyan()
        ),
        None => {
            if !options.quiet {
                println!(
                    "{} {} was not reached through a tracked link",
                    "ℹ".blue(),
                    title.to_string().bright_white()
                );
            }
        }
    }
    Ok(())
}

pub fn handle_replay(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let file = args.get_one::<PathBuf>("FILE").context("FILE is required")?;
    let events = load_event_log(file)
        .with_context(|| format!("Failed to load event log {}", file.display()))?;
    let mut tracker = open_tracker(&options.data_dir, options.window_ms)?;

    let progress = if options.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(events.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let summary = replay_events(&mut tracker, &events, &progress);
    progress.finish_and_clear();
    let summary = summary?;

    print_divider();
    println!("{}", "  REPLAY SUMMARY".bright_white().bold());
    print_divider();
    println!("  Events:   {}", summary.events());
    println!("  Intents:  {}", summary.intents);
    println!("  Loads:    {}", summary.loads);
    if summary.skipped > 0 {
        println!("  Skipped:  {}", summary.skipped.to_string().yellow());
    }
    println!("  Edges:    {}", summary.edges.len().to_string().green().bold());
    for edge in &summary.edges {
        println!("    {} {}", "✓".green(), edge);
    }
    Ok(())
}

pub fn handle_tree(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let format_str = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let Some(format) = OutputFormat::from_str(format_str) else {
        bail!("Unsupported tree format: {}", format_str);
    };
    if format == OutputFormat::Csv {
        bail!("Trees cannot be rendered as csv; use `edges --format csv`");
    }
    let max_label = args
        .get_one::<usize>("max-label")
        .copied()
        .unwrap_or(DEFAULT_LABEL_WIDTH);
    let output = args.get_one::<PathBuf>("output");
    let no_pager = args.get_flag("no-pager");

    let tracker = open_tracker(&options.data_dir, options.window_ms)?;
    let Some(tree) = tracker.refresh()? else {
        println!("{}", EMPTY_PLACEHOLDER.italic());
        return Ok(());
    };

    let content = match format {
        OutputFormat::Json => render_tree_json(&tree)?,
        OutputFormat::Markdown => render_tree_markdown(&tree, max_label),
        _ => render_tree_text(&tree, max_label),
    };

    if let Some(path) = output {
        save_output(&content, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "{} Tree saved to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
        return Ok(());
    }

    if format == OutputFormat::Text {
        if !no_pager {
            Pager::with_pager("less -R").setup();
        }
        if !options.quiet {
            println!(
                "{} {} ({}, {} pages)\n",
                "Root:".bright_blue().bold(),
                tree.root().to_string().bright_white().bold(),
                describe_reason(tree.selection().reason),
                tree.len()
            );
        }
    }
    print!("{}", content);
    Ok(())
}

pub fn handle_edges(args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let format_str = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let Some(format) = OutputFormat::from_str(format_str) else {
        bail!("Unsupported edge format: {}", format_str);
    };

    let tracker = open_tracker(&options.data_dir, options.window_ms)?;
    let rows = collect_edge_rows(&tracker)?;

    let content = match format {
        OutputFormat::Json => render_edges_json(&rows)?,
        OutputFormat::Csv => render_edges_csv(&rows),
        OutputFormat::Text => render_edges_text(&rows, 0),
        OutputFormat::Markdown => bail!("Edges cannot be rendered as markdown"),
    };
    print!("{}", content);
    Ok(())
}

/// The history log when one is kept and non-empty, else the graph's edges.
pub fn collect_edge_rows<S: KeyValueStore>(tracker: &NavigationTracker<S>) -> Result<Vec<EdgeRow>> {
    if tracker.config().keep_history {
        let history = tracker.history()?;
        if !history.is_empty() {
            return Ok(history.entries().iter().map(EdgeRow::from).collect());
        }
    }
    let graph = tracker.load_graph()?;
    Ok(graph
        .edges()
        .into_iter()
        .map(|(from, to)| EdgeRow::new(from, to))
        .collect())
}

pub fn handle_clear(_args: &ArgMatches, options: &GlobalOptions) -> Result<()> {
    let mut tracker = open_tracker(&options.data_dir, options.window_ms)?;
    tracker.clear_history()?;
    println!("{} Navigation history cleared", "✓".green().bold());
    Ok(())
}
