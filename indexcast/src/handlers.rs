use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indexcast_core::cache::{FsBlobStore, UrlCache};
use indexcast_core::crawl::crawl_site;
use indexcast_core::error::SiteSkip;
use indexcast_core::indexnow::{IndexNowBroadcaster, submit_cached};
use indexcast_core::outcome::{BroadcastResult, Outcome};
use indexcast_core::ping::PingBroadcaster;
use indexcast_core::report::{BroadcastReport, CrawlReport, ReportFormat, describe_failure};
use indexcast_core::site::SiteRegistry;
use indexcast_scanner::SitemapResolver;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/indexcast/";
pub const DEFAULT_CONFIG: &str = "~/.config/indexcast/sites.json";
pub const DEFAULT_STORAGE: &str = "~/.config/indexcast/storage";
pub const SITES_FILE_NAME: &str = "sites.json";

const SAMPLE_SITES: &str = include_str!("../config/sites.example.json");

/// Settings shared by the crawl, ping and submit commands.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub config: PathBuf,
    pub storage: PathBuf,
    pub site: Option<String>,
    pub format: ReportFormat,
    pub timeout: u64,
    pub quiet: bool,
}

impl RunOptions {
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let format_name = args
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text");
        let format = ReportFormat::from_str(format_name)
            .with_context(|| format!("unknown report format '{}'", format_name))?;

        Ok(Self {
            config: expand_path(string_arg(args, "config").unwrap_or(DEFAULT_CONFIG)),
            storage: expand_path(string_arg(args, "storage").unwrap_or(DEFAULT_STORAGE)),
            site: string_arg(args, "site").map(str::to_string),
            format,
            timeout: args.get_one::<u64>("timeout").copied().unwrap_or(10),
            quiet: args.get_flag("quiet"),
        })
    }

    /// Live progress goes to stdout, so it is off for JSON reports as well as `--quiet`.
    pub fn shows_progress(&self) -> bool {
        !self.quiet && self.format == ReportFormat::Text
    }
}

fn string_arg<'a>(args: &'a ArgMatches, id: &str) -> Option<&'a str> {
    args.get_one::<String>(id).map(String::as_str)
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Load the site list, optionally narrowed to one domain.
pub fn load_registry(config: &Path, site: Option<&str>) -> Result<SiteRegistry> {
    let registry = SiteRegistry::load(config)?;
    if registry.skipped() > 0 {
        warn!(
            config = %config.display(),
            skipped = registry.skipped(),
            "Ignored site entries without a domain"
        );
    }

    match site {
        Some(domain) => Ok(registry.retain_domain(domain)?),
        None => Ok(registry),
    }
}

/// One colored line for a ping or submission result.
pub fn format_result_line(result: &BroadcastResult) -> String {
    match result.outcome {
        Outcome::Success => {
            let status = result
                .http_status
                .map(|s| format!(" (HTTP {})", s))
                .unwrap_or_default();
            format!(
                "{} [{}] {}{}",
                "✓".green().bold(),
                result.target,
                result.subject,
                status
            )
        }
        Outcome::Fault => describe_failure(result).yellow().to_string(),
        Outcome::TransportError => describe_failure(result).red().to_string(),
    }
}

/// Write the bundled sample site list into `dir`, returning the file written.
pub fn write_sample_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let target = dir.join(SITES_FILE_NAME);
    if target.exists() && !force {
        bail!(
            "{} already exists, use --force to overwrite it",
            target.display()
        );
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    fs::write(&target, SAMPLE_SITES)
        .with_context(|| format!("failed to write {}", target.display()))?;

    Ok(target)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_title(title: &str) {
    print_divider();
    println!("{}", format!("  {}", title).bright_white().bold());
    print_divider();
    println!();
}

fn spinner(visible: bool, template: &str) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template(template)?);
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

fn announce_skip(bar: &ProgressBar, domain: &str, skip: &SiteSkip) {
    if skip.is_informational() {
        info!(domain = %domain, reason = %skip, "Site skipped");
        bar.println(format!("{} {}: {}", "→".blue(), domain, skip));
    } else {
        warn!(domain = %domain, reason = %skip, "Site skipped");
        bar.println(format!("{} {}: {}", "✗".red().bold(), domain, skip));
    }
}

fn print_report(rendered: String, opts: &RunOptions) {
    if opts.shows_progress() {
        println!();
    }
    print!("{}", rendered);
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let dir = expand_path(string_arg(args, "PATH").unwrap_or(DEFAULT_CONFIG_DIR));
    let force = args.get_flag("force");
    let quiet = args.get_flag("quiet");

    if !quiet {
        print_title("INDEXCAST INITIALIZATION");
        println!(
            "{} Target: {}",
            "→".blue(),
            dir.display().to_string().bright_white()
        );
        if force {
            println!("{} Overwriting any existing site list", "→".yellow().bold());
        }
    }

    let written = write_sample_config(&dir, force)?;

    if !quiet {
        println!(
            "{} Sample site list written: {}",
            "✓".green().bold(),
            written.display().to_string().bright_white()
        );
        println!();
        println!("Edit it, then run:");
        println!("  {} indexcast crawl", "•".blue());
        println!("  {} indexcast ping", "•".blue());
        println!("  {} indexcast submit", "•".blue());
        println!();
    }
    Ok(())
}

pub async fn handle_crawl(opts: &RunOptions) -> Result<()> {
    let registry = load_registry(&opts.config, opts.site.as_deref())?;
    let cache = UrlCache::new(FsBlobStore::new(opts.storage.clone()));

    if opts.shows_progress() {
        print_title("SITEMAP CRAWL");
        println!("{} Sites: {}", "→".blue(), registry.len());
        println!(
            "{} Storage: {}\n",
            "→".blue(),
            opts.storage.display().to_string().bright_white()
        );
    }

    let bar = spinner(opts.shows_progress(), "{spinner:.cyan} {msg}")?;
    let progress = bar.clone();
    let resolver = SitemapResolver::with_timeout(opts.timeout)
        .context("failed to build HTTP client")?
        .with_progress_callback(Arc::new(move |url: &str| {
            progress.set_message(format!("Fetching {}", url));
        }));

    let mut report = CrawlReport::new();
    for site in registry.sites() {
        bar.set_message(format!("Crawling {}", site.domain));
        let result = crawl_site(&resolver, &cache, site).await;

        match &result {
            Ok(summary) => {
                bar.println(format!(
                    "{} {}: {} URLs stored",
                    "✓".green().bold(),
                    summary.domain,
                    summary.urls_stored
                ));
                for failure in &summary.failures {
                    bar.println(format!(
                        "  {} {} ({} failed): {}",
                        "⚠".yellow(),
                        failure.url,
                        failure.stage.as_str(),
                        failure.reason
                    ));
                }
            }
            Err(skip) => announce_skip(&bar, &site.domain, skip),
        }
        report.record(&site.domain, result);
    }
    bar.finish_and_clear();

    print_report(report.render(opts.format)?, opts);
    Ok(())
}

pub async fn handle_ping(opts: &RunOptions) -> Result<()> {
    let registry = load_registry(&opts.config, opts.site.as_deref())?;

    if opts.shows_progress() {
        print_title("XML-RPC PING");
        println!("{} Sites: {}\n", "→".blue(), registry.len());
    }

    let bar = spinner(opts.shows_progress(), "{spinner:.cyan} {msg}")?;
    let live = bar.clone();
    let broadcaster = PingBroadcaster::with_timeout(opts.timeout)
        .context("failed to build HTTP client")?
        .with_result_callback(Arc::new(move |result: &BroadcastResult| {
            live.println(format_result_line(result));
        }));

    let mut report = BroadcastReport::new("Ping");
    for site in registry.sites() {
        bar.set_message(format!("Pinging services for {}", site.domain));
        let result = broadcaster.broadcast(site).await.map_err(SiteSkip::from);
        if let Err(skip) = &result {
            announce_skip(&bar, &site.domain, skip);
        }
        report.record(&site.domain, result);
    }
    bar.finish_and_clear();

    print_report(report.render(opts.format)?, opts);
    Ok(())
}

pub async fn handle_submit(opts: &RunOptions, threads: usize) -> Result<()> {
    let registry = load_registry(&opts.config, opts.site.as_deref())?;
    let cache = UrlCache::new(FsBlobStore::new(opts.storage.clone()));

    let bar = spinner(opts.shows_progress(), "{spinner:.cyan} {msg} ({pos} sent)")?;
    let live = bar.clone();
    let broadcaster = IndexNowBroadcaster::with_timeout(opts.timeout)
        .context("failed to build HTTP client")?
        .with_concurrency(threads)
        .with_result_callback(Arc::new(move |result: &BroadcastResult| {
            live.inc(1);
            if !result.is_success() {
                live.println(format_result_line(result));
            }
        }));

    if opts.shows_progress() {
        // Printed before the first tick so the spinner stays below it
        bar.suspend(|| {
            print_title("INDEXNOW SUBMISSION");
            println!("{} Sites: {}", "→".blue(), registry.len());
            println!("{} Engines: {}", "→".blue(), broadcaster.engines().len());
            println!("{} In flight: {}\n", "→".blue(), threads.max(1));
        });
    }

    let mut report = BroadcastReport::new("IndexNow");
    for site in registry.sites() {
        bar.set_message(format!("Submitting {}", site.domain));
        let result = submit_cached(&broadcaster, &cache, site).await;

        match &result {
            Ok(results) => {
                let succeeded = results.iter().filter(|r| r.is_success()).count();
                bar.println(format!(
                    "{} {}: {}/{} submissions accepted",
                    "✓".green().bold(),
                    site.domain,
                    succeeded,
                    results.len()
                ));
            }
            Err(skip) => announce_skip(&bar, &site.domain, skip),
        }
        report.record(&site.domain, result);
    }
    bar.finish_and_clear();

    print_report(report.render(opts.format)?, opts);
    Ok(())
}
