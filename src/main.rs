mod batch;
mod db;
mod error;
mod fetch;
mod listing;
mod output;
mod page;
mod parser;
mod record;
mod settings;
mod sites;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use parser::{PageExtractor, SiteExtractor};
use settings::{Backend, Settings};
use sites::Site;

#[derive(Parser)]
#[command(name = "toon_scraper", about = "Webtoon metadata scraper for Korean comics platforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List title pages, visit them and write records (JSON + SQLite)
    Run {
        #[arg(short, long, value_enum)]
        site: Site,
        /// Max pages to visit (default: all listed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Visit these title pages instead of the listing
        #[arg(long = "url")]
        urls: Vec<String>,
        /// Pause between pages in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Extra random pause, 0..=N milliseconds
        #[arg(long)]
        jitter_ms: Option<u64>,
        /// Write a partial JSON file every N records (0 = never)
        #[arg(long)]
        checkpoint_every: Option<usize>,
        #[arg(long, value_enum)]
        backend: Option<Backend>,
    },
    /// Extract one saved HTML page and print the record
    Extract {
        #[arg(short, long, value_enum)]
        site: Site,
        #[arg(short, long)]
        file: PathBuf,
        /// Page URL, used to resolve relative links
        #[arg(long)]
        url: Option<String>,
    },
    /// Show per-field counts of stored titles
    Stats {
        #[arg(short, long, value_enum)]
        site: Option<Site>,
    },
    /// Stored titles overview table
    Overview {
        #[arg(short, long, value_enum)]
        site: Option<Site>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;

    let result = match cli.command {
        Commands::Run {
            site,
            limit,
            urls,
            delay_ms,
            jitter_ms,
            checkpoint_every,
            backend,
        } => {
            if let Some(v) = delay_ms {
                settings.delay_ms = v;
            }
            if let Some(v) = jitter_ms {
                settings.jitter_ms = v;
            }
            if let Some(v) = checkpoint_every {
                settings.checkpoint_every = v;
            }
            if let Some(v) = backend {
                settings.backend = v;
            }
            run(site, limit, urls, &settings).await
        }
        Commands::Extract { site, file, url } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let url = match url {
                Some(u) => u,
                None => {
                    let abs = std::fs::canonicalize(&file)?;
                    url::Url::from_file_path(&abs)
                        .map_err(|_| anyhow::anyhow!("Cannot make a URL from {}", abs.display()))?
                        .to_string()
                }
            };
            let page = page::PageSnapshot::from_html(url, html);
            let record = SiteExtractor::new(site).extract(&page)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Stats { site } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn, site)?;
            println!("Titles:    {}", s.total);
            println!("Errors:    {}", s.errors);
            println!("Runs:      {}", s.runs);
            let ok = s.total - s.errors;
            for (name, n) in &s.fields {
                println!("  {:<15} {:>5}/{}", name, n, ok);
            }
            println!("  {:<15} {:>5}/{}", "tags", s.with_tags, ok);
            Ok(())
        }
        Commands::Overview { site, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, site, limit)?;
            if rows.is_empty() {
                println!("No titles found. Run 'run --site <site>' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<6} | {:<24} | {:<20} | {:>9} | {:>9} | {:<6}",
                "#", "Site", "Title", "Authors", "Likes", "Views", "Status"
            );
            println!("{}", "-".repeat(96));

            for (i, r) in rows.iter().enumerate() {
                let title = match &r.error {
                    Some(e) => format!("(error: {})", e),
                    None => r.title_name.clone(),
                };
                let likes = r.like_count.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
                let views = r.view_count.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
                println!(
                    "{:>3} | {:<6} | {:<24} | {:<20} | {:>9} | {:>9} | {:<6}",
                    i + 1,
                    r.site,
                    truncate(&title, 24),
                    truncate(&r.authors, 20),
                    likes,
                    views,
                    r.status
                );
            }

            let with_tags: Vec<_> = rows.iter().filter(|r| !r.tags.is_empty()).collect();
            if !with_tags.is_empty() {
                println!("\n--- Tags ---");
                for r in &with_tags {
                    println!("  {}: {}", truncate(&r.url, 48), r.tags.join(" "));
                }
            }

            println!("\n{} titles", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(
    site: Site,
    limit: Option<usize>,
    urls: Vec<String>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let run_id = db::new_run_id();
    info!(run_id = %run_id, %site, backend = ?settings.backend, "Starting run");

    let mut source = fetch::open(settings)?;
    let delay = batch::DelayPolicy::new(settings.delay_ms, settings.jitter_ms);

    let mut urls = if urls.is_empty() {
        listing::title_urls(site, source.as_mut(), delay).await?
    } else {
        for u in &urls {
            if Site::from_url(u) != Some(site) {
                warn!("{} does not look like a {} page", u, site);
            }
        }
        listing::dedupe(urls)
    };
    if let Some(n) = limit {
        urls.truncate(n);
    }
    if urls.is_empty() {
        println!("No title pages to visit.");
        return Ok(());
    }

    println!("Visiting {} {} pages...", urls.len(), site);
    let opts = batch::BatchOptions {
        site,
        delay,
        checkpoint_every: settings.checkpoint_every,
        out_dir: settings.out_dir.clone(),
    };
    let extractor = SiteExtractor::new(site);
    let (records, summary) = batch::run(source.as_mut(), &extractor, &urls, &opts).await;
    drop(source);

    let path = output::final_path(&settings.out_dir, site);
    match output::write_json(&path, &records) {
        Ok(()) => println!("Wrote {} records to {}", records.len(), path.display()),
        Err(e) => error!("Failed to write {}: {:#}", path.display(), e),
    }
    let saved = db::save_records(&conn, site, &run_id, &records)
        .and_then(|n| db::save_run(&conn, &run_id, site, &summary).map(|_| n));
    match saved {
        Ok(n) => println!("Saved {} rows to {} ({})", n, settings.db_path.display(), run_id),
        Err(e) => error!("Failed to save records: {:#}", e),
    }

    summary.print();
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
