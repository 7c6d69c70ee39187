use std::path::PathBuf;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::fetch::PageSource;
use crate::output;
use crate::parser::{self, PageExtractor};
use crate::record::TitleRecord;
use crate::sites::Site;

/// Pause between two visits: a fixed part plus uniform jitter.
#[derive(Debug, Clone, Copy)]
pub struct DelayPolicy {
    base_ms: u64,
    jitter_ms: u64,
}

impl DelayPolicy {
    pub const fn new(base_ms: u64, jitter_ms: u64) -> Self {
        DelayPolicy { base_ms, jitter_ms }
    }

    pub fn next(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            fastrand::u64(0..=self.jitter_ms)
        };
        Duration::from_millis(self.base_ms + jitter)
    }
}

pub struct BatchOptions {
    pub site: Site,
    pub delay: DelayPolicy,
    /// 0 disables checkpoints.
    pub checkpoint_every: usize,
    pub out_dir: PathBuf,
}

/// Visit `urls` one at a time and extract a record from each.
///
/// A failed fetch or extraction becomes an error record for that page and
/// the batch goes on. Checkpoint write failures are logged only.
pub async fn run(
    source: &mut dyn PageSource,
    extractor: &dyn PageExtractor,
    urls: &[String],
    opts: &BatchOptions,
) -> (Vec<TitleRecord>, Summary) {
    let t0 = Instant::now();
    let total = urls.len();
    let mut records = Vec::with_capacity(total);

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta}) {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    for (i, url) in urls.iter().enumerate() {
        pb.set_message(url.clone());
        let record = match source.fetch(url).await {
            Ok(page) => {
                let record = parser::extract_record(extractor, &page);
                if let Some(e) = &record.error {
                    warn!("No record for {}: {}", url, e);
                }
                record
            }
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                TitleRecord::failed(url.as_str(), e.to_string())
            }
        };
        records.push(record);
        pb.inc(1);

        if opts.checkpoint_every > 0 && records.len() % opts.checkpoint_every == 0 {
            let path = output::checkpoint_path(&opts.out_dir, opts.site, records.len());
            match output::write_json(&path, &records) {
                Ok(()) => info!("Checkpoint: {} records -> {}", records.len(), path.display()),
                Err(e) => error!("Checkpoint {} failed: {:#}", path.display(), e),
            }
        }

        if i + 1 < total {
            tokio::time::sleep(opts.delay.next()).await;
        }
    }

    pb.finish_and_clear();
    let summary = Summary::from_records(&records, t0.elapsed());
    info!(
        "Visited {} pages ({} ok, {} errors)",
        summary.total,
        summary.total - summary.errors,
        summary.errors
    );
    (records, summary)
}

/// End-of-run counts: pages, failures, and how often each field was found.
pub struct Summary {
    pub total: usize,
    pub errors: usize,
    pub fields: Vec<(&'static str, usize)>,
    pub elapsed: Duration,
}

impl Summary {
    pub fn from_records(records: &[TitleRecord], elapsed: Duration) -> Self {
        let ok: Vec<&TitleRecord> = records.iter().filter(|r| !r.is_error()).collect();
        let count = |f: fn(&TitleRecord) -> bool| ok.iter().filter(|r| f(r)).count();

        let fields = vec![
            ("titleName", count(|r| r.title_name.is_some())),
            ("coverImageUrl", count(|r| r.cover_image_url.is_some())),
            ("artAuthor", count(|r| r.art_author.is_some())),
            ("storyAuthor", count(|r| r.story_author.is_some())),
            ("originalAuthor", count(|r| r.original_author.is_some())),
            ("likeCount", count(|r| r.like_count.is_some())),
            ("viewCount", count(|r| r.view_count.is_some())),
            ("rating", count(|r| r.rating.is_some())),
            ("ageRating", count(|r| r.age_rating.is_some())),
            ("status", count(|r| r.status.is_some())),
            ("genre", count(|r| r.genre.is_some())),
            ("tagline", count(|r| r.tagline.is_some())),
            ("tags", count(|r| !r.tags.is_empty())),
        ];

        Summary {
            total: records.len(),
            errors: records.len() - ok.len(),
            fields,
            elapsed,
        }
    }

    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.total - self.errors) as f64 * 100.0 / self.total as f64
        }
    }

    pub fn print(&self) {
        println!(
            "Visited {} pages: {} ok, {} errors ({:.1}% success) in {:.1}s",
            self.total,
            self.total - self.errors,
            self.errors,
            self.success_pct(),
            self.elapsed.as_secs_f64()
        );
        let ok = self.total - self.errors;
        for (name, n) in &self.fields {
            println!("  {:<15} {:>5}/{}", name, n, ok);
        }
    }
}
