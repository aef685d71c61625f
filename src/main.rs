use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use bookwatch::reconcile::FloatingPanel;
use bookwatch::{Document, Fetcher, OverlayConfig, PassOutcome, Session, Thresholds, Trigger};
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

/// Annotate a schedule page with the booking counts of a workout feed
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Schedule page to annotate: a file path or an http(s) URL
    #[arg(long)]
    page: String,

    /// Workout API URL the page requested
    #[arg(long)]
    feed: String,

    /// Write the annotated page here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print what the pass did instead of the page
    #[arg(long)]
    summary: bool,

    /// Fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Delay between fetching the feed and annotating, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    #[arg(long)]
    user_agent: Option<String>,

    /// Extra request header as `Name: value`; may be repeated
    #[arg(long = "header", value_name = "NAME: VALUE")]
    headers: Vec<String>,

    /// Booking count at which a class is shown as critical
    #[arg(long)]
    critical: Option<u32>,

    /// Booking count at which a class is shown as moderate
    #[arg(long)]
    moderate: Option<u32>,
}

impl Cli {
    fn config(&self) -> anyhow::Result<OverlayConfig> {
        let mut config = OverlayConfig::default();
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if let Some(ms) = self.settle_ms {
            config.settle_delay_ms = ms;
        }
        if let Some(ua) = &self.user_agent {
            config.user_agent = ua.clone();
        }
        for header in &self.headers {
            let Some((name, value)) = header.split_once(':') else {
                bail!("header {:?} is not in `Name: value` form", header);
            };
            config
                .headers
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        let defaults = Thresholds::default();
        config.thresholds = Thresholds {
            critical: self.critical.unwrap_or(defaults.critical),
            moderate: self.moderate.unwrap_or(defaults.moderate),
        };
        config.validate()?;
        Ok(config)
    }
}

async fn load_page(fetcher: &Fetcher, page: &str) -> anyhow::Result<Document> {
    let source = if page.starts_with("http://") || page.starts_with("https://") {
        fetcher.fetch_text(page).await?
    } else {
        std::fs::read_to_string(page).with_context(|| format!("reading {}", page))?
    };
    Ok(Document::parse_html(&source))
}

fn print_summary(outcome: PassOutcome, document: &Document) {
    match outcome {
        PassOutcome::Idle => println!("no workout data; page left unchanged"),
        PassOutcome::Direct { matched } => println!("annotated {} workout element(s) by id", matched),
        PassOutcome::Heuristic { matched } => {
            println!("annotated {} workout name(s) by text match", matched)
        }
        PassOutcome::Panel { .. } => {
            println!("no matching elements; floating panel:");
            if let Some(panel) = FloatingPanel::find(document) {
                for section in panel.sections(document) {
                    println!("{} ({})", section.heading, section.date);
                    for row in section.rows {
                        println!("  {:<24} {:<13} {:>6}  {}", row.name, row.times, row.count, row.occupancy);
                    }
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let fetcher = Fetcher::new(&config)?;
    let document = load_page(&fetcher, &cli.page).await?;
    let mut session = Session::new(config.clone(), document)?;

    if session.on_trigger(&Trigger::new(cli.feed.clone())).await {
        tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
    }
    let outcome = session.render_pass();
    info!("pass outcome: {:?}", outcome);

    if cli.summary {
        print_summary(outcome, session.document());
        return Ok(());
    }

    let html = session.document().to_html();
    match &cli.output {
        Some(path) => std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", html),
    }
    Ok(())
}
