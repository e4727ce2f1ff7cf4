use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ssm_cli::config::AppConfig;
use ssm_cli::render::{TableMode, print_imports, print_references, print_review};
use ssm_cli::session::{ReviewOutcome, run_review_session};
use ssm_gateway::{AlignOptions, GatewayClient, ingest_upload, refresh_references};
use ssm_review::{ReviewStore, SharedStore, ViewCache, lock_store};
use tracing::debug;

use crate::cli::{ExtractArgs, ReviewArgs};

fn table_mode() -> TableMode {
    if io::stdout().is_terminal() {
        TableMode::Terminal
    } else {
        TableMode::Plain
    }
}

fn new_store() -> SharedStore {
    let store = ReviewStore::shared();
    lock_store(&store).subscribe(|change| debug!(?change, "store changed"));
    store
}

fn client(config: &AppConfig) -> Result<GatewayClient> {
    GatewayClient::new(config.gateway.clone()).context("build gateway client")
}

pub async fn run_references(config: &AppConfig) -> Result<()> {
    let client = client(config)?;
    let store = new_store();
    refresh_references(&client, &store)
        .await
        .context("load reference schema")?;
    let view = lock_store(&store).derive_view();
    print_references(&view, table_mode());
    Ok(())
}

pub async fn run_extract(config: &AppConfig, args: &ExtractArgs) -> Result<()> {
    let client = client(config)?;
    let store = new_store();
    ingest_upload(&client, &store, &args.file)
        .await
        .with_context(|| format!("extract variables from {}", args.file.display()))?;
    let guard = lock_store(&store);
    if guard.imports().is_empty() {
        println!("No variables found in {}.", args.file.display());
        return Ok(());
    }
    print_imports(guard.imports(), &guard.derive_view(), table_mode());
    Ok(())
}

pub async fn run_review(config: &AppConfig, args: &ReviewArgs) -> Result<ReviewOutcome> {
    let client = client(config)?;
    let store = new_store();
    lock_store(&store).set_threshold(config.review.threshold);

    let bar = progress_bar(args.json);
    let options = AlignOptions {
        drop_stale: config.review.drop_stale,
    };
    let edits = args.edits();
    let outcome = run_review_session(&client, &store, &args.file, options, &edits, |progress| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.completed as u64);
        bar.set_message(progress.label.clone());
    })
    .await
    .with_context(|| format!("extract variables from {}", args.file.display()))?;
    bar.finish_and_clear();

    let guard = lock_store(&store);
    let mut cache = ViewCache::new();
    let view = cache.view(&guard);
    if args.json {
        let json = serde_json::to_string_pretty(view).context("serialize view")?;
        println!("{json}");
    } else {
        print_review(guard.imports(), view, table_mode());
    }
    drop(guard);

    if let Some(error) = &outcome.references_error {
        eprintln!("reference schema unavailable: {error}");
    }
    if !outcome.align.failures.is_empty() {
        eprintln!(
            "{} of {} variables could not be aligned",
            outcome.align.failures.len(),
            outcome.align.requested
        );
    }
    Ok(outcome)
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
