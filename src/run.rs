use crate::cli::Args;
use crate::error::{ErrorKind, Exit, Result};
use crate::report;
use async_trait::async_trait;
use exn::ResultExt;
use futures::StreamExt;
use photosync_cache::HashCache;
use photosync_config::{Config, expand_home};
use photosync_engine::scan::{Filter, LocalFile, ScanEntry, scan};
use photosync_engine::sweep::{Confirm, DeletePolicy, sweep};
use photosync_engine::sync::sync;
use photosync_engine::{Context, Summary, Tally};
use photosync_storage::backend::{DryRunStore, S3Options, S3Store};
use photosync_storage::{Destination, ObjectStore, StoreHandle};
use std::collections::HashSet;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

/// Asks on the terminal before each delete. Anything but y/yes declines.
struct TerminalPrompt;

#[async_trait]
impl Confirm for TerminalPrompt {
    async fn confirm(&self, uri: &str) -> bool {
        let question = format!("Delete remote object {uri}? [y/N]: ");
        // Off the runtime, so an interrupt is still noticed while waiting.
        match tokio::task::spawn_blocking(move || ask(&question)).await {
            Ok(Ok(answer)) => accepts(&answer),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "cannot read answer; not deleting");
                false
            },
            Err(e) => {
                tracing::warn!(error = %e, "prompt aborted; not deleting");
                false
            },
        }
    }
}

fn accepts(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}

fn ask(question: &str) -> std::io::Result<String> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(question.as_bytes())?;
    stdout.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// A required value from configuration, or from the terminal if there is one.
fn require(value: Option<String>, flag: &str, question: &str, interactive: bool) -> Result<String> {
    let value = match value {
        Some(value) => value,
        None if interactive => ask(question).or_raise(|| ErrorKind::Usage(format!("{flag} is required")))?,
        None => exn::bail!(ErrorKind::Usage(format!("{flag} is required in non-interactive mode"))),
    };
    if value.is_empty() {
        exn::bail!(ErrorKind::Usage(format!("{flag} is required")));
    }
    Ok(value)
}

/// Everything a run needs, validated before any work starts.
#[derive(Debug)]
struct Plan {
    source: PathBuf,
    ctx: Context,
    filter: Filter,
    follow_symlinks: bool,
    delete: Option<DeletePolicy>,
    cache: PathBuf,
}

/// `interactive` says whether there is a terminal to prompt on.
fn plan(args: &Args, config: &Config, interactive: bool) -> Result<Plan> {
    let source = require(
        config.source.as_ref().map(|path| path.to_string_lossy().into_owned()),
        "--source",
        "Local directory to sync: ",
        interactive,
    )?;
    let dest = require(config.dest.clone(), "--dest", "S3 destination (s3://bucket/prefix): ", interactive)?;

    let source = expand_home(Path::new(&source));
    let source = match std::fs::canonicalize(&source) {
        Ok(source) if source.is_dir() => source,
        _ => exn::bail!(ErrorKind::Usage(format!(
            "source directory does not exist or is not a directory: {}",
            source.display()
        ))),
    };
    let destination: Destination = dest.parse::<Destination>().or_raise(|| ErrorKind::Usage(format!("invalid destination: {dest}")))?;
    let filter = Filter::new(&config.include, &config.exclude).or_raise(|| ErrorKind::Config)?;
    let delete = match args.delete {
        true => {
            let prompt = interactive.then(|| Box::new(TerminalPrompt) as Box<dyn Confirm>);
            let policy = DeletePolicy::resolve(args.dry_run, args.yes, prompt).or_raise(|| {
                ErrorKind::Usage("--delete needs --yes or an interactive terminal".to_string())
            })?;
            Some(policy)
        },
        false => None,
    };
    let ctx = Context {
        destination,
        dry_run: args.dry_run,
        dedup: config.content_dedupe,
        workers: config.workers,
    };
    Ok(Plan { source, ctx, filter, follow_symlinks: config.follow_symlinks, delete, cache: config.cache_path() })
}

async fn connect(config: &Config, dry_run: bool) -> Result<StoreHandle> {
    let options = S3Options {
        profile: config.profile.clone(),
        region: config.region.clone(),
        endpoint: config.endpoint.clone(),
    };
    let store: StoreHandle = Arc::new(S3Store::connect("s3", &options).await.or_raise(|| ErrorKind::Connect)?);
    Ok(match dry_run {
        true => Arc::new(DryRunStore::new(store)),
        false => store,
    })
}

pub async fn run(args: Args) -> Result<Exit> {
    let config = Config::load(args.config.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;
    let plan = plan(&args, &config, std::io::stdin().is_terminal())?;
    let store = connect(&config, plan.ctx.dry_run).await?;
    let cache = HashCache::load(&plan.cache);
    let tally = Tally::default();
    tracing::info!(
        source = %plan.source.display(),
        destination = %plan.ctx.destination,
        workers = plan.ctx.workers,
        dry_run = plan.ctx.dry_run,
        "starting sync"
    );

    let started = Instant::now();
    tokio::select! {
        () = execute(store.as_ref(), &cache, &plan, &tally) => (),
        _ = tokio::signal::ctrl_c() => return Ok(interrupted(&cache)),
    }
    cache.save().or_raise(|| ErrorKind::CacheSave)?;

    let summary = tally.snapshot();
    println!("{}", report::summary_line(&summary, started.elapsed()));
    Ok(exit_for(&summary))
}

fn exit_for(summary: &Summary) -> Exit {
    match summary.is_clean() {
        true => Exit::Clean,
        false => Exit::Failures,
    }
}

/// Keep whatever hashes were computed before the interrupt. In-flight
/// uploads are abandoned.
fn interrupted(cache: &HashCache) -> Exit {
    eprintln!("ERROR interrupted");
    if let Err(e) = cache.save() {
        tracing::warn!(error = ?e, "cannot save hash cache after interrupt");
    }
    Exit::Interrupted
}

async fn execute(store: &dyn ObjectStore, cache: &HashCache, plan: &Plan, tally: &Tally) {
    let files = discover(plan).await;
    let local_keys: HashSet<String> = files.iter().map(|file| plan.ctx.destination.key_for(&file.relative)).collect();

    let mut events = pin!(sync(store, cache, &plan.ctx, tally, files));
    while let Some(event) = events.next().await {
        if let Some(line) = report::sync_line(&event, plan.ctx.dry_run) {
            println!("{line}");
        }
    }

    if let Some(policy) = &plan.delete {
        let mut events = pin!(sweep(store, &plan.ctx.destination, &local_keys, policy, tally));
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(line) = report::sweep_line(&event) {
                        println!("{line}");
                    }
                },
                Err(e) => println!("ERROR {e}"),
            }
        }
    }
}

/// Walk the source tree on a blocking thread.
async fn discover(plan: &Plan) -> Vec<LocalFile> {
    let root = plan.source.clone();
    let filter = plan.filter.clone();
    let follow_symlinks = plan.follow_symlinks;
    let walk = tokio::task::spawn_blocking(move || {
        scan(&root, &filter, follow_symlinks)
            .filter_map(|entry| match entry {
                ScanEntry::File(file) => Some(file),
                ScanEntry::Vanished(path) => {
                    tracing::debug!(path = %path.display(), "vanished during scan");
                    None
                },
                ScanEntry::Filtered(_) => None,
            })
            .collect::<Vec<_>>()
    });
    match walk.await {
        Ok(files) => files,
        Err(e) => {
            // Only reachable if the walk panicked.
            tracing::error!(error = %e, "directory scan aborted");
            Vec::new()
        },
    }
}
