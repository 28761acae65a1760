//! remacro - record and replay clicks and keystrokes
//!
//! `session` listens system-wide: F9 toggles recording, F10 plays the
//! recorded macro, Esc cancels. The other commands work on saved macro
//! files without touching the desktop (except `play`).
//!
//! Supported: macOS, Windows. Elsewhere only `--dry-run` playback and the
//! file commands work.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use remacro_core::prelude::*;
use remacro_core::{parse_delay, storage};
use remacro_recorder::platform;
use remacro_recorder::prelude::*;

#[derive(Parser)]
#[command(name = "remacro")]
#[command(about = "remacro - record and replay mouse clicks and keystrokes")]
#[command(version)]
struct Cli {
    /// Macro directory (default: ~/.remacro)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log actions instead of injecting them
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for hotkeys: F9 record, F10 play, Esc cancel
    Session {
        /// Start with this macro loaded
        #[arg(long)]
        load: Option<String>,
        /// Save the timeline here on exit
        #[arg(short, long)]
        output: Option<String>,
        /// Save on exit under a timestamped name in the macro directory
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, default_value = "1.3")]
        speed: String,
        #[arg(short, long, default_value = "1")]
        loops: String,
    },
    /// Play a saved macro
    Play {
        file: String,
        #[arg(short, long, default_value = "1.3")]
        speed: String,
        #[arg(short, long, default_value = "1")]
        loops: String,
        /// Seconds to wait before starting
        #[arg(long, default_value = "2")]
        countdown: u64,
    },
    /// List a macro's events
    Show {
        file: String,
    },
    /// List saved macros
    List,
    /// Delete a macro file
    DeleteFile {
        file: String,
    },
    /// Delete events (1-based indices)
    Delete {
        file: String,
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// Set one event's delay in seconds
    SetDelay {
        file: String,
        index: usize,
        value: String,
    },
    /// Add seconds to the delay of several events
    AddDelay {
        file: String,
        #[arg(long, allow_hyphen_values = true)]
        delta: f64,
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// Remove every event from a macro
    Clear {
        file: String,
    },
    /// Check/request permissions
    Permissions {
        #[arg(long)]
        request: bool,
    },
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl Output<()> {
    fn err(e: Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(e),
        }
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

#[derive(Serialize)]
struct EventLine {
    index: usize,
    event: String,
    delay_before: f64,
}

#[derive(Serialize)]
struct ReportView {
    actions: usize,
    skipped: usize,
    failed: usize,
    loops_completed: u32,
    cancelled: bool,
    elapsed_ms: u64,
}

impl From<&PlaybackReport> for ReportView {
    fn from(r: &PlaybackReport) -> Self {
        Self {
            actions: r.actions,
            skipped: r.skipped,
            failed: r.failed,
            loops_completed: r.loops_completed,
            cancelled: r.cancelled,
            elapsed_ms: r.elapsed.as_millis() as u64,
        }
    }
}

struct Ctx {
    storage: MacroStorage,
    json: bool,
    dry_run: bool,
}

impl Ctx {
    fn injector(&self) -> Result<Box<dyn InputInjector>> {
        if self.dry_run {
            Ok(Box::new(DryRunInjector::new()))
        } else {
            Ok(platform::native_injector()?)
        }
    }

    /// JSON when asked for, otherwise the text lines
    fn emit<T: Serialize>(&self, data: T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            print_json(&Output::ok(data))
        } else {
            text(&data);
            Ok(())
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<Error>() {
            Some(err) if json => {
                let _ = print_json(&Output::err(err.clone()));
            }
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "remacro=debug,remacro_recorder=debug,remacro_core=debug"
    } else {
        "remacro=info,remacro_recorder=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let storage = match &cli.dir {
        Some(dir) => MacroStorage::with_dir(dir)?,
        None => MacroStorage::new()?,
    };
    let ctx = Ctx {
        storage,
        json: cli.json,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Session { load, output, name, speed, loops } => session(
            &ctx,
            load.as_deref(),
            output.as_deref(),
            name.as_deref(),
            PlaybackParams::parse(&speed, &loops),
        ),
        Commands::Play { file, speed, loops, countdown } => {
            play(&ctx, &file, PlaybackParams::parse(&speed, &loops), countdown)
        }
        Commands::Show { file } => show(&ctx, &file),
        Commands::List => list(&ctx),
        Commands::DeleteFile { file } => delete_file(&ctx, &file),
        Commands::Delete { file, indices } => edit_file(&ctx, &file, |t| {
            let removed = t.delete(&zero_based(&indices)?);
            Ok(format!("Deleted {} event(s)", removed))
        }),
        Commands::SetDelay { file, index, value } => edit_file(&ctx, &file, |t| {
            let i = zero_based(&[index])?[0];
            t.set_delay(i, parse_delay(&value)?)?;
            Ok(format!("Event {} delay set to {}s", index, value.trim()))
        }),
        Commands::AddDelay { file, delta, indices } => edit_file(&ctx, &file, |t| {
            let changed = t.add_delay(&zero_based(&indices)?, delta)?;
            Ok(format!("Adjusted {} event(s) by {:+}s", changed, delta))
        }),
        Commands::Clear { file } => edit_file(&ctx, &file, |t| {
            t.clear();
            Ok("Cleared all events".to_string())
        }),
        Commands::Permissions { request } => permissions(&ctx, request),
    }
}

/// Command-line indices start at 1
fn zero_based(indices: &[usize]) -> remacro_core::Result<Vec<usize>> {
    indices
        .iter()
        .map(|&i| {
            i.checked_sub(1)
                .ok_or_else(|| Error::validation("Event indices start at 1"))
        })
        .collect()
}

// ── Session ─────────────────────────────────────────────────────────────────

fn session(
    ctx: &Ctx,
    load: Option<&str>,
    output: Option<&str>,
    name: Option<&str>,
    params: PlaybackParams,
) -> Result<()> {
    let perms = platform::check_permissions();
    if !perms.all_granted() {
        eprintln!("Accessibility and Input Monitoring permissions are required.");
        platform::request_permissions();
        return Ok(());
    }

    let config = EngineConfig {
        playback: params,
        ..Default::default()
    };
    let engine = Engine::with_config(config, ctx.injector()?);
    if let Some(file) = load {
        let doc = engine.load(ctx.storage.resolve(file))?;
        println!("Loaded {} events", doc.timeline.len());
    }

    let listener = platform::listen(engine.config().notify_buffer)?;
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    println!(
        "F9: start/stop recording | F10: play ({}x, {} loop(s)) | Esc: cancel | Ctrl+C: quit",
        params.speed(),
        params.loops()
    );

    while running.load(Ordering::SeqCst) && listener.is_running() {
        if let Some(n) = listener.recv_timeout(Duration::from_millis(50)) {
            if let Err(e) = engine.handle(&n) {
                println!("{}", e.message);
            }
        }
        for event in engine.notifications().try_iter() {
            print_engine_event(&event);
        }
    }

    engine.request_cancel()?;
    engine.wait_for_playback();
    listener.stop();
    debug!("listener stopped");

    let timeline = engine.timeline();
    if timeline.is_empty() {
        return Ok(());
    }
    if let Some(file) = output {
        let path = ctx.storage.resolve(file);
        engine.save(&path)?;
        println!("Saved: {}", path.display());
    }
    if let Some(name) = name {
        let path = ctx.storage.save_named(name, &timeline)?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

fn print_engine_event(event: &EngineEvent) {
    match event {
        EngineEvent::StateChanged(EngineState::Recording) => println!("Recording..."),
        EngineEvent::StateChanged(EngineState::Playing) => println!("Playing..."),
        EngineEvent::StateChanged(EngineState::Idle) => println!("Idle"),
        EngineEvent::EventCaptured { index, event } => println!("{:>4}: {}", index + 1, event),
        EngineEvent::CancelRequested => println!("Cancelling..."),
        EngineEvent::PlaybackFinished(report) => print_report(report),
    }
}

fn print_report(report: &PlaybackReport) {
    let status = if report.cancelled { "Cancelled" } else { "Done" };
    println!(
        "{}: {} actions, {} skipped, {} failed, {} loop(s) in {:.1}s",
        status,
        report.actions,
        report.skipped,
        report.failed,
        report.loops_completed,
        report.elapsed.as_secs_f64()
    );
}

// ── File commands ───────────────────────────────────────────────────────────

fn play(ctx: &Ctx, file: &str, params: PlaybackParams, countdown: u64) -> Result<()> {
    let engine = Engine::new(ctx.injector()?);
    let doc = engine.load(ctx.storage.resolve(file))?;

    let e = engine.clone();
    ctrlc::set_handler(move || {
        if let Err(err) = e.request_cancel() {
            warn!(error = %err, "cancel failed");
        }
    })?;

    if !ctx.json {
        println!(
            "Playing {} events at {}x, {} loop(s)...",
            doc.timeline.len(),
            params.speed(),
            params.loops()
        );
    }
    if countdown > 0 && !ctx.dry_run {
        if !ctx.json {
            println!("Starting in {} seconds (Ctrl+C cancels)...", countdown);
        }
        std::thread::sleep(Duration::from_secs(countdown));
    }

    engine.play_with(params)?;
    let Some(report) = engine.wait_for_playback() else {
        anyhow::bail!("playback thread panicked");
    };
    ctx.emit(ReportView::from(&report), |_| print_report(&report))
}

fn show(ctx: &Ctx, file: &str) -> Result<()> {
    let doc = storage::load(ctx.storage.resolve(file))?;
    let lines: Vec<EventLine> = doc
        .timeline
        .iter()
        .enumerate()
        .map(|(i, e)| EventLine {
            index: i + 1,
            event: e.to_string(),
            delay_before: e.delay_before(),
        })
        .collect();

    ctx.emit(lines, |lines| {
        println!("Version: {}", doc.version);
        println!("Events: {} ({:.2}s of delays)", lines.len(), doc.timeline.total_delay());
        if doc.skipped > 0 {
            println!("Skipped: {} of unknown type", doc.skipped);
        }
        for l in lines {
            println!("{:>4}: {}", l.index, l.event);
        }
    })
}

fn list(ctx: &Ctx) -> Result<()> {
    let files = ctx.storage.list()?;
    ctx.emit(files, |files| {
        if files.is_empty() {
            println!("No macros saved.");
        } else {
            for f in files {
                println!("{}", f);
            }
        }
    })
}

fn delete_file(ctx: &Ctx, file: &str) -> Result<()> {
    ctx.storage.delete(file)?;
    ctx.emit(file, |file| println!("Deleted: {}", file))
}

/// Load, edit and write back a macro file
fn edit_file(
    ctx: &Ctx,
    file: &str,
    f: impl FnOnce(&mut Timeline) -> remacro_core::Result<String>,
) -> Result<()> {
    let path = ctx.storage.resolve(file);
    let mut timeline = storage::load(&path)?.timeline;
    let message = f(&mut timeline)?;
    storage::save(&path, &timeline)?;
    ctx.emit(message, |m| println!("{} ({} events left)", m, timeline.len()))
}

fn permissions(ctx: &Ctx, request: bool) -> Result<()> {
    let perms = if request {
        platform::request_permissions()
    } else {
        platform::check_permissions()
    };
    if ctx.json {
        return print_json(&Output::ok(serde_json::json!({
            "accessibility": perms.accessibility,
            "input_monitoring": perms.input_monitoring,
        })));
    }
    println!("Accessibility: {}", if perms.accessibility { "OK" } else { "DENIED" });
    println!("Input Monitoring: {}", if perms.input_monitoring { "OK" } else { "DENIED" });
    if !perms.all_granted() && !request {
        println!("\nRun with --request to request permissions");
    }
    Ok(())
}
