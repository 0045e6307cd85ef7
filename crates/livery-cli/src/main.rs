// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use livery_core::deleter::FsDeleter;
use livery_core::livery::{group_by_aircraft, AircraftGroup};
use livery_core::panel::PanelServices;
use livery_core::refresh::RefreshCoordinator;
use livery_core::scanner::DiskScanner;
use livery_core::settings::SettingsManager;
use livery_core::uninstall::{PreconditionPolicy, UninstallOrchestrator, UninstallOutcome};
use livery_core::{
    FileListing, Installed, LiveriesRoot, Livery, LiveryKey, LiverySet, LiveryRegistry,
};
use rust_i18n::t;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::PathBuf;

mod terminal;
use terminal::{I18nTranslator, TerminalNotifier, TerminalPrompt};

rust_i18n::i18n!("locales", fallback = "en");

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the installed liveries folder
    #[arg(short, long, env = "LIVERY_ROOT")]
    root: Option<PathBuf>,

    /// Cached remote file listing (JSON)
    #[arg(long, env = "LIVERY_LISTING")]
    listing: Option<PathBuf>,

    /// Interface language
    #[arg(long)]
    locale: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed liveries grouped by aircraft
    List {
        /// Only show this aircraft (case-insensitive)
        #[arg(long)]
        aircraft: Option<String>,
    },
    /// Show one line per aircraft with livery counts and thumbnails
    Aircraft,
    /// Rescan the liveries folder
    Refresh,
    /// List liveries with a newer version in the file listing
    Outdated,
    /// Remove every installed livery
    UninstallAll {
        /// Only remove liveries of this aircraft (case-insensitive)
        #[arg(long)]
        aircraft: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
        /// Keep going after a missing folder or an unexpected delete error
        #[arg(long)]
        keep_going: bool,
    },
    /// Remove specific liveries given as AIRCRAFT/FILE_NAME
    Remove {
        #[arg(required = true)]
        keys: Vec<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Save default options
    Config {
        #[arg(long)]
        set_root: Option<PathBuf>,
        #[arg(long)]
        set_listing: Option<PathBuf>,
        #[arg(long)]
        set_locale: Option<String>,
        #[arg(long)]
        assume_yes: Option<bool>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_dir = livery_core::get_config_root();
    if std::fs::create_dir_all(&log_dir).is_ok() {
        if let Ok(file) = File::create(log_dir.join("livery-manager.log")) {
            loggers.push(WriteLogger::new(LevelFilter::Info, Config::default(), file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn parse_key(raw: &str) -> Result<LiveryKey> {
    let (airplane, file_name) = raw
        .split_once('/')
        .ok_or_else(|| anyhow!("Expected AIRCRAFT/FILE_NAME, got '{}'", raw))?;
    Ok(LiveryKey::new(airplane, file_name))
}

fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    format!("{:.1} MB", bytes as f64 / MB)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_manager = SettingsManager::new();
    let mut settings = settings_manager.load()?;

    if let Commands::Config {
        set_root,
        set_listing,
        set_locale,
        assume_yes,
    } = &cli.command
    {
        if let Some(root) = set_root {
            LiveriesRoot::new(root)?;
            settings.liveries_root = Some(root.clone());
        }
        if let Some(listing) = set_listing {
            settings.listing_path = Some(listing.clone());
        }
        if let Some(locale) = set_locale {
            settings.locale = locale.clone();
        }
        if let Some(yes) = assume_yes {
            settings.assume_yes = *yes;
        }
        settings_manager.save(&settings)?;
        println!("Saved settings to {}", settings_manager.path().display());
        println!("{:#?}", settings);
        return Ok(());
    }

    rust_i18n::set_locale(cli.locale.as_deref().unwrap_or(&settings.locale));

    let root = match cli.root.or(settings.liveries_root.clone()) {
        Some(path) => path,
        None => LiveriesRoot::try_find_root().ok_or_else(|| {
            anyhow!("Could not find a liveries folder. Please specify with --root.")
        })?,
    };
    let root = LiveriesRoot::new(&root)?.root;

    let listing = match cli.listing.or(settings.listing_path.clone()) {
        Some(path) => Some(
            LiveriesRoot::load_listing(&path)
                .with_context(|| format!("Failed to load file listing {}", path.display()))?,
        ),
        None => None,
    };

    let registry = LiveryRegistry::new();
    let scanner = DiskScanner::new(&root);
    let refresher = RefreshCoordinator::new(&registry, &scanner);

    match &cli.command {
        Commands::List { aircraft } => {
            if let Some(result) = refresher.ensure_loaded() {
                result?;
            }
            print_list(&registry, listing.as_ref(), aircraft.as_deref());
        }
        Commands::Aircraft => {
            if let Some(result) = refresher.ensure_loaded() {
                result?;
            }
            let snapshot = registry.snapshot();
            let installed = snapshot.installed.liveries().unwrap_or(&[]);
            for group in group_by_aircraft(installed, listing.as_ref()) {
                println!(
                    "{:<24} {:>4} liveries  {}",
                    group.name,
                    group.livery_count,
                    group.thumbnails.join(", ")
                );
            }
        }
        Commands::Refresh => {
            println!(
                "{}",
                t!("manager.pages.installed_liveries.components.refresh_box.refreshing_now")
            );
            let count = refresher.refresh_manual()?;
            let when = registry
                .snapshot()
                .last_refreshed
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("Found {} liveries in {} ({})", count, root.display(), when);
        }
        Commands::Outdated => {
            let listing = listing
                .as_ref()
                .ok_or_else(|| anyhow!("No file listing configured. Use --listing."))?;
            refresher.refresh()?;
            let snapshot = registry.snapshot();
            let installed = snapshot.installed.liveries().unwrap_or(&[]);
            for livery in listing.outdated(installed) {
                registry.add_to_set(LiverySet::Updating, livery);
            }
            let updating = registry.snapshot();
            for livery in updating.set(LiverySet::Updating) {
                println!("{}  ({})", livery.key(), livery.label());
            }
            println!(
                "{} of {} liveries have updates",
                updating.updating.len(),
                installed.len()
            );
        }
        Commands::UninstallAll {
            aircraft,
            yes,
            keep_going,
        } => {
            refresher.refresh()?;
            let snapshot = registry.snapshot();
            let batch: Vec<_> = snapshot
                .installed
                .liveries()
                .unwrap_or(&[])
                .iter()
                .filter(|l| {
                    aircraft
                        .as_ref()
                        .map_or(true, |a| l.airplane.eq_ignore_ascii_case(a))
                })
                .cloned()
                .map(Some)
                .collect();

            let policy = if *keep_going {
                PreconditionPolicy::SkipItem
            } else {
                PreconditionPolicy::AbortBatch
            };
            println!(
                "{}",
                t!("manager.pages.installed_liveries.button.remove_all_liveries")
            );
            if batch.len() > 1 {
                println!(
                    "{}",
                    t!("manager.pages.installed_liveries.warning_cannot_remove_multiple_liveries")
                );
            }
            let assume_yes = *yes || settings.assume_yes;
            let outcome = run_uninstall(&root, refresher, assume_yes, policy, &batch);
            finish(outcome)?;
        }
        Commands::Remove { keys, yes } => {
            refresher.refresh()?;
            let keys = keys
                .iter()
                .map(|k| parse_key(k))
                .collect::<Result<Vec<_>>>()?;

            let deleter = FsDeleter::new(&root);
            let notifier = TerminalNotifier::default();
            let prompt = TerminalPrompt {
                assume_yes: *yes || settings.assume_yes,
            };
            let services = PanelServices {
                notifier: &notifier,
                prompt: &prompt,
                translator: &I18nTranslator,
            };
            let orchestrator = UninstallOrchestrator::new(refresher, &deleter, services);
            let batch = orchestrator.resolve_batch(&keys);
            finish(orchestrator.uninstall_all(&batch))?;
        }
        Commands::Config { .. } => unreachable!(),
    }

    Ok(())
}

fn run_uninstall(
    root: &std::path::Path,
    refresher: RefreshCoordinator<'_>,
    assume_yes: bool,
    policy: PreconditionPolicy,
    batch: &[Option<Livery>],
) -> UninstallOutcome {
    let deleter = FsDeleter::new(root);
    let notifier = TerminalNotifier::default();
    let prompt = TerminalPrompt { assume_yes };
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &I18nTranslator,
    };

    UninstallOrchestrator::new(refresher, &deleter, services)
        .with_policy(policy)
        .uninstall_all(batch)
}

fn finish(outcome: UninstallOutcome) -> Result<()> {
    match outcome {
        UninstallOutcome::NothingToRemove | UninstallOutcome::Declined => Ok(()),
        UninstallOutcome::Completed(report) => {
            for failure in &report.failures {
                let what = failure
                    .key
                    .as_ref()
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| format!("item {}", failure.position));
                eprintln!("  {}: {} ({})", what, failure.kind, failure.detail);
            }
            if report.failed > 0 {
                Err(anyhow!(
                    "{} of {} liveries could not be removed",
                    report.failed,
                    report.total
                ))
            } else {
                Ok(())
            }
        }
    }
}

/// Flags outdated liveries as updating and expands the aircraft matching
/// `only` (every aircraft when `None`).
fn mark_list_state(
    registry: &LiveryRegistry,
    installed: &[Livery],
    listing: Option<&FileListing>,
    only: Option<&str>,
) -> Vec<AircraftGroup> {
    if let Some(listing) = listing {
        for livery in listing.outdated(installed) {
            registry.add_to_set(LiverySet::Updating, livery);
        }
    }
    let groups = group_by_aircraft(installed, listing);
    for group in &groups {
        let expanded = only.map_or(true, |a| a.eq_ignore_ascii_case(&group.name));
        registry.set_expanded(&group.name, expanded);
    }
    groups
}

fn print_list(registry: &LiveryRegistry, listing: Option<&FileListing>, only: Option<&str>) {
    let snapshot = registry.snapshot();
    let installed = match &snapshot.installed {
        Installed::Loaded(list) => list,
        Installed::Failed(e) => {
            eprintln!("Could not load liveries: {}", e);
            return;
        }
        Installed::Unloaded | Installed::Loading => return,
    };

    let groups = mark_list_state(registry, installed, listing, only);

    // Status flags and expansion are read back from the registry
    let state = registry.snapshot();
    for group in &groups {
        if !state.expanded.contains(&group.name) {
            println!("+ {} ({})", group.name, group.livery_count);
            continue;
        }
        println!("- {} ({})", group.name, group.livery_count);

        for livery in installed
            .iter()
            .filter(|l| l.airplane.to_lowercase() == group.name)
        {
            let status = if state.contains(LiverySet::Updating, livery) {
                "[U]"
            } else {
                "[ ]"
            };
            println!(
                "  {} {:<40} {:>10}  {}",
                status,
                livery.label(),
                format_size(livery.size),
                livery.last_modified
            );
        }
    }
}
