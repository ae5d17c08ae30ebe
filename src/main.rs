//! `rrational`: batch inspector for recordings and saved corrections.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use rrational::corrections::artifacts::{self, MergedArtifacts};
use rrational::corrections::nn_intervals::{self, NnSummary};
use rrational::corrections::validations::{self, SectionValidations};
use rrational::corrections::{Loaded, StoreLocations, migrate, participant_events};
use rrational::config::{self, IngestSettings};
use rrational::recordings::{discover_recordings, load_recording};
use rrational::{app_dirs, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(command) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init("info") {
        eprintln!("Logging disabled: {err}");
    }
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    match command {
        Command::Scan(options) => scan(&settings, options),
        Command::Status(options) => status(&settings, options),
        Command::Reset(options) => reset(&settings, options),
        Command::MigrateLegacy => migrate_legacy(),
        Command::Config => show_config(&settings),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Scan(ScanOptions),
    Status(StatusOptions),
    Reset(ResetOptions),
    MigrateLegacy,
    Config,
}

#[derive(Debug, Clone, PartialEq)]
struct ScanOptions {
    root: PathBuf,
    pattern: Option<String>,
    json: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct StoreArgs {
    participant: String,
    project: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
struct StatusOptions {
    store: StoreArgs,
    json: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ResetOptions {
    store: StoreArgs,
    category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Artifacts,
    Validations,
    Nn,
    Events,
    All,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "artifacts" => Ok(Self::Artifacts),
            "validations" => Ok(Self::Validations),
            "nn" => Ok(Self::Nn),
            "events" => Ok(Self::Events),
            "all" => Ok(Self::All),
            other => Err(format!(
                "Unknown category: {other} (expected artifacts, validations, nn, events or all)"
            )),
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<Command>, String> {
    let Some((name, rest)) = args.split_first() else {
        println!("{}", help_text());
        return Ok(None);
    };
    let mut positional: Vec<String> = Vec::new();
    let mut pattern = None;
    let mut project = None;
    let mut data_dir = None;
    let mut category = Category::All;
    let mut json = false;
    let mut idx = 0usize;
    while idx < rest.len() {
        let flag = rest[idx].as_str();
        let mut value = || {
            idx += 1;
            rest.get(idx)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--json" => json = true,
            "--pattern" => pattern = Some(value()?),
            "--project" => project = Some(PathBuf::from(value()?)),
            "--data-dir" => data_dir = Some(PathBuf::from(value()?)),
            "--category" => category = value()?.parse()?,
            unknown if unknown.starts_with('-') => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
            _ => positional.push(rest[idx].clone()),
        }
        idx += 1;
    }

    let single_positional = |what: &str| -> Result<String, String> {
        match positional.as_slice() {
            [value] => Ok(value.clone()),
            [] => Err(format!("{name} requires <{what}>")),
            _ => Err(format!("{name} takes exactly one <{what}>")),
        }
    };
    let command = match name.as_str() {
        "-h" | "--help" | "help" => {
            println!("{}", help_text());
            return Ok(None);
        }
        "scan" => Command::Scan(ScanOptions {
            root: PathBuf::from(single_positional("root")?),
            pattern,
            json,
        }),
        "status" => Command::Status(StatusOptions {
            store: StoreArgs {
                participant: single_positional("participant")?,
                project,
                data_dir,
            },
            json,
        }),
        "reset" => Command::Reset(ResetOptions {
            store: StoreArgs {
                participant: single_positional("participant")?,
                project,
                data_dir,
            },
            category,
        }),
        "migrate-legacy" => Command::MigrateLegacy,
        "config" => Command::Config,
        unknown => return Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    };
    Ok(Some(command))
}

fn help_text() -> String {
    [
        "rrational",
        "",
        "Usage:",
        "  rrational scan <root> [--pattern <regex>] [--json]",
        "  rrational status <participant> [--project <dir>] [--data-dir <dir>] [--json]",
        "  rrational reset <participant> [--project <dir>] [--data-dir <dir>] [--category artifacts|validations|nn|events|all]",
        "  rrational migrate-legacy",
        "  rrational config",
        "",
        "Defaults for --pattern, --project and --data-dir come from config.toml.",
        "`config` prints the settings file, writing the defaults first if it is missing.",
    ]
    .join("\n")
}

#[derive(Debug, Serialize)]
struct ScanEntry {
    participant_id: String,
    beat_file: PathBuf,
    event_file: Option<PathBuf>,
    beat_count: usize,
    event_count: usize,
    error: Option<String>,
}

fn scan(settings: &IngestSettings, options: ScanOptions) -> Result<(), String> {
    let discovery = settings
        .discovery_options(options.pattern.as_deref())
        .map_err(|err| err.to_string())?;
    let entries: Vec<ScanEntry> = discover_recordings(&options.root, &discovery)
        .into_iter()
        .map(|bundle| {
            let loaded = load_recording(&bundle);
            let (beat_count, event_count, error) = match loaded {
                Ok(recording) => (recording.beats.len(), recording.events.len(), None),
                Err(err) => (0, 0, Some(err.to_string())),
            };
            ScanEntry {
                participant_id: bundle.participant_id,
                beat_file: bundle.beat_file_path,
                event_file: bundle.event_file_path,
                beat_count,
                event_count,
                error,
            }
        })
        .collect();

    if options.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No recordings found under {}", options.root.display());
        return Ok(());
    }
    for entry in &entries {
        match &entry.error {
            Some(error) => println!("{}: failed to load ({error})", entry.participant_id),
            None => println!(
                "{}: {} beats, {} events",
                entry.participant_id, entry.beat_count, entry.event_count
            ),
        }
        println!("  beats:  {}", entry.beat_file.display());
        match &entry.event_file {
            Some(path) => println!("  events: {}", path.display()),
            None => println!("  events: (none)"),
        }
    }
    Ok(())
}

fn store_locations(settings: &IngestSettings, args: &StoreArgs) -> Result<StoreLocations, String> {
    let base = StoreLocations::from_app_dirs().map_err(|err| err.to_string())?;
    Ok(settings.store_locations(base, args.project.clone(), args.data_dir.clone()))
}

#[derive(Debug, Serialize)]
struct EventCounts {
    events: usize,
    manual: usize,
    music_events: usize,
    exclusion_zones: usize,
    source: PathBuf,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    participant_id: String,
    write_dir: PathBuf,
    artifacts: MergedArtifacts,
    validations: Option<SectionValidations>,
    nn_intervals: Option<BTreeMap<String, NnSummary>>,
    events: Option<EventCounts>,
    warnings: Vec<String>,
}

fn take<T>(loaded: Loaded<T>, warnings: &mut Vec<String>) -> Option<T> {
    warnings.extend(loaded.warnings.iter().map(ToString::to_string));
    loaded.value
}

fn status(settings: &IngestSettings, options: StatusOptions) -> Result<(), String> {
    let locations = store_locations(settings, &options.store)?;
    let participant = options.store.participant.as_str();
    let mut warnings = Vec::new();
    let report = StatusReport {
        participant_id: participant.to_string(),
        write_dir: locations.write_dir(),
        artifacts: take(artifacts::merged_for_display(&locations, participant), &mut warnings)
            .unwrap_or_default(),
        validations: take(validations::load(&locations, participant), &mut warnings),
        nn_intervals: take(nn_intervals::summary(&locations, participant), &mut warnings),
        events: take(participant_events::load(&locations, participant), &mut warnings).map(
            |saved| EventCounts {
                events: saved.edits.events.len(),
                manual: saved.edits.manual.len(),
                music_events: saved.edits.music_events.len(),
                exclusion_zones: saved.edits.exclusion_zones.len(),
                source: saved.source_path,
            },
        ),
        warnings,
    };

    if options.json {
        return print_json(&report);
    }
    print_status(&report);
    Ok(())
}

fn print_status(report: &StatusReport) {
    println!("Participant: {}", report.participant_id);
    println!("Write directory: {}", report.write_dir.display());

    println!();
    println!("Artifact sections:");
    if report.artifacts.sections.is_empty() {
        println!("- (none)");
    }
    for (key, summary) in &report.artifacts.sections {
        println!(
            "- {key}: {} algorithm, {} manual, {} excluded, method={}, saved_at={}",
            summary.algorithm_count,
            summary.manual_count,
            summary.excluded_count,
            summary.method.as_deref().unwrap_or("-"),
            summary.saved_at.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!("Section validations:");
    match &report.validations {
        Some(saved) if !saved.sections.is_empty() => {
            for (name, validation) in &saved.sections {
                let state = if validation.is_valid { "valid" } else { "invalid" };
                println!("- {name}: {state}");
            }
        }
        _ => println!("- (none)"),
    }

    println!();
    println!("NN intervals:");
    match &report.nn_intervals {
        Some(sections) if !sections.is_empty() => {
            for (name, summary) in sections {
                println!(
                    "- {name}: {} intervals, method={}, corrected={}",
                    summary.nn_count, summary.correction_method, summary.intervals_corrected
                );
            }
        }
        _ => println!("- (none)"),
    }

    println!();
    println!("Saved events:");
    match &report.events {
        Some(counts) => println!(
            "- {} events, {} manual, {} music, {} exclusion zones ({})",
            counts.events,
            counts.manual,
            counts.music_events,
            counts.exclusion_zones,
            counts.source.display()
        ),
        None => println!("- (none)"),
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("- {warning}");
        }
    }
}

fn reset(settings: &IngestSettings, options: ResetOptions) -> Result<(), String> {
    let locations = store_locations(settings, &options.store)?;
    let participant = options.store.participant.as_str();
    let categories: &[Category] = match options.category {
        Category::All => &[
            Category::Artifacts,
            Category::Validations,
            Category::Nn,
            Category::Events,
        ],
        ref single => std::slice::from_ref(single),
    };
    for category in categories {
        let (label, removed) = match category {
            Category::Artifacts => ("artifacts", artifacts::delete(&locations, participant)),
            Category::Validations => ("validations", validations::delete(&locations, participant)),
            Category::Nn => ("nn", nn_intervals::delete(&locations, participant, None)),
            Category::Events => ("events", participant_events::delete(&locations, participant)),
            Category::All => continue,
        };
        let removed = removed.map_err(|err| err.to_string())?;
        println!(
            "{label}: {}",
            if removed { "removed" } else { "nothing to remove" }
        );
    }
    Ok(())
}

fn migrate_legacy() -> Result<(), String> {
    let legacy = app_dirs::legacy_root_path().map_err(|err| err.to_string())?;
    let current = app_dirs::app_root_path().map_err(|err| err.to_string())?;
    let report = migrate::migrate_legacy_dir(&legacy, &current);
    if report.entries.is_empty() {
        println!("Nothing to migrate from {}", legacy.display());
        return Ok(());
    }
    for (path, outcome) in &report.entries {
        println!("{}: {outcome:?}", display_name(path));
    }
    println!("{} copied, {} failed", report.copied(), report.failed());
    Ok(())
}

fn show_config(settings: &IngestSettings) -> Result<(), String> {
    let path = config::config_path().map_err(|err| err.to_string())?;
    if !path.is_file() {
        config::save(settings).map_err(|err| err.to_string())?;
        println!("Wrote default settings to {}", path.display());
    }
    let text = toml::to_string_pretty(settings).map_err(|err| err.to_string())?;
    println!("# {}", path.display());
    print!("{text}");
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}
