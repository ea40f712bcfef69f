use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use mvc_engine::{
    ApplyOutcome, ApplyReport, CacheService, DiagnosticQuery, Engine, EngineConfig, EngineHandle,
    JournalConfig, Message, PruneReport, QueryRows,
};
use serde::Serialize;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let engine = Engine::new(config).context("failed to open engine")?;
    let handle = EngineHandle::spawn(engine);
    handle.initialize().await.context("failed to replay journal")?;

    let format = cli.format;
    match cli.command {
        Command::Replay(args) => cmd_replay(&handle, args, &format).await,
        Command::Get(args) => cmd_get(&handle, args, &format).await,
        Command::Query(args) => cmd_query(&handle, args, &format).await,
        Command::Link(args) => cmd_link(&handle, args, &format).await,
        Command::Prune(args) => cmd_prune(&handle, args, &format).await,
        Command::Resync(args) => cmd_resync(&handle, args, &format).await,
        Command::Stats => cmd_stats(&handle, &format).await,
        Command::Compact => cmd_compact(&handle, &format).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &cli.journal {
        let sync_mode = config
            .journal
            .as_ref()
            .map(|j| j.sync_mode)
            .unwrap_or_default();
        config.journal = Some(JournalConfig {
            path: path.clone(),
            sync_mode,
        });
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_stream(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        return Ok(std::io::read_to_string(std::io::stdin())?);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn outcome_label(outcome: ApplyOutcome) -> colored::ColoredString {
    match outcome {
        ApplyOutcome::Applied => "applied".green(),
        ApplyOutcome::Replayed => "replayed".cyan(),
        ApplyOutcome::Duplicate => "duplicate".dimmed(),
    }
}

fn print_report(line: usize, report: &ApplyReport) {
    println!(
        "{} {:>4}  {}  {} → {}  ({} written, {} touched)",
        "✓".green(),
        line,
        outcome_label(report.outcome),
        report.branch.to_string().yellow(),
        report.index_checksum.as_str().bold(),
        report.atoms_written,
        report.touched,
    );
}

async fn cmd_replay(handle: &EngineHandle, args: ReplayArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let stream = read_stream(&args.file)?;
    let mut applied = 0usize;
    let mut failed = 0usize;

    for (i, raw) in stream.lines().enumerate() {
        let line = i + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let result = match serde_json::from_str::<Message>(raw) {
            Ok(message) => handle.handle_message(message).await.map_err(anyhow::Error::from),
            Err(e) => Err(anyhow::Error::from(e).context("malformed message")),
        };

        match result {
            Ok(report) => {
                applied += 1;
                match format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({ "line": line, "report": report })
                    ),
                    OutputFormat::Text => print_report(line, &report),
                }
            }
            Err(e) if args.keep_going => {
                failed += 1;
                match format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({ "line": line, "error": format!("{e:#}") })
                    ),
                    OutputFormat::Text => println!("{} {:>4}  {:#}", "✗".red(), line, e),
                }
            }
            Err(e) => return Err(e.context(format!("line {line}"))),
        }
    }

    if let OutputFormat::Text = format {
        println!(
            "\n{} messages applied, {} failed",
            applied.to_string().bold(),
            if failed > 0 { failed.to_string().red() } else { failed.to_string().normal() },
        );
    }
    Ok(())
}

async fn cmd_get(handle: &EngineHandle, args: GetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let GetArgs { workspace, change_set, kind, id, list } = args;
    let label = format!("{kind}:{id} in {workspace}/{change_set}");

    let value = if list {
        serde_json::Value::Array(
            handle
                .get_list(workspace.into(), change_set.into(), kind, id)
                .await?,
        )
    } else {
        match handle.get(workspace.into(), change_set.into(), kind, id).await? {
            Some(value) => value,
            None => bail!("{label} not found"),
        }
    };

    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Text => {
            println!("{}", label.dimmed());
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn print_rows(rows: &QueryRows) {
    println!("{}", rows.columns.join("\t").bold());
    for row in &rows.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
    println!("{}", format!("({} rows)", rows.len()).dimmed());
}

async fn cmd_query(handle: &EngineHandle, args: QueryArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let query: DiagnosticQuery =
        serde_json::from_str(&args.statement).context("malformed query statement")?;
    let rows = handle.query(query).await?;
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            print_rows(&rows);
            Ok(())
        }
    }
}

async fn cmd_link(handle: &EngineHandle, args: LinkArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let changed = handle
        .link_change_set(args.workspace.clone().into(), args.from.clone().into(), args.to.clone().into())
        .await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "linked": changed })),
        OutputFormat::Text => {
            if changed {
                println!("{} Linked {} → {}", "✓".green().bold(), args.to.yellow(), args.from.yellow());
            } else {
                println!("{} already points at {}'s snapshot", args.to.yellow(), args.from.yellow());
            }
            Ok(())
        }
    }
}

fn print_reclaimed(report: &PruneReport) {
    println!("  Branches removed:  {}", report.branches_removed.to_string().bold());
    println!("  Snapshots dropped: {}", report.snapshots_dropped.to_string().bold());
    println!("  Atoms swept:       {}", report.atoms_swept.to_string().bold());
}

async fn cmd_prune(handle: &EngineHandle, args: PruneArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let report = handle
        .prune_closed_branch(args.workspace.clone().into(), args.change_set.clone().into())
        .await?;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            if report.is_noop() {
                println!("Nothing to prune for {}/{}.", args.workspace, args.change_set.yellow());
            } else {
                println!("{} Pruned {}/{}", "✓".green().bold(), args.workspace, args.change_set.yellow());
                print_reclaimed(&report);
            }
            Ok(())
        }
    }
}

async fn cmd_resync(handle: &EngineHandle, args: ResyncArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let report = handle
        .full_resync(args.workspace.clone().into(), args.change_set.clone().into(), args.force)
        .await;
    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            if report.degraded {
                println!("{} Resync fell back to an empty cache; see log for details", "!".yellow().bold());
            } else {
                let scope = if args.force { "workspace" } else { "change set" };
                println!("{} Resynced {} {}/{}", "✓".green().bold(), scope, args.workspace, args.change_set.yellow());
            }
            print_reclaimed(&report.reclaimed);
            if report.journal_truncated {
                println!("  Journal truncated");
            }
            if report.resync_required {
                println!("  Re-request a complete snapshot for this scope");
            }
            Ok(())
        }
    }
}

async fn cmd_stats(handle: &EngineHandle, format: &OutputFormat) -> anyhow::Result<()> {
    let stats = handle.stats().await?;
    match format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Text => {
            println!("Instance: {}", stats.instance_id.to_string().cyan());
            println!("  Atoms:           {}", stats.atoms.to_string().bold());
            println!("  Snapshots:       {}", stats.snapshots.to_string().bold());
            println!("  Membership rows: {}", stats.membership_rows.to_string().bold());
            println!("  Branches:        {}", stats.branches.to_string().bold());
            println!("  Last sequence:   {}", stats.last_seq);
            match stats.journal_bytes {
                Some(bytes) => println!("  Journal:         {bytes} bytes"),
                None => println!("  Journal:         {}", "none (in-memory)".dimmed()),
            }
            Ok(())
        }
    }
}

async fn cmd_compact(handle: &EngineHandle, format: &OutputFormat) -> anyhow::Result<()> {
    let size = handle.call(|engine| engine.compact()).await??;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "journal_bytes": size })),
        OutputFormat::Text => {
            println!("{} Journal compacted to {} bytes", "✓".green().bold(), size);
            Ok(())
        }
    }
}
