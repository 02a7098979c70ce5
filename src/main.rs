mod explorer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};

use treesnap::config::SnapConfig;
use treesnap::engine::{default_output_path, export_snapshot, format_languages, list_projects, project_name};
use treesnap::models::SnapshotMode;

#[derive(Parser, Debug)]
#[command(name = "treesnap", version, about = "Export a source tree as a JSON snapshot")]
struct Cli {
    /// Config file (JSON). Defaults to ./treesnap.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Export one directory
    Export {
        path: PathBuf,
        /// full | skeleton | blueprint (anything else means full)
        #[arg(long, default_value = "full")]
        mode: String,
        /// Output file; defaults to <output>/<folder>/<folder>_<kind>.json
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Browse projects interactively and export from there
    Explore {
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// List project folders under the configured root
    Projects,
}

fn init_logger(default_filter: &str) {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Logging stays off in the explorer unless RUST_LOG asks for it; it would
    // draw over the alternate screen.
    let interactive = matches!(cli.cmd, None | Some(Cmd::Explore { .. }));
    init_logger(if interactive { "off" } else { "info" });

    let config = SnapConfig::load_or_default(cli.config.as_deref()).context("load config")?;

    match cli.cmd.unwrap_or(Cmd::Explore { root: None }) {
        Cmd::Export { path, mode, output } => {
            let mode = SnapshotMode::parse(&mode);
            let output = output.unwrap_or_else(|| {
                default_output_path(&config.output_root(), &project_name(&path), mode)
            });

            let report = export_snapshot(&path, &output, mode, &config)
                .with_context(|| format!("export {}", path.display()))?;

            println!("Exported {} files to {}", report.stats.total_files, output.display());
            println!("Languages: {}", format_languages(&report.stats));
            if !report.skipped.is_empty() {
                println!("Skipped {} unreadable entries:", report.skipped.len());
                for s in &report.skipped {
                    println!("  {}: {}", s.path, s.reason);
                }
            }
        }
        Cmd::Explore { root } => {
            let config = match root {
                Some(root) => config.rooted_at(root),
                None => config,
            };
            let root = config.root_path.clone();
            explorer::run(config, root).context("terminal UI")?;
        }
        Cmd::Projects => {
            let output_root = config.output_root();
            let output_name = output_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let projects = list_projects(&config.root_path, &output_name)
                .with_context(|| format!("list {}", config.root_path.display()))?;
            if projects.is_empty() {
                println!("No projects found in {}", config.root_path.display());
            }
            for (idx, p) in projects.iter().enumerate() {
                println!("[{}] {}", idx + 1, project_name(p));
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
