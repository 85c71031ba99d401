//! Netprobe CLI
//!
//! Read-only evidence collection for network devices:
//!
//! ```text
//! netprobe validate <command_set>
//! netprobe probe --command-set <file> --host <h> (--replay <dir> | --ssh-program <prog>)
//! netprobe collect <platform> <run_dir>...
//! netprobe derive <ap_run_dir> <controller_run_dir>
//! netprobe verify <run_dir>
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use std::path::PathBuf;

use netprobe_collect::{derive_ap_client_map, run_collector, Platform};
use netprobe_probe::{
    run_probe, verify_run, Connector, ProbeConfig, ProbeError, ProcessConnector, ReplayConnector,
    Target,
};
use netprobe_spec::{audit_command_set, CommandSet};

#[derive(Parser)]
#[command(name = "netprobe")]
#[command(
    author,
    version,
    about = "Netprobe: safety-gated evidence collection for network devices"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a command set and audit every template against its blocked keywords.
    Validate {
        /// Command set (YAML, or JSON by extension)
        command_set: PathBuf,
    },

    /// Run a command set against one device and persist raw evidence.
    Probe(ProbeArgs),

    /// Normalize one or more run directories into `collector_manifest.json`.
    Collect {
        /// Collector platform: aruba_ap, aruba_controller, aruba_switch
        platform: String,

        /// Run directories (each containing `artifacts/`)
        #[arg(required = true)]
        run_dirs: Vec<PathBuf>,
    },

    /// Derive the AP to client correlation from collected AP and controller runs.
    Derive {
        ap_run_dir: PathBuf,
        controller_run_dir: PathBuf,
    },

    /// Recompute artifact hashes and compare them with the run manifest.
    Verify { run_dir: PathBuf },
}

#[derive(Args)]
struct ProbeArgs {
    #[arg(long)]
    command_set: PathBuf,

    #[arg(long)]
    host: String,

    #[arg(long, default_value_t = 22)]
    port: u16,

    #[arg(long)]
    username: Option<String>,

    /// Vendor recorded in the target descriptor
    #[arg(long)]
    vendor: Option<String>,

    /// Output root; each run writes `<output>/<run_id>/`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Probe configuration overrides (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    settle_ms: Option<u64>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Answer commands from recorded outputs instead of a device
    #[arg(long, conflicts_with = "ssh_program")]
    replay: Option<PathBuf>,

    /// ssh-compatible program used to reach the device
    #[arg(long, default_value = "ssh")]
    ssh_program: String,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the user-facing summary.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { command_set } => cmd_validate(&command_set),
        Commands::Probe(args) => cmd_probe(args),
        Commands::Collect { platform, run_dirs } => cmd_collect(&platform, &run_dirs),
        Commands::Derive {
            ap_run_dir,
            controller_run_dir,
        } => cmd_derive(&ap_run_dir, &controller_run_dir),
        Commands::Verify { run_dir } => cmd_verify(&run_dir),
    }
}

fn load_command_set(path: &PathBuf) -> Result<CommandSet> {
    CommandSet::load(path).with_context(|| format!("loading command set {}", path.display()))
}

fn cmd_validate(path: &PathBuf) -> Result<()> {
    println!("{} {}", "Validating".green().bold(), path.display());

    let set = load_command_set(path)?;
    audit_command_set(&set).context("safety audit failed")?;

    println!(
        "  Platform: {}",
        set.platform.as_deref().unwrap_or("(unspecified)").cyan()
    );
    println!("  Version: {}", set.version.as_deref().unwrap_or("-"));
    println!("  Blocked keywords: {}", set.safety.blocked_keywords.len());
    println!("  Paging commands: {}", set.transport.paging_disable().len());
    for category in &set.commands {
        println!(
            "    {} {} command(s)",
            category.name.yellow(),
            category.entries.len()
        );
    }
    println!("{}", "Valid.".green());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> Result<()> {
    let set = load_command_set(&args.command_set)?;
    audit_command_set(&set).context("safety audit failed")?;

    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path)
            .with_context(|| format!("loading probe config {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    if args.replay.is_some() {
        config = config.without_delays();
    }
    if let Some(output) = args.output {
        config.output_root = output;
    }
    if let Some(ms) = args.settle_ms {
        config.settle_delay_ms = ms;
    }
    if let Some(ms) = args.timeout_ms {
        config.command_timeout_ms = ms;
    }

    let mut target = Target::ssh(args.host.as_str()).with_port(args.port);
    if let Some(platform) = &set.platform {
        target = target.with_platform(platform.as_str());
    }
    if let Some(vendor) = &args.vendor {
        target = target.with_vendor(vendor.as_str());
    }

    let connector: Box<dyn Connector> = match &args.replay {
        Some(dir) => Box::new(ReplayConnector::new(dir)),
        None => {
            let mut ssh = ProcessConnector::ssh(args.username.clone());
            ssh.program = args.ssh_program.clone();
            Box::new(ssh)
        }
    };

    println!(
        "{} {}:{} ({} templates)",
        "Probing".green().bold(),
        target.host,
        target.port,
        set.template_count()
    );

    let run = match run_probe(connector.as_ref(), &set, &target, &config) {
        Ok(run) => run,
        Err(ProbeError::TransportLost {
            source,
            partial_manifest,
        }) => {
            eprintln!(
                "{} partial manifest written to {}",
                "session lost:".red().bold(),
                partial_manifest.display()
            );
            return Err(anyhow!(source).context("probe aborted"));
        }
        Err(e) => return Err(anyhow!(e).context("probe aborted")),
    };

    println!("  Run: {}", run.manifest.run_id.to_string().cyan());
    for (category, results) in &run.manifest.results_by_category {
        let failed = if results.failed.is_empty() {
            "0 failed".normal()
        } else {
            format!("{} failed", results.failed.len()).red()
        };
        println!(
            "    {} {} ok, {}",
            category.yellow(),
            results.succeeded.len(),
            failed
        );
    }
    println!("  Artifacts: {}", run.manifest.artifacts.len());
    println!(
        "{} {}",
        "wrote".green().bold(),
        run.manifest_path.display().to_string().bold()
    );
    Ok(())
}

fn cmd_collect(platform: &str, run_dirs: &[PathBuf]) -> Result<()> {
    let platform: Platform = platform.parse()?;
    println!(
        "{} {} run(s) as {}",
        "Collecting".green().bold(),
        run_dirs.len(),
        platform.as_str().cyan()
    );

    let results: Vec<_> = run_dirs
        .par_iter()
        .map(|dir| (dir, run_collector(platform, dir)))
        .collect();

    let mut failures = 0usize;
    for (dir, result) in results {
        match result {
            Ok((manifest, path)) => {
                println!("  {} {}", "ok".green().bold(), path.display());
                for note in &manifest.parse_notes {
                    println!("    {} {}", "note:".yellow(), note);
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("  {} {}: {e}", "failed".red().bold(), dir.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} run(s) failed to collect", run_dirs.len());
    }
    Ok(())
}

fn cmd_derive(ap_run_dir: &PathBuf, controller_run_dir: &PathBuf) -> Result<()> {
    let (view, path) = derive_ap_client_map(ap_run_dir, controller_run_dir)
        .context("deriving AP to client correlation")?;

    println!("{}", "Derived AP to client correlation".green().bold());
    println!("  APs seen: {}", view.summary.aps_seen);
    println!("  Clients seen: {}", view.summary.clients_seen);
    println!("  Clients correlated: {}", view.summary.clients_correlated);
    for note in &view.notes {
        println!("  {} {}", "note:".yellow(), note);
    }
    println!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    Ok(())
}

fn cmd_verify(run_dir: &PathBuf) -> Result<()> {
    println!("{} {}", "Verifying".green().bold(), run_dir.display());
    let report = verify_run(run_dir)
        .with_context(|| format!("verifying run {}", run_dir.display()))?;

    for path in &report.mismatched {
        println!("  {} {}", "modified".red().bold(), path);
    }
    for path in &report.missing {
        println!("  {} {}", "missing".red().bold(), path);
    }
    if !report.is_clean() {
        bail!(
            "{} of {} artifact(s) failed verification",
            report.mismatched.len() + report.missing.len(),
            report.checked
        );
    }
    println!("{} {} artifact(s) intact", "Valid.".green(), report.checked);
    Ok(())
}
