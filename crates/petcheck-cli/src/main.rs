//! petcheck CLI - contract verification for a CRUD pet API

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use petcheck_core::contract::pet_contract;
use petcheck_core::factory;
use petcheck_core::{Config, RunReport, TOOL_ERROR_EXIT, Verdict, VerdictPolicy, VerdictStatus};
use petcheck_runner::{Dispatcher, ReqwestTransport, Robustness, Scenario, ScenarioOptions};

#[derive(Parser)]
#[command(name = "petcheck")]
#[command(about = "Contract verification for a CRUD pet API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Strict mode (warnings become errors). Use --strict=false to disable.
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Target {
    /// Config file (default: .petcheck.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the create/read/update/filter/delete lifecycle
    Run {
        #[command(flatten)]
        target: Target,

        /// Use this pet id instead of a generated one
        #[arg(long)]
        pet_id: Option<i64>,

        /// Use this pet name instead of a generated one
        #[arg(long)]
        name: Option<String>,

        /// Fail on a 404 right after create/update instead of tolerating it
        #[arg(long)]
        no_tolerate: bool,
    },

    /// Run the robustness checks (unknown id, invalid payload, update sequence, long name)
    Robustness {
        #[command(flatten)]
        target: Target,
    },

    /// Initialize config file
    Init,

    /// Print the pet contract as JSON Schema
    Contract,

    /// Export JSON Schema for the run report
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.output, cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// Step logs go to stderr; stdout is reserved for the summary.
fn init_tracing(output: OutputFormat, verbose: bool) {
    if output == OutputFormat::Silent {
        return;
    }
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let policy = VerdictPolicy { strict: cli.strict };

    match cli.command {
        Commands::Run {
            target,
            pet_id,
            name,
            no_tolerate,
        } => {
            let mut cfg = load_config(&target)?;
            if no_tolerate {
                cfg.tolerate_known_anomalies = false;
            }
            let mut overrides = cfg.pet.clone();
            if let Some(id) = pet_id {
                overrides = overrides.with_id(id);
            }
            if let Some(name) = name {
                overrides = overrides.with_name(name);
            }

            let dispatcher = dispatcher(&cfg)?;
            let pet = factory::generate(overrides);
            announce(cli.output, &cfg, "lifecycle", Some(pet.id));

            let report = Scenario::new(&dispatcher, ScenarioOptions::from(&cfg)).run(pet);
            finish(&report, &policy, cli.output)
        }

        Commands::Robustness { target } => {
            let cfg = load_config(&target)?;
            let dispatcher = dispatcher(&cfg)?;
            announce(cli.output, &cfg, "robustness", None);

            let report = Robustness::new(&dispatcher).run(&cfg.pet);
            finish(&report, &policy, cli.output)
        }

        Commands::Init => {
            let config_path = ".petcheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: pet service to verify");
            println!("  - headers: API keys");
            println!("  - latency budgets and anomaly tolerance");
            println!("  - [pet]: fixed id/name/status for the scenario pet");
            Ok(0)
        }

        Commands::Contract => {
            let schema = pet_contract().to_json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(0)
        }

        Commands::Schema => {
            let schema = petcheck_core::report::generate_schema()?;
            println!("{schema}");
            Ok(0)
        }
    }
}

fn load_config(target: &Target) -> Result<Config> {
    let mut cfg = if let Some(path) = &target.config {
        Config::load(Path::new(path))?
    } else {
        Config::load_default()?
    };
    if let Some(url) = &target.base_url {
        cfg.base_url.clone_from(url);
        cfg.validate()?;
    }
    Ok(cfg)
}

fn dispatcher(cfg: &Config) -> Result<Dispatcher<ReqwestTransport>> {
    let transport = ReqwestTransport::new(
        cfg.normalized_base_url(),
        Duration::from_secs(cfg.timeout_secs),
    )
    .context("cannot build HTTP client")?;
    Ok(Dispatcher::new(transport).with_headers(&cfg.headers))
}

fn announce(output: OutputFormat, cfg: &Config, suite: &str, pet_id: Option<i64>) {
    if output == OutputFormat::Silent {
        return;
    }
    eprintln!("Config:");
    eprintln!("  base_url: {}", cfg.normalized_base_url());
    if !cfg.headers.is_empty() {
        eprintln!("  headers:  {} configured", cfg.headers.len());
    }
    eprintln!("  suite:    {suite}");
    if let Some(id) = pet_id {
        eprintln!("  pet id:   {id}");
    }
    eprintln!();
}

fn finish(report: &RunReport, policy: &VerdictPolicy, output: OutputFormat) -> Result<i32> {
    let verdict = report.verdict(policy);

    match output {
        OutputFormat::Terminal => print_terminal(report, &verdict),
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "verdict": verdict,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Silent => {}
    }

    if verdict.exit_code == TOOL_ERROR_EXIT {
        eprintln!("Error: no step reached the service. Check base_url.");
    }
    Ok(verdict.exit_code)
}

fn print_terminal(report: &RunReport, verdict: &Verdict) {
    let icon = if verdict.status == VerdictStatus::Pass {
        "PASS"
    } else {
        "FAIL"
    };
    println!("\n{icon}: {}", verdict.reason);
    if report.suite == "lifecycle" {
        println!(
            "  Pet {}: stage reached {}",
            report.pet_id, report.stage_reached
        );
    } else {
        println!("  Suite: {}", report.suite);
    }

    if !report.steps.is_empty() {
        println!("\nSteps:");
        for step in &report.steps {
            println!(
                "  {:>4}  {:>8.1}ms  {}",
                step.status, step.duration_ms, step.title
            );
        }
    }

    if !report.findings.is_empty() {
        println!("\nFindings ({}):", report.findings.len());
        for f in &report.findings {
            println!("  {f}");
        }
    }

    println!("  Exit code: {}", verdict.exit_code);
}
