//! Trellis CLI - Compile table schemas to Dataverse metadata
//!
//! Usage:
//!   trellis generate <schema.json> [--out <dir>]
//!   trellis provision <schema.json> [--dry-run]
//!   trellis plan <schema.json>
//!   trellis validate <schema.json>
//!
//! Examples:
//!   trellis generate schema/simquip.json --out solution_output
//!   TRELLIS_TOKEN=... trellis provision schema/simquip.json
//!   trellis --config trellis.toml plan schema/simquip.json

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trellis::compile::{compile_schema, CompileOptions, CompiledSchema};
use trellis::config::Settings;
use trellis::model::load_schema;
use trellis::package::render_package;
use trellis::provision::{self, EnvToken, Outcome, ProvisionReport, Provisioner, WebApiStore};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Trellis - Compile table schemas into Dataverse solution metadata")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to TRELLIS_CONFIG, ./trellis.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless TRELLIS_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an importable solution package
    Generate {
        /// Path to the schema file (.json or .toml)
        schema: PathBuf,

        /// Output directory (replaced on every run)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Create missing tables, columns and relationships in a live environment
    Provision {
        /// Path to the schema file (.json or .toml)
        schema: PathBuf,

        /// Run against an empty in-memory store instead
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the provisioning tiers and deferred relationships
    Plan {
        /// Path to the schema file (.json or .toml)
        schema: PathBuf,
    },

    /// Validate a schema without producing output
    Validate {
        /// Path to the schema file (.json or .toml)
        schema: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Generate { schema, out } => cmd_generate(&schema, out, &settings),
        Commands::Provision { schema, dry_run } => cmd_provision(&schema, dry_run, &settings),
        Commands::Plan { schema } => cmd_plan(&schema, &settings),
        Commands::Validate { schema } => cmd_validate(&schema, &settings),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("TRELLIS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings, ExitCode> {
    let result = match path {
        Some(p) => Settings::from_file(p),
        None => Settings::load(),
    };
    result.map_err(|e| {
        eprintln!("Settings error: {}", e);
        ExitCode::FAILURE
    })
}

/// Load and compile a schema, reporting any error.
fn compile(schema: &Path, settings: &Settings) -> Result<CompiledSchema, ExitCode> {
    let loaded = load_schema(schema).map_err(|e| {
        eprintln!("Error loading schema '{}': {}", schema.display(), e);
        ExitCode::FAILURE
    })?;

    let options = CompileOptions::default().with_prefix(settings.publisher.prefix.clone());
    compile_schema(&loaded, &options).map_err(|e| {
        eprintln!("Schema error: {}", e);
        ExitCode::FAILURE
    })
}

fn cmd_generate(schema: &Path, out: Option<PathBuf>, settings: &Settings) -> ExitCode {
    let compiled = match compile(schema, settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let package = render_package(&compiled, settings);
    let out = out.unwrap_or_else(|| PathBuf::from(&settings.package.output_dir));

    if let Err(e) = package.write_to_dir(&out) {
        eprintln!("Error writing package: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Package written to {}", out.display());
    println!("  Tables:        {}", compiled.entities.len());
    println!("  Relationships: {}", compiled.relationships.len());
    println!("  Documents:     {}", package.len());
    println!("  Digest:        {}", package.digest());
    ExitCode::SUCCESS
}

fn cmd_provision(schema: &Path, dry_run: bool, settings: &Settings) -> ExitCode {
    let compiled = match compile(schema, settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(async {
        if dry_run {
            return provision::dry_run(&compiled, settings).await;
        }
        let credentials = EnvToken::new(settings.environment.token_env.clone());
        let store = WebApiStore::connect(
            &settings.environment,
            &credentials,
            settings.package.language_code,
        )?;
        Provisioner::new(&store, settings).run(&compiled).await
    });

    match result {
        Ok(report) => {
            print_report(&report, dry_run);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Provisioning aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &ProvisionReport, dry_run: bool) {
    if dry_run {
        println!("Dry run against an empty store:");
    }
    for item in &report.items {
        match &item.outcome {
            Outcome::Created => println!("  + {} {}", item.kind, item.name),
            Outcome::Skipped => println!("  = {} {}", item.kind, item.name),
            Outcome::Failed { status, message } => match status {
                Some(code) => println!("  ! {} {} (HTTP {}: {})", item.kind, item.name, code, message),
                None => println!("  ! {} {} ({})", item.kind, item.name, message),
            },
            Outcome::Blocked { reason } => println!("  - {} {} ({})", item.kind, item.name, reason),
        }
    }
    println!();
    println!("Provisioning: {}", report);
}

fn cmd_plan(schema: &Path, settings: &Settings) -> ExitCode {
    let compiled = match compile(schema, settings) {
        Ok(c) => c,
        Err(code) => return code,
    };

    for (tier, tables) in compiled.plan.tiers() {
        println!("Tier {}:", tier);
        for table in tables {
            println!("  {}", table);
        }
    }

    if !compiled.plan.fixups.is_empty() {
        println!();
        println!("Deferred relationships:");
        for name in &compiled.plan.fixups {
            println!("  {}", name);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_validate(schema: &Path, settings: &Settings) -> ExitCode {
    match compile(schema, settings) {
        Ok(compiled) => {
            println!("OK: {} is valid", schema.display());
            println!("  Tables:        {}", compiled.entities.len());
            println!("  Relationships: {}", compiled.relationships.len());
            println!("  Deferred:      {}", compiled.plan.fixups.len());
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}
