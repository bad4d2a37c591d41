mod backend;
mod config;
mod registry;
mod secrets;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use cloudify_core::{Error as CoreError, classify, redact_database_url};
use cloudify_resolver::{
    DslParser, ParseError, Resolve, ResolveError, ValidationReport, YamlDslParser, audit_catalog,
};
use cloudify_storage::{PluginRegistry, StorageError, load_catalog_document};
use registry::{RunContext, init_logging, start_run, write_plan};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{CatalogSource, DEFAULT_CONFIG_FILE, ManagerConfig, load_or_create_config};
use crate::secrets::{KeyProvider, SecurityFileKeyProvider, StaticKeyProvider, decrypt, encrypt};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("resolve failed ({kind}): {0}", kind = .0.kind())]
    Resolve(#[from] ResolveError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("secret error: {0}")]
    Secret(#[from] secrets::SecretError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("catalog has {0} error(s)")]
    InvalidCatalog(usize),
}

#[derive(Parser, Debug)]
#[command(name = "cfy-resolve", version, about = "Resolve plugin and blueprint imports")]
struct Cli {
    /// Path to the manager config (created with defaults if missing).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify an import reference without touching storage.
    Classify { reference: String },
    /// Resolve one import reference against the configured storage.
    Resolve { reference: String },
    /// Parse a deployment document, composing its imports into a plan.
    Parse(ParseArgs),
    /// Plugin catalog maintenance.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Print the platform plugins are checked against.
    Platform,
    /// Encrypt or decrypt a secret with the manager key.
    #[command(subcommand)]
    Secret(SecretCommand),
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Deployment document to parse.
    dsl_location: PathBuf,
    /// Base directory for plain imports not found next to the importer.
    #[arg(long)]
    resources_base_path: Option<PathBuf>,
    /// Optional extra output path for plan.json.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Check the catalog for errors and entries unusable on this platform.
    Validate {
        /// Catalog file to check instead of the configured source.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommand {
    /// Encrypt a value; prints hex-encoded ciphertext.
    Encrypt(SecretArgs),
    /// Decrypt hex-encoded ciphertext.
    Decrypt(SecretArgs),
}

#[derive(Args, Debug)]
struct SecretArgs {
    value: String,
    /// Key to use instead of the one in the security config.
    #[arg(long)]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_or_create_config(&cli.config)?;

    // `parse` logs into its run directory and sets up its own subscriber.
    if !matches!(cli.command, Command::Parse(_)) {
        init_logging(&config.log_level, None)?;
    }

    match cli.command {
        Command::Classify { reference } => run_classify(&reference),
        Command::Resolve { reference } => run_resolve(&config, &reference).await,
        Command::Parse(args) => run_parse(&config, args).await,
        Command::Catalog(CatalogCommand::Validate { file }) => {
            run_catalog_validate(&config, file.as_deref()).await
        }
        Command::Platform => print_json(&config.platform_info()?),
        Command::Secret(command) => run_secret(&config, command),
    }
}

fn run_classify(reference: &str) -> Result<(), CliError> {
    let classified = classify(reference);
    tracing::debug!(event = "import_classified", kind = %classified.kind());
    print_json(&classified)
}

async fn run_resolve(config: &ManagerConfig, reference: &str) -> Result<(), CliError> {
    let platform = config.platform_info()?;
    let backends = backend::connect(config).await?;
    let resolver = backends.into_resolver(platform, config.tracing_enabled);

    let resolved = resolver.resolve(reference).await?;
    print_json(&resolved)
}

async fn run_parse(config: &ManagerConfig, args: ParseArgs) -> Result<(), CliError> {
    let ParseArgs {
        dsl_location,
        resources_base_path,
        out,
    } = args;

    let resources_base_path = match resources_base_path {
        Some(path) => path,
        None => dsl_location
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let platform = config.platform_info()?;
    let (catalog_backend, catalog_url) = match &config.catalog {
        CatalogSource::File { .. } => ("file", None),
        CatalogSource::Postgres { url, .. } => ("postgres", Some(redact_database_url(url))),
    };

    let run_id = Uuid::new_v4().to_string();
    let ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        runs_dir: config.runs_dir.clone(),
        dsl_location: dsl_location.clone(),
        resources_base_path: resources_base_path.clone(),
        platform: platform.clone(),
        catalog_backend: catalog_backend.to_string(),
        catalog_url,
        tracing_enabled: config.tracing_enabled,
    };

    let run_paths = start_run(&ctx)?;
    init_logging(&config.log_level, Some(&run_paths.logs_path))?;

    tracing::info!(event = "run_started", run_id = %run_id, platform = %platform);
    let timer = Instant::now();

    let backends = backend::connect(config).await?;
    tracing::info!(event = "backends_ready", backends = %backends.describe());
    let resolver = backends.into_resolver(platform, config.tracing_enabled);

    let plan = match YamlDslParser::new()
        .parse(&dsl_location, &resources_base_path, &resolver)
        .await
    {
        Ok(plan) => plan,
        Err(err) => {
            let error_kind = err.resolve_error().map(ResolveError::kind).unwrap_or("parse");
            tracing::error!(event = "run_finished", status = "failed", error_kind, error = %err);
            return Err(err.into());
        }
    };

    write_plan(&run_paths, &plan, out.as_deref())?;
    tracing::info!(event = "plan_written", path = %run_paths.plan_path.display());

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    println!("{}", run_paths.root.display());

    Ok(())
}

async fn run_catalog_validate(
    config: &ManagerConfig,
    file: Option<&Path>,
) -> Result<(), CliError> {
    let platform = config.platform_info()?;
    let entries = match (file, &config.catalog) {
        (Some(path), _) => load_catalog_document(path)?.plugins,
        (None, CatalogSource::File { path }) => load_catalog_document(path)?.plugins,
        (None, CatalogSource::Postgres { .. }) => {
            let backends = backend::connect(config).await?;
            let entries = backends.registry.list_plugins().await?;
            cloudify_core::validate_catalog(&entries)?;
            entries
        }
    };

    let report = audit_catalog(&entries, &platform);
    print_report(&report);
    tracing::info!(
        event = "catalog_validated",
        entries = entries.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len()
    );

    if !report.is_ok() {
        return Err(CliError::InvalidCatalog(report.errors.len()));
    }
    println!("catalog ok: {} entries checked on {platform}", entries.len());
    Ok(())
}

fn run_secret(config: &ManagerConfig, command: SecretCommand) -> Result<(), CliError> {
    let provider: Box<dyn KeyProvider> = match &config.security_config {
        Some(path) => Box::new(SecurityFileKeyProvider::new(path.clone())),
        None => Box::new(StaticKeyProvider::new(String::new())),
    };

    match command {
        SecretCommand::Encrypt(SecretArgs { value, key }) => {
            let sealed = encrypt(value.as_bytes(), provider.as_ref(), key.as_deref())?;
            println!("{}", hex::encode(sealed));
        }
        SecretCommand::Decrypt(SecretArgs { value, key }) => {
            let sealed = hex::decode(value.trim())
                .map_err(|err| CliError::InvalidInput(format!("ciphertext is not hex: {err}")))?;
            let opened = decrypt(&sealed, provider.as_ref(), key.as_deref())?;
            let text = String::from_utf8(opened)
                .map_err(|_| CliError::InvalidInput("decrypted value is not UTF-8".to_string()))?;
            println!("{text}");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
