use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cloudify_core::{PlatformInfo, RedactedUrl};
use cloudify_resolver::{PLAN_VERSION, Plan};

use super::{RegistryError, RegistryResult};
use crate::config::write_json_atomic;

/// Metadata captured when a parse run starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub runs_dir: PathBuf,
    pub dsl_location: PathBuf,
    pub resources_base_path: PathBuf,
    pub platform: PlatformInfo,
    pub catalog_backend: String,
    /// Set when the catalog lives in a database; credentials already masked.
    pub catalog_url: Option<RedactedUrl>,
    pub tracing_enabled: bool,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub plan_version: String,
    pub dsl_location: String,
    pub resources_base_path: String,
    pub platform: PlatformInfo,
    pub catalog_backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<RedactedUrl>,
    pub tracing_enabled: bool,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub plan_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create `<runs_dir>/<timestamp>__run_<id>/` with `config.json` and an empty log.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx
        .runs_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        plan_version: PLAN_VERSION.to_string(),
        dsl_location: ctx.dsl_location.display().to_string(),
        resources_base_path: ctx.resources_base_path.display().to_string(),
        platform: ctx.platform.clone(),
        catalog_backend: ctx.catalog_backend.clone(),
        catalog_url: ctx.catalog_url.clone(),
        tracing_enabled: ctx.tracing_enabled,
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        plan_path: root.join("plan.json"),
        logs_path,
        root,
    })
}

/// Write `plan.json` into the run directory and, if given, to `out_path`.
pub fn write_plan(paths: &RunPaths, plan: &Plan, out_path: Option<&Path>) -> RegistryResult<()> {
    write_json(&paths.plan_path, plan)?;
    if let Some(out_path) = out_path {
        write_json_atomic(out_path, plan)?;
    }
    Ok(())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
