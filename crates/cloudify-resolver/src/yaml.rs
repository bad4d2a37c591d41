use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::model::{ImportRecord, Plan};
use crate::parser::DslParser;
use crate::resolver::{Resolve, ResolvedLocation};

const IMPORTS_KEY: &str = "imports";
const VERSION_KEY: &str = "tosca_definitions_version";
const DESCRIPTION_KEY: &str = "description";
const DEFAULT_MAX_DEPTH: usize = 32;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// YAML parser that composes a document with its imports.
///
/// It does not interpret the DSL grammar: it only walks `imports`, resolves
/// each entry, and merges the top-level sections of imported documents into
/// the importer, keeping the importer's value on conflicts.
#[derive(Debug, Clone)]
pub struct YamlDslParser {
    max_depth: usize,
}

impl Default for YamlDslParser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl YamlDslParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

struct ParseState<'r> {
    resolver: &'r dyn Resolve,
    resources_base_path: &'r Path,
    max_depth: usize,
    visited: HashSet<PathBuf>,
    plan: Plan,
}

#[async_trait]
impl DslParser for YamlDslParser {
    async fn parse(
        &self,
        dsl_location: &Path,
        resources_base_path: &Path,
        resolver: &dyn Resolve,
    ) -> Result<Plan, ParseError> {
        tracing::info!(event = "parse_started", dsl_location = %dsl_location.display());

        let mut state = ParseState {
            resolver,
            resources_base_path,
            max_depth: self.max_depth,
            visited: HashSet::new(),
            plan: Plan::default(),
        };
        state.visited.insert(visit_key(dsl_location));

        let mut document = compose(&mut state, dsl_location.to_path_buf(), 0).await?;

        let mut plan = state.plan;
        plan.tosca_definitions_version = take_string(&mut document, VERSION_KEY);
        plan.description = take_string(&mut document, DESCRIPTION_KEY);
        plan.sections = document.into_iter().collect();

        tracing::info!(
            event = "parse_finished",
            imports = plan.imports.len(),
            plugins = plan.deployment_plugins_to_install.len()
        );
        Ok(plan)
    }
}

fn compose<'a, 'r: 'a>(
    state: &'a mut ParseState<'r>,
    path: PathBuf,
    depth: usize,
) -> BoxFuture<'a, Result<Map<String, Value>, ParseError>> {
    Box::pin(async move {
        if depth > state.max_depth {
            return Err(ParseError::InvalidDocument {
                path,
                message: format!("imports nested deeper than {}", state.max_depth),
            });
        }

        let mut document = load_document(&path)?;
        let imports = take_imports(&mut document, &path)?;
        let doc_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let importer = path.display().to_string();

        for reference in imports {
            let resolved = state.resolver.resolve(&reference).await?;

            let child = match &resolved {
                ResolvedLocation::Plain { reference } => Some(locate_plain(
                    reference,
                    &doc_dir,
                    state.resources_base_path,
                    &path,
                )?),
                ResolvedLocation::Blueprint { path, .. } => Some(path.clone()),
                ResolvedLocation::Plugin { entry, .. } => {
                    let plugins = &mut state.plan.deployment_plugins_to_install;
                    if !plugins.iter().any(|known| known.key() == entry.key()) {
                        plugins.push(entry.clone());
                    }
                    None
                }
            };

            state.plan.imports.push(ImportRecord {
                reference: reference.clone(),
                kind: resolved.kind(),
                location: child
                    .as_ref()
                    .map(|child| child.display().to_string())
                    .unwrap_or_else(|| resolved.location()),
                imported_by: importer.clone(),
            });

            let Some(child) = child else {
                continue;
            };
            if !state.visited.insert(visit_key(&child)) {
                tracing::debug!(event = "import_skipped", path = %child.display());
                continue;
            }
            let imported = compose(state, child, depth + 1).await?;
            merge_missing(&mut document, imported);
        }

        Ok(document)
    })
}

fn load_document(path: &Path) -> Result<Map<String, Value>, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| ParseError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ParseError::InvalidDocument {
            path: path.to_path_buf(),
            message: "top level must be a mapping".to_string(),
        }),
    }
}

fn take_imports(document: &mut Map<String, Value>, path: &Path) -> Result<Vec<String>, ParseError> {
    match document.remove(IMPORTS_KEY) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(reference) => Ok(reference),
                other => Err(ParseError::InvalidDocument {
                    path: path.to_path_buf(),
                    message: format!("import entries must be strings, found {other}"),
                }),
            })
            .collect(),
        Some(_) => Err(ParseError::InvalidDocument {
            path: path.to_path_buf(),
            message: "imports must be a list".to_string(),
        }),
    }
}

/// Find a plain import on disk: next to the importer first, then under the
/// resources base path.
fn locate_plain(
    reference: &str,
    doc_dir: &Path,
    resources_base_path: &Path,
    importer: &Path,
) -> Result<PathBuf, ParseError> {
    let trimmed = reference.trim();
    let not_found = || ParseError::ImportNotFound {
        reference: reference.to_string(),
        importer: importer.to_path_buf(),
    };

    if let Some(local) = trimmed.strip_prefix("file://") {
        let candidate = PathBuf::from(local);
        return if candidate.is_file() {
            Ok(candidate)
        } else {
            Err(not_found())
        };
    }
    if trimmed.contains("://") {
        return Err(ParseError::UnsupportedImport {
            reference: reference.to_string(),
        });
    }

    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    [doc_dir, resources_base_path]
        .into_iter()
        .map(|dir| dir.join(candidate))
        .find(|path| path.is_file())
        .ok_or_else(not_found)
}

fn visit_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Add imported sections the importer does not define; nested mappings are
/// merged one level deep.
fn merge_missing(target: &mut Map<String, Value>, imported: Map<String, Value>) {
    for (key, value) in imported {
        match (target.get_mut(&key), value) {
            (None, value) => {
                target.insert(key, value);
            }
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (name, item) in incoming {
                    existing.entry(name).or_insert(item);
                }
            }
            (Some(_), _) => {}
        }
    }
}

fn take_string(document: &mut Map<String, Value>, key: &str) -> Option<String> {
    match document.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            document.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}
