//! TOML tool descriptors and the registry that holds them.
//!
//! One descriptor per file. Elements of `command` starting with `./` are
//! resolved against the directory of the descriptor file, so a tool (or the
//! script an interpreter runs) can ship next to its descriptor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    tool::ToolDescriptor,
};
use coveriteam_core::glob::glob_to_regex;

/// Descriptors by id. Passed explicitly to whatever builds atomic actors.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.toml` file directly inside `dir`, in file-name order.
    pub fn from_dir(dir: &Path) -> CoveriResult<Self> {
        let mut registry = Self::new();
        let entries = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
        for entry in entries {
            let entry = entry.map_err(|e| CoveriError::Config {
                reason: format!("cannot list tool directory '{}': {e}", dir.display()),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                registry.load_file(path)?;
            }
        }
        info!(dir = %dir.display(), tools = registry.len(), "tool descriptors loaded");
        Ok(registry)
    }

    /// Parse one descriptor file and register it.
    pub fn load_file(&mut self, path: &Path) -> CoveriResult<&ToolDescriptor> {
        let contents = std::fs::read_to_string(path).map_err(|e| CoveriError::Config {
            reason: format!("failed to read tool descriptor '{}': {e}", path.display()),
        })?;
        let mut descriptor = parse(&contents).map_err(|e| match e {
            CoveriError::Config { reason } => CoveriError::Config {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })?;
        if let Some(base) = path.parent() {
            resolve_command(&mut descriptor, base);
        }
        self.register(descriptor)
    }

    /// Parse a descriptor from TOML text and register it.
    pub fn load_toml_str(&mut self, s: &str) -> CoveriResult<&ToolDescriptor> {
        self.register(parse(s)?)
    }

    /// Add a descriptor. Ids are unique within a registry.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> CoveriResult<&ToolDescriptor> {
        validate(&descriptor)?;
        if self.tools.contains_key(&descriptor.id) {
            return Err(CoveriError::Config {
                reason: format!("tool '{}' is registered twice", descriptor.id),
            });
        }
        debug!(tool_id = %descriptor.id, command = ?descriptor.command, "tool registered");
        let id = descriptor.id.clone();
        let stored = self.tools.entry(id).or_insert(descriptor);
        Ok(&*stored)
    }

    pub fn get(&self, id: &str) -> CoveriResult<&ToolDescriptor> {
        self.tools.get(id).ok_or_else(|| CoveriError::Config {
            reason: format!("unknown tool '{id}'"),
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn parse(s: &str) -> CoveriResult<ToolDescriptor> {
    toml::from_str(s).map_err(|e| CoveriError::Config {
        reason: format!("failed to parse tool descriptor TOML: {e}"),
    })
}

fn validate(descriptor: &ToolDescriptor) -> CoveriResult<()> {
    let invalid = |reason: String| CoveriError::Config {
        reason: format!("tool '{}': {reason}", descriptor.id),
    };
    if descriptor.id.trim().is_empty() {
        return Err(CoveriError::Config {
            reason: "tool descriptor has an empty id".to_string(),
        });
    }
    if descriptor.command.is_empty() {
        return Err(invalid("command must name an executable".to_string()));
    }
    for rule in &descriptor.verdict_rules {
        Regex::new(&rule.pattern).map_err(|e| invalid(format!("verdict rule '{}': {e}", rule.id)))?;
    }
    for pattern in descriptor.result_files.values() {
        glob_to_regex(pattern)?;
    }
    Ok(())
}

fn resolve_command(descriptor: &mut ToolDescriptor, base: &Path) {
    for part in descriptor.command.iter_mut() {
        if let Some(rest) = part.strip_prefix("./") {
            let resolved: PathBuf = base.join(rest);
            *part = resolved.display().to_string();
        }
    }
}
