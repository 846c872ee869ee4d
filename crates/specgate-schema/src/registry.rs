//! # Spec Registry
//!
//! Holds every compiled spec by name plus the prefix → name route table,
//! behind a single [`parking_lot::RwLock`]. Resolution takes the read lock;
//! load, route and removal operations take the write lock.
//!
//! ## Invariants
//!
//! - Every route targets a spec present in the name map. `add_route` rejects
//!   unknown names and `remove` purges the routes of the removed spec.
//! - Routes are kept sorted by descending prefix length (ties broken
//!   lexicographically), so the longest matching prefix always wins and
//!   insertion order is never observable.
//! - Compilation runs before the write lock is taken. The insert of a spec
//!   and its route is one locked step; readers never see half a load.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::compile::{compile, CompiledDocument};
use crate::config::SpecEntry;
use crate::error::SpecError;
use crate::validate::SpecValidator;

/// File extensions picked up by [`SpecRegistry::load_directory`].
const SPEC_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// One loaded spec. Immutable once created.
#[derive(Debug)]
pub struct CompiledSpec {
    name: String,
    base_path: String,
    source: PathBuf,
    document: CompiledDocument,
}

impl CompiledSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix this spec was loaded with; empty when loaded without a route.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    pub fn description(&self) -> &str {
        &self.document.description
    }

    pub fn validator(&self) -> &SpecValidator {
        &self.document.validator
    }

    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            name: self.name.clone(),
            base_path: self.base_path.clone(),
            title: self.document.title.clone(),
            version: self.document.version.clone(),
            description: self.document.description.clone(),
            operations: self.document.validator.operation_count(),
            source: self.source.display().to_string(),
        }
    }
}

/// Read-only description of a loaded spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecSummary {
    pub name: String,
    pub base_path: String,
    pub title: String,
    pub version: String,
    pub description: String,
    pub operations: usize,
    pub source: String,
}

/// One prefix → spec route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub spec: String,
}

/// Match order: longer prefixes first, then lexicographic.
fn route_order(a: &RouteEntry, b: &RouteEntry) -> Ordering {
    b.prefix
        .len()
        .cmp(&a.prefix.len())
        .then_with(|| a.prefix.cmp(&b.prefix))
}

#[derive(Debug, Default)]
struct Inner {
    specs: HashMap<String, Arc<CompiledSpec>>,
    routes: Vec<RouteEntry>,
    fallback: Option<String>,
}

impl Inner {
    fn upsert_route(&mut self, prefix: &str, name: &str) {
        let entry = RouteEntry {
            prefix: prefix.to_string(),
            spec: name.to_string(),
        };
        match self.routes.binary_search_by(|r| route_order(r, &entry)) {
            Ok(index) => self.routes[index] = entry,
            Err(index) => self.routes.insert(index, entry),
        }
    }
}

/// Registry of compiled specs and their routes.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    inner: RwLock<Inner>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `file_path` and register it as `name`. A non-empty
    /// `base_path` also routes that prefix to `name`, replacing any previous
    /// target of the prefix. Re-loading an existing name replaces the spec.
    ///
    /// # Errors
    ///
    /// Any [`compile`] error. The registry is unchanged on failure.
    pub fn load(
        &self,
        name: &str,
        file_path: impl AsRef<Path>,
        base_path: &str,
    ) -> Result<Arc<CompiledSpec>, SpecError> {
        let file_path = file_path.as_ref();
        let document = compile(file_path)?;
        let spec = Arc::new(CompiledSpec {
            name: name.to_string(),
            base_path: base_path.to_string(),
            source: file_path.to_path_buf(),
            document,
        });

        {
            let mut inner = self.inner.write();
            inner.specs.insert(name.to_string(), Arc::clone(&spec));
            if !base_path.is_empty() {
                inner.upsert_route(base_path, name);
            }
        }

        tracing::info!(
            spec = name,
            base_path,
            file = %file_path.display(),
            title = spec.title(),
            operations = spec.validator().operation_count(),
            "loaded spec"
        );
        Ok(spec)
    }

    /// Load every `*.yaml`, `*.yml` and `*.json` file in `dir`, named by file
    /// stem, without routes. Files load in name order; the first failure
    /// stops the walk.
    ///
    /// # Errors
    ///
    /// [`SpecError::DirectoryRead`] if `dir` cannot be listed, otherwise the
    /// first [`compile`] error.
    pub fn load_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<String>, SpecError> {
        let dir = dir.as_ref();
        let dir_err = |source| SpecError::DirectoryRead {
            path: dir.display().to_string(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(dir_err)? {
            let path = entry.map_err(dir_err)?.path();
            let is_spec = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SPEC_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if is_spec && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut loaded = Vec::with_capacity(files.len());
        for path in files {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(file = %path.display(), "skipping spec file with non-UTF-8 name");
                continue;
            };
            let name = name.to_string();
            self.load(&name, &path, "")?;
            loaded.push(name);
        }
        Ok(loaded)
    }

    /// Load every enabled entry in order, stopping at the first failure.
    /// Specs loaded before a failure stay registered. Returns the number of
    /// specs loaded.
    ///
    /// # Errors
    ///
    /// [`SpecError::NoSpecsConfigured`] if `entries` is empty, otherwise the
    /// first load error.
    pub fn load_from_config(&self, entries: &[SpecEntry]) -> Result<usize, SpecError> {
        if entries.is_empty() {
            return Err(SpecError::NoSpecsConfigured);
        }
        let mut loaded = 0;
        for entry in entries {
            if !entry.enabled {
                tracing::debug!(spec = %entry.name, "spec disabled, skipping");
                continue;
            }
            self.load(&entry.name, &entry.file_path, &entry.base_path)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Find the spec governing `path`: longest matching route prefix, then
    /// the fallback.
    ///
    /// # Errors
    ///
    /// [`SpecError::NoValidatorFound`] if neither applies.
    pub fn resolve(&self, path: &str) -> Result<Arc<CompiledSpec>, SpecError> {
        let inner = self.inner.read();
        let routed = inner
            .routes
            .iter()
            .find(|r| path.starts_with(r.prefix.as_str()))
            .map(|r| r.spec.as_str());
        routed
            .or(inner.fallback.as_deref())
            .and_then(|name| inner.specs.get(name))
            .cloned()
            .ok_or_else(|| SpecError::NoValidatorFound(path.to_string()))
    }

    /// Route `prefix` to the loaded spec `name`, replacing any previous target.
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownSpec`] if `name` is not loaded.
    pub fn add_route(&self, prefix: &str, name: &str) -> Result<(), SpecError> {
        let mut inner = self.inner.write();
        if !inner.specs.contains_key(name) {
            return Err(SpecError::UnknownSpec(name.to_string()));
        }
        inner.upsert_route(prefix, name);
        tracing::info!(prefix, spec = name, "route mapped");
        Ok(())
    }

    /// Drop the spec `name` and every route to it. Clears the fallback if it
    /// named the spec. Returns the removed spec, if any.
    pub fn remove(&self, name: &str) -> Option<Arc<CompiledSpec>> {
        let mut inner = self.inner.write();
        let removed = inner.specs.remove(name)?;
        let before = inner.routes.len();
        inner.routes.retain(|r| r.spec != name);
        let purged = before - inner.routes.len();
        if inner.fallback.as_deref() == Some(name) {
            inner.fallback = None;
        }
        tracing::info!(spec = name, routes_purged = purged, "spec removed");
        Some(removed)
    }

    /// Set or clear the fallback spec.
    ///
    /// # Errors
    ///
    /// [`SpecError::UnknownSpec`] if `name` is not loaded.
    pub fn set_fallback(&self, name: Option<&str>) -> Result<(), SpecError> {
        let mut inner = self.inner.write();
        if let Some(name) = name {
            if !inner.specs.contains_key(name) {
                return Err(SpecError::UnknownSpec(name.to_string()));
            }
        }
        inner.fallback = name.map(str::to_string);
        Ok(())
    }

    pub fn fallback(&self) -> Option<String> {
        self.inner.read().fallback.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledSpec>> {
        self.inner.read().specs.get(name).cloned()
    }

    /// Summaries of every loaded spec, sorted by name.
    pub fn list(&self) -> Vec<SpecSummary> {
        let mut summaries: Vec<_> = self
            .inner
            .read()
            .specs
            .values()
            .map(|s| s.summary())
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Routes in match order.
    pub fn routes(&self) -> Vec<RouteEntry> {
        self.inner.read().routes.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
