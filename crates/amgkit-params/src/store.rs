//! Handle-typed parameter store.
//!
//! Mirrors the create → set/load → destroy protocol: every operation other
//! than [`ParameterStore::create`] requires a live store and fails with
//! [`AmgError::InvalidState`] otherwise.

use std::path::Path;

use amgkit_types::{AmgError, AmgResult, HandleState, Phase};

use crate::document;
use crate::snapshot::ParamSnapshot;
use crate::value::ParamValue;

const OBJECT: &str = "parameter store";

/// Ordered name → value configuration store.
///
/// A later set of the same name overwrites the earlier value in place.
#[derive(Debug, Default)]
pub struct ParameterStore {
    state: HandleState<ParamSnapshot>,
}

impl ParameterStore {
    /// Creates a store handle in the `Uncreated` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store handle that is already live.
    pub fn created() -> Self {
        Self {
            state: HandleState::Live(ParamSnapshot::new()),
        }
    }

    /// Moves `Uncreated → Live` with no entries.
    pub fn create(&mut self) -> AmgResult<()> {
        self.state.activate(ParamSnapshot::new(), OBJECT, "create")
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Sets an integer parameter.
    pub fn set_int(&mut self, name: &str, value: i64) -> AmgResult<()> {
        self.set(name, ParamValue::Int(value))
    }

    /// Sets a floating-point parameter.
    pub fn set_float(&mut self, name: &str, value: f64) -> AmgResult<()> {
        self.set(name, ParamValue::Float(value))
    }

    /// Sets a string parameter.
    pub fn set_string(&mut self, name: &str, value: &str) -> AmgResult<()> {
        self.set(name, ParamValue::Str(value.to_string()))
    }

    /// Sets a boolean parameter.
    pub fn set_bool(&mut self, name: &str, value: bool) -> AmgResult<()> {
        self.set(name, ParamValue::Bool(value))
    }

    /// Sets any parameter value.
    pub fn set(&mut self, name: &str, value: ParamValue) -> AmgResult<()> {
        let entries = self.state.live_mut(OBJECT, "set parameter on")?;
        document::validate_name(name)?;
        tracing::trace!(name, %value, "parameter set");
        entries.insert(name, value);
        Ok(())
    }

    /// Reads back a parameter.
    pub fn get(&self, name: &str) -> AmgResult<Option<&ParamValue>> {
        Ok(self.state.live(OBJECT, "read")?.get(name))
    }

    /// Number of stored parameters.
    pub fn len(&self) -> AmgResult<usize> {
        Ok(self.state.live(OBJECT, "read")?.len())
    }

    /// Returns true if no parameters are stored.
    pub fn is_empty(&self) -> AmgResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Merges a JSON parameter document from disk.
    ///
    /// All-or-nothing: if the file cannot be read or parsed, the store is
    /// left exactly as it was.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> AmgResult<usize> {
        self.state.live(OBJECT, "load JSON into")?;
        let text = std::fs::read_to_string(path.as_ref())?;
        let entries = document::parse_json(&text)?;
        self.merge(entries, path.as_ref())
    }

    /// Merges a JSON parameter document held in memory.
    pub fn load_json_str(&mut self, text: &str) -> AmgResult<usize> {
        self.state.live(OBJECT, "load JSON into")?;
        let entries = document::parse_json(text)?;
        self.merge(entries, Path::new("<memory>"))
    }

    /// Merges a TOML parameter document from disk. Same semantics as
    /// [`ParameterStore::load_json`].
    pub fn load_toml(&mut self, path: impl AsRef<Path>) -> AmgResult<usize> {
        self.state.live(OBJECT, "load TOML into")?;
        let text = std::fs::read_to_string(path.as_ref())?;
        let entries = document::parse_toml(&text)?;
        self.merge(entries, path.as_ref())
    }

    /// Loads a document, choosing the format from the file extension
    /// (`.toml` → TOML, anything else → JSON).
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> AmgResult<usize> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.load_toml(path),
            _ => self.load_json(path),
        }
    }

    fn merge(&mut self, entries: document::Entries, source: &Path) -> AmgResult<usize> {
        let store = self.state.live_mut(OBJECT, "merge into")?;
        let count = entries.len();
        for (name, value) in entries {
            store.insert(&name, value);
        }
        tracing::debug!(source = %source.display(), count, "parameters loaded");
        Ok(count)
    }

    /// Deep copy of the current entries, for consumption by a build.
    pub fn snapshot(&self) -> AmgResult<ParamSnapshot> {
        Ok(self.state.live(OBJECT, "snapshot")?.clone())
    }

    /// Releases the store. A second call fails with `InvalidState`.
    pub fn destroy(&mut self) -> AmgResult<()> {
        let released = self.state.take_for_destroy(OBJECT)?;
        tracing::debug!(entries = released.len(), "parameter store destroyed");
        Ok(())
    }
}

impl TryFrom<&ParameterStore> for ParamSnapshot {
    type Error = AmgError;

    fn try_from(store: &ParameterStore) -> AmgResult<Self> {
        store.snapshot()
    }
}
