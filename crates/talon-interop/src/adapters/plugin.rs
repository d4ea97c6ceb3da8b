//! Provider-delegating backend
//!
//! Some embedders ship their own interop machinery as an optional add-on.
//! This backend delegates library opening to an `InteropProvider` the
//! embedding application registers at startup. Ambient probing cannot see
//! whether registration happened, so detection always reports this
//! environment as unsupported and `is_available()` is the authority.
//!
//! The adapter snapshots the registered provider at construction; its
//! availability never changes afterwards, even if the registration does.

use crate::adapter::{BoundLibrary, LibraryHandle, NativeAdapter};
use crate::detect::RuntimeKind;
use crate::error::InteropError;
use crate::symbol::SymbolTable;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Interop machinery supplied by the embedding application
pub trait InteropProvider: Send + Sync {
    /// Open `path` and return a dispatcher for exactly the symbols in
    /// `table`
    fn open(&self, path: &Path, table: &SymbolTable)
        -> Result<Box<dyn BoundLibrary>, InteropError>;
}

static PROVIDER: RwLock<Option<Arc<dyn InteropProvider>>> = RwLock::new(None);

/// Register the process-wide interop provider
///
/// Adapters constructed afterwards will see it; adapters constructed before
/// keep their original (absent) provider.
pub fn register_provider(provider: Arc<dyn InteropProvider>) {
    *PROVIDER.write().unwrap_or_else(PoisonError::into_inner) = Some(provider);
}

fn registered_provider() -> Option<Arc<dyn InteropProvider>> {
    PROVIDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub struct PluginAdapter {
    provider: Option<Arc<dyn InteropProvider>>,
}

impl PluginAdapter {
    /// Snapshot whatever provider is registered right now
    pub fn new() -> Self {
        Self {
            provider: registered_provider(),
        }
    }

    /// Bypass the process-wide registration and use `provider` directly
    pub fn with_provider(provider: Arc<dyn InteropProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }
}

impl Default for PluginAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeAdapter for PluginAdapter {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Plugin
    }

    fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn load_library(
        &self,
        path: &Path,
        table: &SymbolTable,
    ) -> Result<LibraryHandle, InteropError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(InteropError::AdapterUnavailable(RuntimeKind::Plugin))?;
        let inner = provider.open(path, table)?;
        Ok(LibraryHandle::bind(path, table, inner))
    }
}
