//! Stateful interop manager
//!
//! Wraps one resolved adapter behind an initialization state machine with
//! fail-fast guards. All operations serialize on the manager's internal
//! mutex, which gives two guarantees at once: strict call order within one
//! manager, and single-flight initialization — racing initializers
//! serialize, and whoever enters second finds the manager ready and returns
//! without constructing a second adapter.

use crate::adapter::{LibraryHandle, NativeAdapter};
use crate::detect::RuntimeKind;
use crate::error::InteropError;
use crate::factory::{AdapterFactory, FfiOptions};
use crate::memory::{BorrowedPtr, MemoryBuffer, OwnedCString};
use crate::symbol::SymbolTable;
use crate::value::CValue;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::debug;

/// Manager lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
}

struct ManagerState {
    phase: Phase,
    adapter: Option<Box<dyn NativeAdapter>>,
}

/// One resolved adapter behind a uniform, guarded contract
///
/// The bound adapter is exclusively owned: it never leaves the manager, and
/// no other manager can share it.
pub struct FfiManager {
    factory: AdapterFactory,
    state: Mutex<ManagerState>,
}

impl FfiManager {
    pub fn new() -> Self {
        Self::with_factory(AdapterFactory::new())
    }

    pub fn with_factory(factory: AdapterFactory) -> Self {
        Self {
            factory,
            state: Mutex::new(ManagerState {
                phase: Phase::Uninitialized,
                adapter: None,
            }),
        }
    }

    /// The process-wide manager, created lazily and initialized on access
    ///
    /// After the first successful initialization every access returns the
    /// same bound instance without re-resolving; a failed initialization is
    /// retried on the next access.
    pub fn shared() -> Result<&'static FfiManager, InteropError> {
        static SHARED: OnceLock<FfiManager> = OnceLock::new();
        let manager = SHARED.get_or_init(FfiManager::new);
        manager.initialize(None)?;
        Ok(manager)
    }

    /// Resolve and bind an adapter
    ///
    /// Idempotent: once ready, further calls change nothing — not the
    /// phase, not the adapter, not the reported runtime — regardless of
    /// `preferred`.
    pub fn initialize(&self, preferred: Option<RuntimeKind>) -> Result<(), InteropError> {
        let mut state = self.lock();
        if state.phase == Phase::Ready {
            return Ok(());
        }
        let options = FfiOptions {
            preferred_runtime: preferred,
            fallback_enabled: true,
        };
        let adapter = self
            .factory
            .resolve(&options)
            .map_err(|err| InteropError::InitializationFailed(Box::new(err)))?;
        debug!(kind = %adapter.kind(), "interop manager bound adapter");
        state.adapter = Some(adapter);
        state.phase = Phase::Ready;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_initialized(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// The bound adapter's runtime, or `Unknown` before initialization
    pub fn runtime_kind(&self) -> RuntimeKind {
        self.lock()
            .adapter
            .as_ref()
            .map(|a| a.kind())
            .unwrap_or(RuntimeKind::Unknown)
    }

    /// Release the bound adapter; a no-op when already uninitialized
    pub fn destroy(&self) {
        let mut state = self.lock();
        if state.adapter.is_some() {
            debug!("interop manager released adapter");
        }
        state.adapter = None;
        state.phase = Phase::Uninitialized;
    }

    pub fn load_library(
        &self,
        path: &Path,
        table: &SymbolTable,
    ) -> Result<LibraryHandle, InteropError> {
        self.with_adapter("load_library", |adapter| adapter.load_library(path, table))
    }

    pub fn allocate_memory(&self, size: usize) -> Result<MemoryBuffer, InteropError> {
        self.with_adapter("allocate_memory", |adapter| adapter.allocate_memory(size))
    }

    pub fn create_pointer<'a>(
        &self,
        region: &'a mut [u8],
    ) -> Result<BorrowedPtr<'a>, InteropError> {
        self.with_adapter("create_pointer", |adapter| adapter.create_pointer(region))
    }

    pub fn create_cstring(&self, s: &str) -> Result<OwnedCString, InteropError> {
        self.with_adapter("create_cstring", |adapter| adapter.create_cstring(s))
    }

    pub fn call_function(
        &self,
        handle: &LibraryHandle,
        name: &str,
        args: &[CValue],
    ) -> Result<CValue, InteropError> {
        self.with_adapter("call_function", |adapter| {
            adapter.call_function(handle, name, args)
        })
    }

    /// Run `op` against the bound adapter, failing fast before `Ready`
    fn with_adapter<R>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&dyn NativeAdapter) -> Result<R, InteropError>,
    ) -> Result<R, InteropError> {
        let state = self.lock();
        match state.adapter.as_deref() {
            Some(adapter) => op(adapter),
            None => Err(InteropError::NotInitialized(operation)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FfiManager {
    fn default() -> Self {
        Self::new()
    }
}
