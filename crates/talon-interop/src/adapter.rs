//! The native-interop adapter contract
//!
//! Exactly one concrete adapter is active per manager at a time. Backends
//! differ only in how they open a library and form calls; the capability
//! surface, availability guards, and signature validation are shared here.

use crate::detect::RuntimeKind;
use crate::error::InteropError;
use crate::memory::{BorrowedPtr, MemoryBuffer, OwnedCString};
use crate::symbol::{SymbolSpec, SymbolTable};
use crate::value::CValue;
use std::path::{Path, PathBuf};

/// Platform extension for native shared libraries
pub fn platform_library_extension() -> &'static str {
    if cfg!(windows) {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Platform filename for a library stem, e.g. `talon` -> `libtalon.so`
pub fn library_filename(stem: &str) -> String {
    if cfg!(windows) {
        format!("{}.{}", stem, platform_library_extension())
    } else {
        format!("lib{}.{}", stem, platform_library_extension())
    }
}

/// A library opened against a symbol table, dispatch-ready
///
/// Implementations hold whatever the backend needs to keep the library and
/// its bound symbols alive; `invoke` receives a spec already validated
/// against the caller's arguments.
pub trait BoundLibrary {
    fn invoke(&self, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError>;
}

/// The bound, callable result of opening a native library
///
/// The table passed at load time fully determines the callable surface: no
/// function outside it is reachable through the handle.
pub struct LibraryHandle {
    path: PathBuf,
    table: SymbolTable,
    inner: Box<dyn BoundLibrary>,
}

impl LibraryHandle {
    pub(crate) fn bind(path: &Path, table: &SymbolTable, inner: Box<dyn BoundLibrary>) -> Self {
        Self {
            path: path.to_path_buf(),
            table: table.clone(),
            inner,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.table.names()
    }

    pub(crate) fn invoke(&self, name: &str, args: &[CValue]) -> Result<CValue, InteropError> {
        let spec = self
            .table
            .get(name)
            .ok_or_else(|| InteropError::FunctionNotFound(name.to_string()))?;
        if args.len() != spec.args.len() {
            return Err(InteropError::ArityMismatch {
                expected: spec.args.len(),
                got: args.len(),
            });
        }
        for (index, (value, expected)) in args.iter().zip(&spec.args).enumerate() {
            if value.tag() != *expected {
                return Err(InteropError::TypeMismatch {
                    index,
                    expected: *expected,
                    got: value.tag(),
                });
            }
        }
        self.inner.invoke(spec, args)
    }
}

impl std::fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("path", &self.path)
            .field("symbols", &self.table.len())
            .finish()
    }
}

/// Capability contract implemented by every interop backend
///
/// Availability is fixed for the adapter's lifetime: backends snapshot their
/// inputs at construction, so `is_available()` never flickers.
pub trait NativeAdapter: Send + Sync {
    /// Constant identity of this backend
    fn kind(&self) -> RuntimeKind;

    /// Whether this backend can reach native code in this process. Never
    /// fails; unavailability is a normal outcome.
    fn is_available(&self) -> bool;

    /// Open the library at `path` and eagerly bind every symbol in `table`
    fn load_library(&self, path: &Path, table: &SymbolTable)
        -> Result<LibraryHandle, InteropError>;

    fn library_extension(&self) -> Result<&'static str, InteropError> {
        self.ensure_available()?;
        Ok(platform_library_extension())
    }

    fn allocate_memory(&self, size: usize) -> Result<MemoryBuffer, InteropError> {
        self.ensure_available()?;
        MemoryBuffer::allocate(size)
    }

    /// A non-owning pointer into caller-owned memory; never copies
    fn create_pointer<'a>(&self, region: &'a mut [u8]) -> Result<BorrowedPtr<'a>, InteropError> {
        self.ensure_available()?;
        Ok(BorrowedPtr::new(region))
    }

    /// A NUL-terminated copy of `s`, owned by the caller
    fn create_cstring(&self, s: &str) -> Result<OwnedCString, InteropError> {
        self.ensure_available()?;
        OwnedCString::new(s)
    }

    /// Synchronously dispatch a bound function and return its result
    /// unmodified
    fn call_function(
        &self,
        handle: &LibraryHandle,
        name: &str,
        args: &[CValue],
    ) -> Result<CValue, InteropError> {
        self.ensure_available()?;
        handle.invoke(name, args)
    }

    fn ensure_available(&self) -> Result<(), InteropError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(InteropError::AdapterUnavailable(self.kind()))
        }
    }
}

impl std::fmt::Debug for dyn NativeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAdapter")
            .field("kind", &self.kind())
            .finish()
    }
}
