//! Interop backends
//!
//! One module per host mechanism. Each exports a zero-argument-constructible
//! `NativeAdapter` implementation; the factory's registry maps a
//! `RuntimeKind` onto these constructors.

pub mod direct;
#[cfg(feature = "libffi-backend")]
pub mod libffi;
pub mod plugin;

pub use self::direct::DirectAdapter;
#[cfg(feature = "libffi-backend")]
pub use self::libffi::LibffiAdapter;
pub use self::plugin::{register_provider, InteropProvider, PluginAdapter};

use crate::error::InteropError;
use crate::symbol::SymbolTable;
use libloading::Library;
use std::collections::HashMap;
use std::path::Path;

/// Open a native library and bind every declared symbol eagerly
///
/// A path that cannot be opened or a declared symbol that is absent both
/// fail the whole load; a handle never exists with a partial table.
pub(crate) fn open_and_bind(
    path: &Path,
    table: &SymbolTable,
) -> Result<(Library, HashMap<String, usize>), InteropError> {
    let shown = path.display().to_string();
    let library = unsafe { Library::new(path) }.map_err(|e| InteropError::LibraryLoadFailure {
        path: shown.clone(),
        reason: e.to_string(),
    })?;

    let mut symbols = HashMap::with_capacity(table.len());
    for spec in table.iter() {
        let symbol: libloading::Symbol<'_, *const ()> = unsafe {
            library.get(spec.name.as_bytes()).map_err(|e| {
                InteropError::LibraryLoadFailure {
                    path: shown.clone(),
                    reason: format!("symbol '{}' not found: {}", spec.name, e),
                }
            })?
        };
        symbols.insert(spec.name.clone(), *symbol as usize);
    }
    Ok((library, symbols))
}
