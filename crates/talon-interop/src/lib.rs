//! Talon interop - adapter resolution and native-interop management
//!
//! Lets engine code call the Talon native library without knowing, at call
//! sites, which interop backend the process runs under:
//! - Environment detection over a narrow platform probe
//! - Adapter resolution with a fixed preference/fallback cascade
//! - Lifecycle and resource safety for native calls, buffers, and symbol
//!   tables behind one guarded contract
//!
//! Model loading, request handling, and the numeric behavior of the native
//! library live in their own crates; this one only dispatches.
//!
//! # Example
//!
//! ```no_run
//! use talon_interop::{CType, CValue, FfiManager, SymbolSpec, SymbolTable};
//!
//! # fn main() -> Result<(), talon_interop::InteropError> {
//! let table = SymbolTable::new(vec![
//!     SymbolSpec::new("engine_open", vec![CType::CString], CType::Pointer),
//!     SymbolSpec::new("engine_eval", vec![CType::Pointer, CType::I32], CType::I32),
//!     SymbolSpec::new("engine_close", vec![CType::Pointer], CType::Void),
//! ])?;
//!
//! let manager = FfiManager::shared()?;
//! let handle = manager.load_library("libtalon_engine.so".as_ref(), &table)?;
//!
//! let model = manager.create_cstring("weights.bin")?;
//! let engine = manager.call_function(&handle, "engine_open", &[model.as_value()])?;
//! let result = manager.call_function(&handle, "engine_eval", &[engine, CValue::I32(16)])?;
//! manager.call_function(&handle, "engine_close", &[engine])?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;
pub mod adapters;
pub mod detect;
pub mod error;
pub mod factory;
pub mod manager;
pub mod memory;
pub mod probe;
pub mod symbol;
pub mod value;

pub use adapter::{
    library_filename, platform_library_extension, BoundLibrary, LibraryHandle, NativeAdapter,
};
pub use adapters::{register_provider, InteropProvider};
pub use detect::{EnvironmentDetector, RuntimeInfo, RuntimeKind};
pub use error::InteropError;
pub use factory::{AdapterFactory, AdapterRegistry, FfiOptions};
pub use manager::{FfiManager, Phase};
pub use memory::{BorrowedPtr, MemoryBuffer, OwnedCString};
pub use probe::{HostMarker, PlatformProbe};
pub use symbol::{SymbolSpec, SymbolTable};
pub use value::{CType, CValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        // Smoke test to verify the crate builds and tests run
        assert_eq!(VERSION, "0.1.0");
    }
}
