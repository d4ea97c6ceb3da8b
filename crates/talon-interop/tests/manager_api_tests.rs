//! Integration tests for the interop manager API
//!
//! Drives the whole layer through the public surface only: a scripted
//! probe, an injected registry, a provider-backed plugin adapter, and the
//! manager on top.

use std::path::Path;
use std::sync::Arc;

use talon_interop::{
    AdapterFactory, AdapterRegistry, BoundLibrary, CType, CValue, EnvironmentDetector, FfiManager,
    HostMarker, InteropError, InteropProvider, Phase, PlatformProbe, RuntimeKind, SymbolSpec,
    SymbolTable,
};

// Test doubles

struct NullProbe;

impl PlatformProbe for NullProbe {
    fn marker(&self, _kind: RuntimeKind) -> Option<HostMarker> {
        None
    }
}

extern "C" fn native_add(a: i32, b: i32) -> i32 {
    a + b
}

/// Provider dispatching to in-process `extern "C"` functions
struct EngineProvider;

struct EngineLibrary;

impl BoundLibrary for EngineLibrary {
    fn invoke(&self, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
        match spec.name.as_str() {
            "add" => {
                if let (CValue::I32(a), CValue::I32(b)) = (args[0], args[1]) {
                    Ok(CValue::I32(native_add(a, b)))
                } else {
                    unreachable!()
                }
            }
            other => Err(InteropError::FunctionNotFound(other.to_string())),
        }
    }
}

impl InteropProvider for EngineProvider {
    fn open(
        &self,
        _path: &Path,
        _table: &SymbolTable,
    ) -> Result<Box<dyn BoundLibrary>, InteropError> {
        Ok(Box::new(EngineLibrary))
    }
}

fn plugin_manager() -> FfiManager {
    let mut registry = AdapterRegistry::empty();
    registry.register(RuntimeKind::Plugin, || {
        Ok(Box::new(talon_interop::adapters::PluginAdapter::with_provider(Arc::new(
            EngineProvider,
        ))))
    });
    let detector = EnvironmentDetector::with_probe(Box::new(NullProbe));
    FfiManager::with_factory(AdapterFactory::with_parts(detector, registry))
}

fn engine_table() -> SymbolTable {
    SymbolTable::new(vec![SymbolSpec::new(
        "add",
        vec![CType::I32, CType::I32],
        CType::I32,
    )])
    .unwrap()
}

// Fail-fast before initialization

#[test]
fn test_capability_calls_fail_before_initialize() {
    let manager = plugin_manager();

    let err = manager.allocate_memory(1024).unwrap_err();
    assert!(matches!(err, InteropError::NotInitialized("allocate_memory")));

    let err = manager.create_cstring("prompt").unwrap_err();
    assert!(matches!(err, InteropError::NotInitialized("create_cstring")));

    let mut region = [0u8; 4];
    let err = manager.create_pointer(&mut region).unwrap_err();
    assert!(matches!(err, InteropError::NotInitialized("create_pointer")));

    let handle_err = manager
        .load_library(Path::new("libtalon_engine.so"), &engine_table())
        .unwrap_err();
    assert!(matches!(
        handle_err,
        InteropError::NotInitialized("load_library")
    ));
}

#[test]
fn test_runtime_kind_is_unknown_before_initialize() {
    let manager = plugin_manager();
    assert_eq!(manager.runtime_kind(), RuntimeKind::Unknown);
    assert_eq!(manager.phase(), Phase::Uninitialized);
}

// End-to-end dispatch

#[test]
fn test_dispatch_through_the_manager() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();
    assert_eq!(manager.runtime_kind(), RuntimeKind::Plugin);

    let handle = manager
        .load_library(Path::new("libtalon_engine.so"), &engine_table())
        .unwrap();
    assert!(handle.has_symbol("add"));

    let result = manager
        .call_function(&handle, "add", &[CValue::I32(2), CValue::I32(3)])
        .unwrap();
    assert_eq!(result, CValue::I32(5));
}

#[test]
fn test_missing_function_is_reported_by_name() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();
    let handle = manager
        .load_library(Path::new("libtalon_engine.so"), &engine_table())
        .unwrap();

    let err = manager.call_function(&handle, "missing", &[]).unwrap_err();
    assert!(matches!(err, InteropError::FunctionNotFound(_)));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_signature_validation_happens_before_dispatch() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();
    let handle = manager
        .load_library(Path::new("libtalon_engine.so"), &engine_table())
        .unwrap();

    let err = manager
        .call_function(&handle, "add", &[CValue::I32(1)])
        .unwrap_err();
    assert!(matches!(
        err,
        InteropError::ArityMismatch {
            expected: 2,
            got: 1
        }
    ));

    let err = manager
        .call_function(&handle, "add", &[CValue::I32(1), CValue::F64(2.0)])
        .unwrap_err();
    assert!(matches!(err, InteropError::TypeMismatch { index: 1, .. }));
}

// Buffers and strings through the manager

#[test]
fn test_buffer_contract() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();

    let mut buffer = manager.allocate_memory(1024).unwrap();
    assert_eq!(buffer.size(), 1024);
    assert_eq!(buffer.as_slice().len(), 1024);

    buffer.free();
    buffer.free();
    assert!(buffer.is_freed());

    let err = manager.allocate_memory(0).unwrap_err();
    assert!(matches!(err, InteropError::InvalidArgument(_)));
}

#[test]
fn test_cstring_and_pointer_tokens() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();

    let s = manager.create_cstring("weights.bin").unwrap();
    assert_eq!(s.as_bytes_with_nul(), b"weights.bin\0");

    let mut region = [7u8; 32];
    let ptr = manager.create_pointer(&mut region).unwrap();
    assert_eq!(ptr.len(), 32);
    assert!(!ptr.as_ptr().is_null());
}

// Lifecycle

#[test]
fn test_destroy_and_reinitialize() {
    let manager = plugin_manager();
    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();
    assert!(manager.is_initialized());

    manager.destroy();
    assert_eq!(manager.phase(), Phase::Uninitialized);
    assert!(matches!(
        manager.allocate_memory(16),
        Err(InteropError::NotInitialized(_))
    ));
    manager.destroy();

    manager.initialize(Some(RuntimeKind::Plugin)).unwrap();
    assert_eq!(manager.runtime_kind(), RuntimeKind::Plugin);
}

#[test]
fn test_initialization_failure_surfaces_and_leaves_state_clean() {
    let detector = EnvironmentDetector::with_probe(Box::new(NullProbe));
    let manager = FfiManager::with_factory(AdapterFactory::with_parts(
        detector,
        AdapterRegistry::empty(),
    ));

    let err = manager.initialize(None).unwrap_err();
    assert!(matches!(err, InteropError::InitializationFailed(_)));
    assert!(err.to_string().contains("no compatible adapter"));
    assert_eq!(manager.phase(), Phase::Uninitialized);
}
