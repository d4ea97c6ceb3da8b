//! Integration tests for detection and adapter resolution

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use talon_interop::{
    AdapterFactory, AdapterRegistry, EnvironmentDetector, FfiOptions, HostMarker, InteropError,
    LibraryHandle, NativeAdapter, PlatformProbe, RuntimeKind, SymbolTable,
};

struct MarkerProbe {
    markers: Vec<(RuntimeKind, bool)>,
}

impl PlatformProbe for MarkerProbe {
    fn marker(&self, kind: RuntimeKind) -> Option<HostMarker> {
        self.markers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, can_open)| HostMarker {
                version: Some("3.1.4".to_string()),
                can_open_native: *can_open,
            })
    }
}

struct StubAdapter {
    kind: RuntimeKind,
    available: bool,
}

impl NativeAdapter for StubAdapter {
    fn kind(&self) -> RuntimeKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn load_library(
        &self,
        _path: &Path,
        _table: &SymbolTable,
    ) -> Result<LibraryHandle, InteropError> {
        Err(InteropError::AdapterUnavailable(self.kind))
    }
}

struct Fleet {
    factory: AdapterFactory,
    loads: Vec<(RuntimeKind, Arc<AtomicUsize>)>,
}

impl Fleet {
    /// `spec`: kind -> Some(available) to construct, None to fail loading
    fn new(spec: Vec<(RuntimeKind, Option<bool>)>, detected: Vec<(RuntimeKind, bool)>) -> Self {
        let mut registry = AdapterRegistry::empty();
        let mut loads = Vec::new();
        for (kind, outcome) in spec {
            let counter = Arc::new(AtomicUsize::new(0));
            loads.push((kind, Arc::clone(&counter)));
            registry.register(kind, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                match outcome {
                    Some(available) => Ok(Box::new(StubAdapter { kind, available })),
                    None => Err(InteropError::AdapterLoadFailure {
                        kind,
                        reason: "backend module import failed".to_string(),
                    }),
                }
            });
        }
        let detector = EnvironmentDetector::with_probe(Box::new(MarkerProbe { markers: detected }));
        Self {
            factory: AdapterFactory::with_parts(detector, registry),
            loads,
        }
    }

    fn loads_of(&self, kind: RuntimeKind) -> usize {
        self.loads
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, c)| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

// Detection rules

#[test]
fn test_detect_reports_open_primitive_for_capable_environments() {
    for kind in [RuntimeKind::Libffi, RuntimeKind::Direct] {
        let with_open =
            EnvironmentDetector::with_probe(Box::new(MarkerProbe { markers: vec![(kind, true)] }));
        assert!(with_open.detect().ffi_supported);

        let without_open =
            EnvironmentDetector::with_probe(Box::new(MarkerProbe { markers: vec![(kind, false)] }));
        let info = without_open.detect();
        assert_eq!(info.kind, kind);
        assert!(!info.ffi_supported);
    }
}

#[test]
fn test_detect_defers_plugin_support_to_the_adapter() {
    let detector = EnvironmentDetector::with_probe(Box::new(MarkerProbe {
        markers: vec![(RuntimeKind::Plugin, true)],
    }));
    let info = detector.detect();
    assert_eq!(info.kind, RuntimeKind::Plugin);
    assert!(!info.ffi_supported, "plugin support is never ambient-visible");
}

#[test]
fn test_detect_with_no_markers_is_unknown() {
    let detector = EnvironmentDetector::with_probe(Box::new(MarkerProbe { markers: vec![] }));
    let info = detector.detect();
    assert_eq!(info.kind, RuntimeKind::Unknown);
    assert!(!info.ffi_supported);
    assert!(info.version.is_none());
}

// Resolution cascade

#[test]
fn test_unavailable_preference_falls_back_to_first_capable_kind() {
    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(true)),
            (RuntimeKind::Direct, Some(true)),
            (RuntimeKind::Plugin, Some(false)),
        ],
        vec![],
    );
    let adapter = fleet
        .factory
        .resolve(&FfiOptions::preferring(RuntimeKind::Plugin))
        .unwrap();
    assert_eq!(adapter.kind(), RuntimeKind::Libffi);

    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(false)),
            (RuntimeKind::Direct, Some(true)),
            (RuntimeKind::Plugin, Some(false)),
        ],
        vec![],
    );
    let adapter = fleet
        .factory
        .resolve(&FfiOptions::preferring(RuntimeKind::Plugin))
        .unwrap();
    assert_eq!(adapter.kind(), RuntimeKind::Direct);
}

#[test]
fn test_nothing_available_exhausts_the_cascade() {
    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(false)),
            (RuntimeKind::Direct, Some(false)),
            (RuntimeKind::Plugin, Some(false)),
        ],
        vec![],
    );
    let err = fleet
        .factory
        .resolve(&FfiOptions::preferring(RuntimeKind::Plugin))
        .unwrap_err();
    assert!(matches!(err, InteropError::NoCompatibleAdapter));
    let message = err.to_string();
    for name in ["libffi", "direct", "plugin"] {
        assert!(message.contains(name));
    }
}

#[test]
fn test_strict_preference_pins_load_failures() {
    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(true)),
            (RuntimeKind::Direct, Some(true)),
            (RuntimeKind::Plugin, None),
        ],
        vec![],
    );
    let err = fleet
        .factory
        .resolve(&FfiOptions::strict(RuntimeKind::Plugin))
        .unwrap_err();
    match err {
        InteropError::AdapterLoadFailure { kind, .. } => assert_eq!(kind, RuntimeKind::Plugin),
        other => panic!("expected AdapterLoadFailure, got {:?}", other),
    }
    // No other candidate was even attempted.
    assert_eq!(fleet.loads_of(RuntimeKind::Libffi), 0);
    assert_eq!(fleet.loads_of(RuntimeKind::Direct), 0);
}

#[test]
fn test_relaxed_preference_swallows_load_failures() {
    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(true)),
            (RuntimeKind::Direct, Some(true)),
            (RuntimeKind::Plugin, None),
        ],
        vec![],
    );
    let adapter = fleet
        .factory
        .resolve(&FfiOptions::preferring(RuntimeKind::Plugin))
        .unwrap();
    assert_eq!(adapter.kind(), RuntimeKind::Libffi);
    assert_eq!(fleet.loads_of(RuntimeKind::Plugin), 1);
}

#[test]
fn test_detected_environment_is_tried_before_the_cascade() {
    let fleet = Fleet::new(
        vec![
            (RuntimeKind::Libffi, Some(true)),
            (RuntimeKind::Direct, Some(true)),
            (RuntimeKind::Plugin, Some(true)),
        ],
        vec![(RuntimeKind::Direct, true)],
    );
    let adapter = fleet.factory.resolve(&FfiOptions::default()).unwrap();
    assert_eq!(adapter.kind(), RuntimeKind::Direct);
    assert_eq!(fleet.loads_of(RuntimeKind::Libffi), 0);
    assert_eq!(fleet.loads_of(RuntimeKind::Direct), 1);
}
