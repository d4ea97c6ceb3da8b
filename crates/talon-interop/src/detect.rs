//! Host environment detection
//!
//! `EnvironmentDetector::detect` is a deterministic, side-effect-free read
//! of the injected probe: most-capable backend first, and absence of a
//! marker is an ordinary outcome, never an error.

use crate::probe::{HostProbe, PlatformProbe};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The interop backends this layer knows how to drive
///
/// Doubles as the adapter registry key. `Unknown` is only ever produced by
/// detection; no adapter carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Prepared calls through libffi; any declared signature
    Libffi,
    /// Typed function-pointer casts; fixed signature family
    Direct,
    /// Embedder-registered interop provider
    Plugin,
    Unknown,
}

impl RuntimeKind {
    /// Fixed resolution cascade, most-capable first. Never reordered by
    /// runtime heuristics.
    pub const CASCADE: [RuntimeKind; 3] =
        [RuntimeKind::Libffi, RuntimeKind::Direct, RuntimeKind::Plugin];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Libffi => "libffi",
            RuntimeKind::Direct => "direct",
            RuntimeKind::Plugin => "plugin",
            RuntimeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of the detected host environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub kind: RuntimeKind,
    pub version: Option<String>,
    pub ffi_supported: bool,
}

/// Probes the host for capability markers
pub struct EnvironmentDetector {
    probe: Box<dyn PlatformProbe>,
}

impl EnvironmentDetector {
    pub fn new() -> Self {
        Self::with_probe(Box::new(HostProbe))
    }

    pub fn with_probe(probe: Box<dyn PlatformProbe>) -> Self {
        Self { probe }
    }

    /// Identify the host environment from ambient markers
    ///
    /// The plugin backend reports `ffi_supported = false` even when its
    /// marker is present: provider registration is not ambient-visible, so
    /// true availability is deferred to the adapter's own check.
    pub fn detect(&self) -> RuntimeInfo {
        for kind in RuntimeKind::CASCADE {
            if let Some(marker) = self.probe.marker(kind) {
                let ffi_supported = match kind {
                    RuntimeKind::Plugin => false,
                    _ => marker.can_open_native,
                };
                return RuntimeInfo {
                    kind,
                    version: marker.version,
                    ffi_supported,
                };
            }
        }
        RuntimeInfo {
            kind: RuntimeKind::Unknown,
            version: None,
            ffi_supported: false,
        }
    }
}

impl Default for EnvironmentDetector {
    fn default() -> Self {
        Self::new()
    }
}
