//! Ambient host capability probing
//!
//! All inspection of the ambient process environment lives behind
//! `PlatformProbe`; the detector and everything above it only see the trait.
//! Probes are pure reads: no process spawning, no filesystem I/O, and a
//! missing marker is `None`, never an error.

use crate::detect::RuntimeKind;

/// What a host marker reveals about one interop backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMarker {
    /// Backend version, where the host exposes one
    pub version: Option<String>,
    /// Whether the backend's native-library-open primitive is present
    pub can_open_native: bool,
}

/// Narrow seam over ambient host markers
pub trait PlatformProbe: Send + Sync {
    /// The marker for one backend, or `None` when the host shows no trace
    /// of it. Must not panic.
    fn marker(&self, kind: RuntimeKind) -> Option<HostMarker>;
}

/// The real probe: compile-time target facts plus the one environment
/// variable an embedding application may set.
#[derive(Debug, Default)]
pub struct HostProbe;

/// Set by an embedding application to announce that it hosts an interop
/// provider. Whether a provider is actually registered cannot be read from
/// here; `PluginAdapter::is_available` is the authority.
pub const PLUGIN_HOST_VAR: &str = "TALON_PLUGIN_HOST";

impl PlatformProbe for HostProbe {
    fn marker(&self, kind: RuntimeKind) -> Option<HostMarker> {
        match kind {
            RuntimeKind::Libffi => {
                if cfg!(feature = "libffi-backend") {
                    Some(HostMarker {
                        version: None,
                        can_open_native: cfg!(any(unix, windows)),
                    })
                } else {
                    None
                }
            }
            RuntimeKind::Direct => {
                if cfg!(any(unix, windows)) {
                    Some(HostMarker {
                        version: Some(usize::BITS.to_string()),
                        // Typed-cast dispatch assumes 64-bit integer registers;
                        // narrower targets report the open primitive absent.
                        can_open_native: cfg!(target_pointer_width = "64"),
                    })
                } else {
                    None
                }
            }
            RuntimeKind::Plugin => std::env::var(PLUGIN_HOST_VAR).ok().map(|value| HostMarker {
                version: (!value.is_empty()).then_some(value),
                can_open_native: false,
            }),
            RuntimeKind::Unknown => None,
        }
    }
}
