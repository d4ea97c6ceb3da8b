//! Adapter resolution
//!
//! Resolves "the" adapter for this process: preferred runtime first, then
//! the detected one, then the rest of the fixed cascade. Failures during
//! fallback are swallowed; the one fatal shape is a preferred runtime that
//! fails to *load* while fallback is disabled. "Constructed but
//! unavailable" is a normal outcome and never fatal.

use crate::adapter::NativeAdapter;
use crate::adapters::{DirectAdapter, PluginAdapter};
use crate::detect::{EnvironmentDetector, RuntimeKind};
use crate::error::InteropError;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Caller preferences for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiOptions {
    pub preferred_runtime: Option<RuntimeKind>,
    pub fallback_enabled: bool,
}

impl Default for FfiOptions {
    fn default() -> Self {
        Self {
            preferred_runtime: None,
            fallback_enabled: true,
        }
    }
}

impl FfiOptions {
    /// Prefer `kind`, falling back through the cascade if it fails
    pub fn preferring(kind: RuntimeKind) -> Self {
        Self {
            preferred_runtime: Some(kind),
            ..Self::default()
        }
    }

    /// Require `kind`: a load failure is fatal instead of starting fallback
    pub fn strict(kind: RuntimeKind) -> Self {
        Self {
            preferred_runtime: Some(kind),
            fallback_enabled: false,
        }
    }
}

type AdapterCtor = Box<dyn Fn() -> Result<Box<dyn NativeAdapter>, InteropError> + Send + Sync>;

/// Maps a runtime kind onto its adapter constructor
///
/// The default registry carries the three real backends; tests swap in
/// counting or failing constructors.
pub struct AdapterRegistry {
    ctors: HashMap<RuntimeKind, AdapterCtor>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    pub fn defaults() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "libffi-backend")]
        registry.register(RuntimeKind::Libffi, || {
            Ok(Box::new(crate::adapters::LibffiAdapter::new()))
        });
        #[cfg(not(feature = "libffi-backend"))]
        registry.register(RuntimeKind::Libffi, || {
            Err(InteropError::AdapterLoadFailure {
                kind: RuntimeKind::Libffi,
                reason: "libffi backend not compiled in".to_string(),
            })
        });
        registry.register(RuntimeKind::Direct, || Ok(Box::new(DirectAdapter::new())));
        registry.register(RuntimeKind::Plugin, || Ok(Box::new(PluginAdapter::new())));
        registry
    }

    pub fn register<F>(&mut self, kind: RuntimeKind, ctor: F)
    where
        F: Fn() -> Result<Box<dyn NativeAdapter>, InteropError> + Send + Sync + 'static,
    {
        self.ctors.insert(kind, Box::new(ctor));
    }

    /// Construct an adapter; any failure is reported as a load failure
    /// naming `kind`.
    fn construct(&self, kind: RuntimeKind) -> Result<Box<dyn NativeAdapter>, InteropError> {
        let ctor = self
            .ctors
            .get(&kind)
            .ok_or_else(|| InteropError::AdapterLoadFailure {
                kind,
                reason: "no constructor registered".to_string(),
            })?;
        match ctor() {
            Ok(adapter) => Ok(adapter),
            Err(err @ InteropError::AdapterLoadFailure { .. }) => Err(err),
            Err(other) => Err(InteropError::AdapterLoadFailure {
                kind,
                reason: other.to_string(),
            }),
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Resolves one adapter per call over the fixed cascade
pub struct AdapterFactory {
    detector: EnvironmentDetector,
    registry: AdapterRegistry,
}

impl AdapterFactory {
    pub fn new() -> Self {
        Self {
            detector: EnvironmentDetector::new(),
            registry: AdapterRegistry::defaults(),
        }
    }

    pub fn with_parts(detector: EnvironmentDetector, registry: AdapterRegistry) -> Self {
        Self { detector, registry }
    }

    /// Resolve a compatible adapter for the current process
    ///
    /// Cascade order is fixed and never reordered by runtime heuristics;
    /// the most capable untried candidate always goes first.
    pub fn resolve(&self, options: &FfiOptions) -> Result<Box<dyn NativeAdapter>, InteropError> {
        let detected = self.detector.detect();
        debug!(
            detected = %detected.kind,
            ffi_supported = detected.ffi_supported,
            "detected host environment"
        );

        let preferred = options.preferred_runtime.unwrap_or(detected.kind);
        let mut attempted = Vec::with_capacity(RuntimeKind::CASCADE.len());

        if preferred != RuntimeKind::Unknown {
            attempted.push(preferred);
            match self.registry.construct(preferred) {
                Ok(adapter) if adapter.is_available() => {
                    debug!(kind = %preferred, "resolved preferred adapter");
                    return Ok(adapter);
                }
                // Unavailable is a normal outcome, distinct from "failed to
                // load"; keep walking even with fallback disabled.
                Ok(_) => debug!(kind = %preferred, "preferred adapter unavailable"),
                Err(err) => {
                    if !options.fallback_enabled {
                        return Err(err);
                    }
                    warn!(kind = %preferred, error = %err, "preferred adapter failed to load");
                }
            }
        }

        if detected.kind != RuntimeKind::Unknown && !attempted.contains(&detected.kind) {
            attempted.push(detected.kind);
            if let Some(adapter) = self.attempt(detected.kind) {
                return Ok(adapter);
            }
        }

        for kind in RuntimeKind::CASCADE {
            if attempted.contains(&kind) {
                continue;
            }
            if let Some(adapter) = self.attempt(kind) {
                return Ok(adapter);
            }
        }

        Err(InteropError::NoCompatibleAdapter)
    }

    /// One swallowed cascade attempt
    fn attempt(&self, kind: RuntimeKind) -> Option<Box<dyn NativeAdapter>> {
        match self.registry.construct(kind) {
            Ok(adapter) if adapter.is_available() => {
                debug!(kind = %kind, "resolved adapter");
                Some(adapter)
            }
            Ok(_) => {
                debug!(kind = %kind, "adapter unavailable");
                None
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "adapter failed to load");
                None
            }
        }
    }
}

impl Default for AdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}
