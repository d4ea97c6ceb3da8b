//! Error types for adapter resolution and native calls

use crate::detect::RuntimeKind;
use crate::value::CType;
use thiserror::Error;

/// Errors surfaced by the interop layer
///
/// All variants render as descriptive text, not numeric codes; callers match
/// on the variant, collaborators on the message.
#[derive(Error, Debug)]
pub enum InteropError {
    /// Capability call on an adapter whose `is_available()` is false
    #[error("adapter '{0}' is not available in this process")]
    AdapterUnavailable(RuntimeKind),

    /// Adapter construction failed (distinct from "constructed but unavailable")
    #[error("failed to load adapter '{kind}': {reason}")]
    AdapterLoadFailure { kind: RuntimeKind, reason: String },

    /// Native library path could not be resolved or a declared symbol is absent
    #[error("failed to load native library '{path}': {reason}")]
    LibraryLoadFailure { path: String, reason: String },

    /// Name absent from the symbols bound in a loaded handle
    #[error("function '{0}' is not bound in this library")]
    FunctionNotFound(String),

    /// Manager capability call before `initialize()`
    #[error("{0} requires an initialized interop manager; call initialize() first")]
    NotInitialized(&'static str),

    /// The full adapter cascade was exhausted
    #[error("no compatible adapter found; tried libffi, direct, plugin")]
    NoCompatibleAdapter,

    /// Manager-level wrapper around a failed resolution
    #[error("interop initialization failed: {0}")]
    InitializationFailed(#[source] Box<InteropError>),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("argument {index} expects {expected}, got {got}")]
    TypeMismatch {
        index: usize,
        expected: CType,
        got: CType,
    },

    /// The active backend cannot form a call for this signature shape
    #[error("unsupported call signature: {0}")]
    UnsupportedSignature(String),

    /// Symbol tables require unique names
    #[error("duplicate symbol '{0}' in table")]
    DuplicateSymbol(String),
}
