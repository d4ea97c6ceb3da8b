//! Typed function-pointer-cast backend
//!
//! Dispatches through direct `extern "C"` pointer casts instead of prepared
//! call interfaces. Integer and pointer arguments travel as 64-bit machine
//! words (up to eight of them); float-only shapes are enumerated for the
//! common unary and binary cases. Anything else is `UnsupportedSignature` —
//! the libffi backend handles those. Requires a 64-bit target; the probe
//! reports the open primitive absent elsewhere.

use crate::adapter::{BoundLibrary, LibraryHandle, NativeAdapter};
use crate::adapters::open_and_bind;
use crate::detect::RuntimeKind;
use crate::error::InteropError;
use crate::symbol::{SymbolSpec, SymbolTable};
use crate::value::{CType, CValue};
use libloading::Library;
use std::collections::HashMap;
use std::path::Path;

pub struct DirectAdapter {
    available: bool,
}

impl DirectAdapter {
    pub fn new() -> Self {
        Self {
            available: cfg!(all(any(unix, windows), target_pointer_width = "64")),
        }
    }
}

impl Default for DirectAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeAdapter for DirectAdapter {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Direct
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn load_library(
        &self,
        path: &Path,
        table: &SymbolTable,
    ) -> Result<LibraryHandle, InteropError> {
        self.ensure_available()?;
        let (library, symbols) = open_and_bind(path, table)?;
        Ok(LibraryHandle::bind(
            path,
            table,
            Box::new(DirectLibrary {
                _library: Some(library),
                symbols,
            }),
        ))
    }
}

/// Symbols bound as raw addresses; the `Library` field keeps them alive
struct DirectLibrary {
    _library: Option<Library>,
    symbols: HashMap<String, usize>,
}

impl BoundLibrary for DirectLibrary {
    fn invoke(&self, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
        let addr = *self
            .symbols
            .get(&spec.name)
            .ok_or_else(|| InteropError::FunctionNotFound(spec.name.clone()))?;
        dispatch(addr, spec, args)
    }
}

fn word_class(tag: &CType) -> bool {
    tag.is_integer() || tag.is_pointer()
}

fn dispatch(addr: usize, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
    if spec.args.iter().all(word_class)
        && (word_class(&spec.returns) || spec.returns == CType::Void)
    {
        return call_words(addr, spec, args);
    }
    call_floats(addr, spec, args)
}

/// Word-class dispatch: every argument and the result fit an integer
/// register, so one cast per arity covers the whole family.
fn call_words(addr: usize, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
    let w: Vec<u64> = args.iter().map(CValue::to_word).collect();
    let raw = unsafe {
        match w.len() {
            0 => {
                let f: extern "C" fn() -> u64 = std::mem::transmute(addr);
                f()
            }
            1 => {
                let f: extern "C" fn(u64) -> u64 = std::mem::transmute(addr);
                f(w[0])
            }
            2 => {
                let f: extern "C" fn(u64, u64) -> u64 = std::mem::transmute(addr);
                f(w[0], w[1])
            }
            3 => {
                let f: extern "C" fn(u64, u64, u64) -> u64 = std::mem::transmute(addr);
                f(w[0], w[1], w[2])
            }
            4 => {
                let f: extern "C" fn(u64, u64, u64, u64) -> u64 = std::mem::transmute(addr);
                f(w[0], w[1], w[2], w[3])
            }
            5 => {
                let f: extern "C" fn(u64, u64, u64, u64, u64) -> u64 = std::mem::transmute(addr);
                f(w[0], w[1], w[2], w[3], w[4])
            }
            6 => {
                let f: extern "C" fn(u64, u64, u64, u64, u64, u64) -> u64 =
                    std::mem::transmute(addr);
                f(w[0], w[1], w[2], w[3], w[4], w[5])
            }
            7 => {
                let f: extern "C" fn(u64, u64, u64, u64, u64, u64, u64) -> u64 =
                    std::mem::transmute(addr);
                f(w[0], w[1], w[2], w[3], w[4], w[5], w[6])
            }
            8 => {
                let f: extern "C" fn(u64, u64, u64, u64, u64, u64, u64, u64) -> u64 =
                    std::mem::transmute(addr);
                f(w[0], w[1], w[2], w[3], w[4], w[5], w[6], w[7])
            }
            _ => return Err(InteropError::UnsupportedSignature(spec.to_string())),
        }
    };
    Ok(CValue::from_word(raw, spec.returns))
}

/// Float shapes get exact casts; mixed float/int argument lists are refused
/// rather than guessed at.
fn call_floats(addr: usize, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
    match (spec.args.as_slice(), spec.returns) {
        ([], CType::F64) => {
            let f: extern "C" fn() -> f64 = unsafe { std::mem::transmute(addr) };
            Ok(CValue::F64(f()))
        }
        ([], CType::F32) => {
            let f: extern "C" fn() -> f32 = unsafe { std::mem::transmute(addr) };
            Ok(CValue::F32(f()))
        }
        ([CType::F64], CType::F64) => {
            if let CValue::F64(a) = args[0] {
                let f: extern "C" fn(f64) -> f64 = unsafe { std::mem::transmute(addr) };
                Ok(CValue::F64(f(a)))
            } else {
                unreachable!()
            }
        }
        ([CType::F64, CType::F64], CType::F64) => {
            if let (CValue::F64(a), CValue::F64(b)) = (args[0], args[1]) {
                let f: extern "C" fn(f64, f64) -> f64 = unsafe { std::mem::transmute(addr) };
                Ok(CValue::F64(f(a, b)))
            } else {
                unreachable!()
            }
        }
        ([CType::F32], CType::F32) => {
            if let CValue::F32(a) = args[0] {
                let f: extern "C" fn(f32) -> f32 = unsafe { std::mem::transmute(addr) };
                Ok(CValue::F32(f(a)))
            } else {
                unreachable!()
            }
        }
        ([CType::F32, CType::F32], CType::F32) => {
            if let (CValue::F32(a), CValue::F32(b)) = (args[0], args[1]) {
                let f: extern "C" fn(f32, f32) -> f32 = unsafe { std::mem::transmute(addr) };
                Ok(CValue::F32(f(a, b)))
            } else {
                unreachable!()
            }
        }
        _ => Err(InteropError::UnsupportedSignature(spec.to_string())),
    }
}
