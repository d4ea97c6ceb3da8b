//! Prepared-call backend over libffi
//!
//! The most capable backend: a call interface is prepared from the declared
//! signature at call time, so any shape a symbol table can express is
//! dispatchable, mixed float/integer argument lists included.

use crate::adapter::{BoundLibrary, LibraryHandle, NativeAdapter};
use crate::adapters::open_and_bind;
use crate::detect::RuntimeKind;
use crate::error::InteropError;
use crate::symbol::{SymbolSpec, SymbolTable};
use crate::value::{CType, CValue};
use ::libffi::middle::{Arg, Cif, CodePtr, Type};
use libloading::Library;
use std::collections::HashMap;
use std::ffi::c_void;
use std::os::raw::c_char;
use std::path::Path;

pub struct LibffiAdapter {
    available: bool,
}

impl LibffiAdapter {
    pub fn new() -> Self {
        Self {
            available: cfg!(any(unix, windows)),
        }
    }
}

impl Default for LibffiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeAdapter for LibffiAdapter {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Libffi
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
            Box::new(LibffiLibrary {
                _library: Some(library),
                symbols,
            }),
        ))
    }
}

struct LibffiLibrary {
    _library: Option<Library>,
    symbols: HashMap<String, usize>,
}

impl BoundLibrary for LibffiLibrary {
    fn invoke(&self, spec: &SymbolSpec, args: &[CValue]) -> Result<CValue, InteropError> {
        let addr = *self
            .symbols
            .get(&spec.name)
            .ok_or_else(|| InteropError::FunctionNotFound(spec.name.clone()))?;
        Ok(call_prepared(addr, spec, args))
    }
}

fn ffi_type(tag: CType) -> Type {
    match tag {
        CType::Pointer | CType::CString => Type::pointer(),
        CType::I8 => Type::i8(),
        CType::U8 => Type::u8(),
        CType::I16 => Type::i16(),
        CType::U16 => Type::u16(),
        CType::I32 => Type::i32(),
        CType::U32 => Type::u32(),
        CType::I64 => Type::i64(),
        CType::U64 => Type::u64(),
        CType::F32 => Type::f32(),
        CType::F64 => Type::f64(),
        CType::Void => Type::void(),
    }
}

fn ffi_arg(value: &CValue) -> Arg {
    match value {
        CValue::I8(v) => Arg::new(v),
        CValue::U8(v) => Arg::new(v),
        CValue::I16(v) => Arg::new(v),
        CValue::U16(v) => Arg::new(v),
        CValue::I32(v) => Arg::new(v),
        CValue::U32(v) => Arg::new(v),
        CValue::I64(v) => Arg::new(v),
        CValue::U64(v) => Arg::new(v),
        CValue::F32(v) => Arg::new(v),
        CValue::F64(v) => Arg::new(v),
        CValue::Ptr(v) => Arg::new(v),
        CValue::CString(v) => Arg::new(v),
        // Void parameters are rejected at table construction.
        CValue::Void => unreachable!("void is not a parameter type"),
    }
}

fn call_prepared(addr: usize, spec: &SymbolSpec, args: &[CValue]) -> CValue {
    let cif = Cif::new(
        spec.args.iter().copied().map(ffi_type),
        ffi_type(spec.returns),
    );
    let call_args: Vec<Arg> = args.iter().map(ffi_arg).collect();
    let code = CodePtr(addr as *mut c_void);
    unsafe {
        match spec.returns {
            CType::Void => {
                cif.call::<()>(code, &call_args);
                CValue::Void
            }
            CType::I8 => CValue::I8(cif.call::<i8>(code, &call_args)),
            CType::U8 => CValue::U8(cif.call::<u8>(code, &call_args)),
            CType::I16 => CValue::I16(cif.call::<i16>(code, &call_args)),
            CType::U16 => CValue::U16(cif.call::<u16>(code, &call_args)),
            CType::I32 => CValue::I32(cif.call::<i32>(code, &call_args)),
            CType::U32 => CValue::U32(cif.call::<u32>(code, &call_args)),
            CType::I64 => CValue::I64(cif.call::<i64>(code, &call_args)),
            CType::U64 => CValue::U64(cif.call::<u64>(code, &call_args)),
            CType::F32 => CValue::F32(cif.call::<f32>(code, &call_args)),
            CType::F64 => CValue::F64(cif.call::<f64>(code, &call_args)),
            CType::Pointer => CValue::Ptr(cif.call::<*mut c_void>(code, &call_args)),
            CType::CString => CValue::CString(cif.call::<*const c_char>(code, &call_args)),
        }
    }
}
