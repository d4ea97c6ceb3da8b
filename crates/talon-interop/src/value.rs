//! C-compatible types crossing the native boundary
//!
//! `CType` is the closed set of type tags a symbol table may use; `CValue`
//! is the matching runtime representation passed to and returned from native
//! calls. No other types ever cross the boundary.

use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::os::raw::c_char;

/// Type tags for native function parameters and return values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CType {
    /// Opaque pointer (void*)
    Pointer,
    /// Null-terminated string pointer (const char*)
    CString,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// No value; valid only as a return type
    Void,
}

impl CType {
    /// Size in bytes of this type on the current target
    pub fn size(&self) -> usize {
        match self {
            CType::Void => 0,
            CType::I8 | CType::U8 => 1,
            CType::I16 | CType::U16 => 2,
            CType::I32 | CType::U32 | CType::F32 => 4,
            CType::I64 | CType::U64 | CType::F64 => 8,
            CType::Pointer | CType::CString => std::mem::size_of::<usize>(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            CType::I8
                | CType::U8
                | CType::I16
                | CType::U16
                | CType::I32
                | CType::U32
                | CType::I64
                | CType::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, CType::F32 | CType::F64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, CType::Pointer | CType::CString)
    }

    /// Parse from a C-flavored or Rust-flavored spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ptr" | "pointer" | "void*" => Some(CType::Pointer),
            "cstring" | "cstr" | "char*" | "const char*" => Some(CType::CString),
            "i8" | "int8_t" => Some(CType::I8),
            "u8" | "uint8_t" | "byte" => Some(CType::U8),
            "i16" | "int16_t" => Some(CType::I16),
            "u16" | "uint16_t" => Some(CType::U16),
            "i32" | "int32_t" | "int" => Some(CType::I32),
            "u32" | "uint32_t" => Some(CType::U32),
            "i64" | "int64_t" | "long" => Some(CType::I64),
            "u64" | "uint64_t" | "size_t" => Some(CType::U64),
            "f32" | "float" => Some(CType::F32),
            "f64" | "double" => Some(CType::F64),
            "void" => Some(CType::Void),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CType::Pointer => "pointer",
            CType::CString => "cstring",
            CType::I8 => "i8",
            CType::U8 => "u8",
            CType::I16 => "i16",
            CType::U16 => "u16",
            CType::I32 => "i32",
            CType::U32 => "u32",
            CType::I64 => "i64",
            CType::U64 => "u64",
            CType::F32 => "f32",
            CType::F64 => "f64",
            CType::Void => "void",
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value passed to or returned from a native function
///
/// Pointer variants carry raw addresses; their validity is the concern of
/// whoever produced them (`MemoryBuffer`, `OwnedCString`, `BorrowedPtr`, or
/// the native library itself).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CValue {
    Void,
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Ptr(*mut c_void),
    CString(*const c_char),
}

impl CValue {
    /// The type tag this value matches in a symbol table
    pub fn tag(&self) -> CType {
        match self {
            CValue::Void => CType::Void,
            CValue::I8(_) => CType::I8,
            CValue::U8(_) => CType::U8,
            CValue::I16(_) => CType::I16,
            CValue::U16(_) => CType::U16,
            CValue::I32(_) => CType::I32,
            CValue::U32(_) => CType::U32,
            CValue::I64(_) => CType::I64,
            CValue::U64(_) => CType::U64,
            CValue::F32(_) => CType::F32,
            CValue::F64(_) => CType::F64,
            CValue::Ptr(_) => CType::Pointer,
            CValue::CString(_) => CType::CString,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CValue::Void)
    }

    /// Integer-register image of this value, for backends that pass
    /// integer-class arguments as machine words. Float variants have no
    /// register image here; callers filter them out first.
    pub(crate) fn to_word(&self) -> u64 {
        match self {
            CValue::Void => 0,
            CValue::I8(v) => *v as i64 as u64,
            CValue::U8(v) => *v as u64,
            CValue::I16(v) => *v as i64 as u64,
            CValue::U16(v) => *v as u64,
            CValue::I32(v) => *v as i64 as u64,
            CValue::U32(v) => *v as u64,
            CValue::I64(v) => *v as u64,
            CValue::U64(v) => *v,
            CValue::F32(v) => f32::to_bits(*v) as u64,
            CValue::F64(v) => f64::to_bits(*v),
            CValue::Ptr(p) => *p as u64,
            CValue::CString(p) => *p as u64,
        }
    }

    /// Rebuild a value from an integer-register image and its declared tag
    pub(crate) fn from_word(word: u64, tag: CType) -> CValue {
        match tag {
            CType::Void => CValue::Void,
            CType::I8 => CValue::I8(word as i8),
            CType::U8 => CValue::U8(word as u8),
            CType::I16 => CValue::I16(word as i16),
            CType::U16 => CValue::U16(word as u16),
            CType::I32 => CValue::I32(word as i32),
            CType::U32 => CValue::U32(word as u32),
            CType::I64 => CValue::I64(word as i64),
            CType::U64 => CValue::U64(word),
            CType::F32 => CValue::F32(f32::from_bits(word as u32)),
            CType::F64 => CValue::F64(f64::from_bits(word)),
            CType::Pointer => CValue::Ptr(word as usize as *mut c_void),
            CType::CString => CValue::CString(word as usize as *const c_char),
        }
    }
}
