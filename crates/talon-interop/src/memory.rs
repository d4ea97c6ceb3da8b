//! Ownership tokens for memory crossing the native boundary
//!
//! Every allocation handed to native code is represented by a token type
//! with exactly one release path: `MemoryBuffer::free` (also run on drop),
//! `OwnedCString`'s drop, or nothing at all for `BorrowedPtr`, which never
//! owns. Bare addresses are only ever produced from a live token.

use crate::error::InteropError;
use crate::value::CValue;
use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::os::raw::c_char;

/// A caller-owned block of native-visible memory
///
/// The buffer owns its allocation; it is released by `free()` or when the
/// buffer drops, whichever comes first. `free()` is idempotent. After
/// release the pointer is null and the view is empty, while `size()` keeps
/// reporting the allocated size.
#[derive(Debug)]
pub struct MemoryBuffer {
    size: usize,
    data: Option<Box<[u8]>>,
}

impl MemoryBuffer {
    pub(crate) fn allocate(size: usize) -> Result<Self, InteropError> {
        if size == 0 {
            return Err(InteropError::InvalidArgument(
                "allocation size must be strictly positive".to_string(),
            ));
        }
        Ok(Self {
            size,
            data: Some(vec![0u8; size].into_boxed_slice()),
        })
    }

    /// Allocated size in bytes; unchanged by `free()`
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.data
            .as_ref()
            .map(|d| d.as_ptr())
            .unwrap_or(std::ptr::null())
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data
            .as_mut()
            .map(|d| d.as_mut_ptr())
            .unwrap_or(std::ptr::null_mut())
    }

    /// Byte-addressable view over the allocation; empty once freed
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn is_freed(&self) -> bool {
        self.data.is_none()
    }

    /// Release the allocation. Safe to call repeatedly.
    pub fn free(&mut self) {
        self.data = None;
    }

    /// The buffer's address as a call argument
    pub fn as_value(&mut self) -> CValue {
        CValue::Ptr(self.as_mut_ptr() as *mut c_void)
    }
}

/// A NUL-terminated copy of a Rust string in native-visible memory
///
/// The caller owns the allocation; the single designated release is drop.
/// The adapter that produced it keeps no record of it, so nothing else can
/// free it.
#[derive(Debug)]
pub struct OwnedCString {
    inner: CString,
}

impl OwnedCString {
    pub(crate) fn new(s: &str) -> Result<Self, InteropError> {
        let inner = CString::new(s).map_err(|_| {
            InteropError::InvalidArgument("string contains an interior NUL byte".to_string())
        })?;
        Ok(Self { inner })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.inner.as_ptr()
    }

    /// Bytes including the trailing NUL
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.inner.as_bytes_with_nul()
    }

    pub fn as_value(&self) -> CValue {
        CValue::CString(self.as_ptr())
    }
}

/// A non-owning pointer into caller-owned memory
///
/// Borrows the region for its lifetime; the adapter never copies and never
/// takes ownership, and the borrow checker rules out use-after-free.
#[derive(Debug)]
pub struct BorrowedPtr<'a> {
    ptr: *mut u8,
    len: usize,
    _region: PhantomData<&'a mut [u8]>,
}

impl<'a> BorrowedPtr<'a> {
    pub(crate) fn new(region: &'a mut [u8]) -> Self {
        Self {
            ptr: region.as_mut_ptr(),
            len: region.len(),
            _region: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr as *mut c_void
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_value(&self) -> CValue {
        CValue::Ptr(self.as_ptr())
    }
}
