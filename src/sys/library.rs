//! Runtimes shipped as shared objects
//!
//! A `Library` stays mapped until dropped. `install_from_library` parks it
//! in a process-wide cell, so entry points resolved from it never dangle.

use crate::error::{LoadError, SymbolError};
use crate::logging::debug;
use core::ffi::{c_char, c_void};
use core::ptr::NonNull;
use std::ffi::CString;

pub struct Library {
    handle: NonNull<c_void>,
    path: String,
}

// A loaded module is process-global; its handle carries no thread affinity.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
    /// Map the shared object at `path` (or a name the loader can search for)
    pub fn load(path: &str) -> Result<Self, LoadError> {
        let handle = os::open(path)?;
        debug!(target: "interface", path, "runtime library loaded");
        Ok(Self { handle, path: path.to_owned() })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Address of the exported symbol `name`
    pub fn symbol(&self, name: &str) -> Result<*const (), SymbolError> {
        let name = CString::new(name).map_err(|_| SymbolError::InvalidName)?;
        let address = unsafe { os::lookup(self.handle, name.as_ptr()) };
        match address {
            Some(address) => Ok(address.as_ptr() as *const ()),
            None => Err(SymbolError::NotFound),
        }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        unsafe { os::close(self.handle) }
    }
}

#[cfg(unix)]
mod os {
    use super::*;
    use std::ffi::CStr;

    const RTLD_NOW: i32 = 2;

    extern "C" {
        fn dlopen(filename: *const c_char, flag: i32) -> *mut c_void;
        fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
        fn dlclose(handle: *mut c_void) -> i32;
        fn dlerror() -> *const c_char;
    }

    pub(super) fn open(path: &str) -> Result<NonNull<c_void>, LoadError> {
        let path = CString::new(path).map_err(|_| LoadError::InvalidName)?;
        let handle = unsafe { dlopen(path.as_ptr(), RTLD_NOW) };
        NonNull::new(handle).ok_or_else(|| {
            let reason = unsafe { dlerror() };
            LoadError::LoadFailed(if reason.is_null() {
                "dlopen failed".to_owned()
            } else {
                unsafe { CStr::from_ptr(reason) }.to_string_lossy().into_owned()
            })
        })
    }

    pub(super) unsafe fn lookup(handle: NonNull<c_void>, name: *const c_char) -> Option<NonNull<c_void>> {
        NonNull::new(dlsym(handle.as_ptr(), name))
    }

    pub(super) unsafe fn close(handle: NonNull<c_void>) {
        dlclose(handle.as_ptr());
    }
}

#[cfg(windows)]
mod os {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    extern "system" {
        fn LoadLibraryW(filename: *const u16) -> *mut c_void;
        fn GetProcAddress(module: *mut c_void, name: *const c_char) -> *mut c_void;
        fn FreeLibrary(module: *mut c_void) -> i32;
        fn GetLastError() -> u32;
    }

    pub(super) fn open(path: &str) -> Result<NonNull<c_void>, LoadError> {
        if path.contains('\0') {
            return Err(LoadError::InvalidName);
        }
        let wide: Vec<u16> = OsStr::new(path).encode_wide().chain(Some(0)).collect();
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        NonNull::new(handle)
            .ok_or_else(|| LoadError::LoadFailed(format!("LoadLibraryW error {}", unsafe { GetLastError() })))
    }

    pub(super) unsafe fn lookup(handle: NonNull<c_void>, name: *const c_char) -> Option<NonNull<c_void>> {
        NonNull::new(GetProcAddress(handle.as_ptr(), name))
    }

    pub(super) unsafe fn close(handle: NonNull<c_void>) {
        FreeLibrary(handle.as_ptr());
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library() {
        let err = Library::load("libhostlink_does_not_exist.so").err().unwrap();
        assert!(matches!(err, LoadError::LoadFailed(_)));
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(Library::load("bad\0name").err(), Some(LoadError::InvalidName));
    }
}
