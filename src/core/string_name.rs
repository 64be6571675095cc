//! Method identifier - runtime-interned name handle
//!
//! The runtime interns every name, so two handles for the same text hold
//! identical bytes: equality and hashing never cross the ABI.

use crate::sys::{self, ConstStringNamePtr, StringNamePtr};
use core::mem::MaybeUninit;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const STRING_NAME_SIZE: usize = 8;

#[repr(C, align(8))]
pub struct StringName {
    opaque: [u8; STRING_NAME_SIZE],
}

const _: () = assert!(core::mem::size_of::<StringName>() == STRING_NAME_SIZE);

impl StringName {
    pub fn new(text: &str) -> Self {
        unsafe {
            Self::from_uninit(|dst| {
                (sys::interface().string_name_new)(dst, text.as_ptr(), text.len() as i64)
            })
        }
    }

    /// # Safety
    /// `init` must fully initialize the buffer through the runtime.
    #[inline]
    pub(crate) unsafe fn from_uninit(init: impl FnOnce(StringNamePtr)) -> Self {
        let mut raw = MaybeUninit::<StringName>::uninit();
        init(raw.as_mut_ptr() as StringNamePtr);
        raw.assume_init()
    }

    #[inline]
    pub fn as_ptr(&self) -> ConstStringNamePtr {
        self as *const StringName as ConstStringNamePtr
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> StringNamePtr {
        self as *mut StringName as StringNamePtr
    }

    /// Identity of the interned name, usable as a map key
    #[inline]
    pub(crate) fn key(&self) -> u64 {
        u64::from_ne_bytes(self.opaque)
    }

    /// Text of the name
    pub fn to_string_lossy(&self) -> String {
        let to_utf8 = sys::interface().string_name_to_utf8;
        let mut buf = [0u8; 64];
        let len = unsafe { to_utf8(self.as_ptr(), buf.as_mut_ptr(), buf.len() as i64) };
        let Ok(len) = usize::try_from(len) else {
            return String::new();
        };
        if len <= buf.len() {
            return String::from_utf8_lossy(&buf[..len]).into_owned();
        }

        let mut heap = vec![0u8; len];
        unsafe { to_utf8(self.as_ptr(), heap.as_mut_ptr(), len as i64) };
        String::from_utf8_lossy(&heap).into_owned()
    }
}

impl Clone for StringName {
    fn clone(&self) -> Self {
        unsafe { Self::from_uninit(|dst| (sys::interface().string_name_new_copy)(dst, self.as_ptr())) }
    }
}

impl Drop for StringName {
    fn drop(&mut self) {
        unsafe { (sys::interface().string_name_destroy)(self.as_mut_ptr()) }
    }
}

impl PartialEq for StringName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.opaque == other.opaque
    }
}

impl Eq for StringName {}

impl Hash for StringName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.opaque.hash(state);
    }
}

impl Default for StringName {
    fn default() -> Self {
        StringName::new("")
    }
}

impl From<&str> for StringName {
    fn from(text: &str) -> Self {
        StringName::new(text)
    }
}

impl From<&String> for StringName {
    fn from(text: &String) -> Self {
        StringName::new(text)
    }
}

impl From<&StringName> for StringName {
    fn from(name: &StringName) -> Self {
        name.clone()
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", self.to_string_lossy())
    }
}

// Interned by a thread-safe runtime and never mutated in place.
unsafe impl Send for StringName {}
unsafe impl Sync for StringName {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init;

    #[test]
    fn test_identity() {
        init();
        let a = StringName::new("add_child");
        let b = StringName::from(&String::from("add_child"));
        assert_eq!(a, b);
        assert_ne!(a, StringName::from("remove_child"));
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_text_roundtrip() {
        init();
        assert_eq!(StringName::new("get_child_count").to_string(), "get_child_count");
        assert_eq!(StringName::default().to_string(), "");

        let long = "n".repeat(200);
        assert_eq!(StringName::new(&long).to_string_lossy(), long);
    }
}
