//! Dynamic value container
//!
//! Design: `Variant` is an opaque, runtime-owned buffer with the exact
//! size and alignment of the runtime's variant layout:
//! - Constructed only through the runtime (nil, copy, native constructors)
//! - Released exactly once, in `Drop`
//! - Result buffers start as nil so the runtime can always overwrite them
//!
//! `Option<Variant>` is the "no value" channel; a nil `Variant` is a
//! present value holding the null payload.

use crate::core::convert::{ToVariant, VariantStorable};
use crate::sys::{self, ConstVariantPtr, VariantPtr};
use core::mem::MaybeUninit;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Size of the runtime's variant buffer in bytes
pub const VARIANT_SIZE: usize = 24;

/// Number of payload kinds
pub const VARIANT_TYPE_COUNT: usize = 9;

/// Payload kind codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VariantType {
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Vector3 = 5,
    StringName = 6,
    Object = 7,
    Callable = 8,
}

impl VariantType {
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Nil,
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Vector3,
            6 => Self::StringName,
            7 => Self::Object,
            8 => Self::Callable,
            _ => return None,
        })
    }
}

/// Owned runtime variant
#[repr(C, align(8))]
pub struct Variant {
    opaque: [u8; VARIANT_SIZE],
}

const _: () = assert!(core::mem::size_of::<Variant>() == VARIANT_SIZE);
const _: () = assert!(core::mem::align_of::<Variant>() == 8);

impl Variant {
    /// Nil variant
    pub fn nil() -> Self {
        unsafe { Self::from_uninit(|dst| (sys::interface().variant_new_nil)(dst)) }
    }

    /// Build a variant by letting the runtime initialize a fresh buffer
    ///
    /// # Safety
    /// `init` must fully initialize the buffer through the runtime.
    #[inline]
    pub unsafe fn from_uninit(init: impl FnOnce(VariantPtr)) -> Self {
        let mut raw = MaybeUninit::<Variant>::uninit();
        init(raw.as_mut_ptr() as VariantPtr);
        raw.assume_init()
    }

    /// Build a variant from a nil-initialized result buffer the runtime
    /// overwrites
    ///
    /// # Safety
    /// `write` may only store a valid variant into the buffer.
    #[inline]
    pub unsafe fn new_with(write: impl FnOnce(VariantPtr)) -> Self {
        let mut result = Variant::nil();
        write(result.as_mut_ptr());
        result
    }

    /// Borrow a variant the runtime owns
    ///
    /// # Safety
    /// `ptr` must point to a valid variant that outlives `'a`.
    #[inline]
    pub unsafe fn borrow_raw<'a>(ptr: ConstVariantPtr) -> &'a Variant {
        debug_assert!(!ptr.is_null());
        &*(ptr as *const Variant)
    }

    /// Move this variant into a runtime buffer, releasing what it held
    ///
    /// # Safety
    /// `dst` must point to a valid (initialized) variant.
    #[inline]
    pub unsafe fn move_into(self, dst: VariantPtr) {
        (sys::interface().variant_destroy)(dst);
        core::ptr::write(dst as *mut Variant, self);
    }

    #[inline]
    pub fn as_ptr(&self) -> ConstVariantPtr {
        self as *const Variant as ConstVariantPtr
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> VariantPtr {
        self as *mut Variant as VariantPtr
    }

    pub fn get_type(&self) -> VariantType {
        let raw = unsafe { (sys::interface().variant_get_type)(self.as_ptr()) };
        VariantType::from_raw(raw).unwrap_or(VariantType::Nil)
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.get_type() == VariantType::Nil
    }

    #[inline]
    pub fn from_native<T: VariantStorable>(value: T) -> Self {
        value.to_variant()
    }

    /// Extract as `T`; `None` on kind mismatch or out-of-range value
    #[inline]
    pub fn to_native<T: VariantStorable>(&self) -> Option<T> {
        T::from_variant(self)
    }

    /// Runtime string form
    pub fn stringify(&self) -> String {
        let text = unsafe {
            Variant::new_with(|dst| (sys::interface().variant_stringify)(self.as_ptr(), dst))
        };
        text.read_string().unwrap_or_default()
    }

    /// Copy out a String payload
    pub(crate) fn read_string(&self) -> Option<String> {
        let get = sys::interface().variant_get_string;
        let mut buf = [0u8; 64];
        let len = unsafe { get(self.as_ptr(), buf.as_mut_ptr(), buf.len() as i64) };
        let len = usize::try_from(len).ok()?;
        if len <= buf.len() {
            return Some(String::from_utf8_lossy(&buf[..len]).into_owned());
        }

        // Longer than the stack buffer: retry with the exact size
        let mut heap = vec![0u8; len];
        unsafe { get(self.as_ptr(), heap.as_mut_ptr(), len as i64) };
        Some(String::from_utf8(heap).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
    }
}

// The runtime is thread-safe; a variant is an owned value with no
// thread affinity.
unsafe impl Send for Variant {}
unsafe impl Sync for Variant {}

impl Drop for Variant {
    fn drop(&mut self) {
        unsafe { (sys::interface().variant_destroy)(self.as_mut_ptr()) }
    }
}

impl Clone for Variant {
    fn clone(&self) -> Self {
        unsafe { Self::from_uninit(|dst| (sys::interface().variant_new_copy)(dst, self.as_ptr())) }
    }
}

/// Runtime equality: kinds must match, Nil equals only Nil
impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        unsafe { (sys::interface().variant_equal)(self.as_ptr(), other.as_ptr()) != 0 }
    }
}

impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let hash = unsafe { (sys::interface().variant_hash)(self.as_ptr()) };
        state.write_i64(hash);
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::nil()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.get_type(), self.stringify())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init;

    #[test]
    fn test_layout() {
        assert_eq!(core::mem::size_of::<Variant>(), hostlink_runtime::VARIANT_SIZE);
        assert_eq!(core::mem::align_of::<Variant>(), core::mem::align_of::<hostlink_runtime::RawVariant>());
    }

    #[test]
    fn test_nil() {
        init();
        let nil = Variant::nil();
        assert!(nil.is_nil());
        assert_eq!(nil, Variant::default());
        assert_eq!(nil.stringify(), "<null>");
    }

    #[test]
    fn test_clone_and_equality() {
        init();
        let a = Variant::from_native(String::from("Foo"));
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.get_type(), VariantType::String);
        assert_ne!(a, Variant::nil());
        assert_ne!(Variant::from_native(1i64), Variant::from_native(1.0f64));
    }

    #[test]
    fn test_long_string_read() {
        init();
        let long = "x".repeat(500);
        let v = Variant::from_native(long.clone());
        assert_eq!(v.to_native::<String>(), Some(long));
    }

    #[test]
    fn test_hash_matches_equality() {
        use std::collections::HashSet;
        init();
        let mut set = HashSet::new();
        set.insert(HashedVariant(Variant::from_native(3i64)));
        assert!(set.contains(&HashedVariant(Variant::from_native(3i64))));
        assert!(!set.contains(&HashedVariant(Variant::from_native(4i64))));
    }

    /// Test-only `Eq` wrapper (Float payloads keep `Variant` itself out of `Eq`)
    #[derive(PartialEq, Hash)]
    struct HashedVariant(Variant);
    impl Eq for HashedVariant {}
}
