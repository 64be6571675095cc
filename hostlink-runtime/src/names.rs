//! Interned names - pointer-identity string table
//!
//! Design: every distinct name is stored exactly once and never freed, so a
//! name handle is a plain `&'static NameEntry`:
//! - O(1) comparison and hashing (pointer identity)
//! - Handles can be copied across the ABI without reference counting
//! - `string_name_destroy` is a no-op

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Global name table
static NAMES: Lazy<DashMap<Box<str>, &'static NameEntry>> =
    Lazy::new(|| DashMap::with_capacity(1024));

/// Backing storage for one interned name
pub struct NameEntry {
    text: Box<str>,
}

/// ABI representation of a name (exactly one pointer wide)
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawStringName {
    pub entry: *const NameEntry,
}

const _: () = assert!(core::mem::size_of::<RawStringName>() == 8);

/// Interned name handle
#[derive(Clone, Copy)]
pub struct Name(&'static NameEntry);

impl Name {
    /// Intern `text`, returning the canonical handle
    pub fn intern(text: &str) -> Self {
        // Fast path: already interned
        if let Some(entry) = NAMES.get(text) {
            return Name(*entry);
        }

        let entry = *NAMES
            .entry(text.into())
            .or_insert_with(|| Box::leak(Box::new(NameEntry { text: text.into() })));
        Name(entry)
    }

    #[inline]
    pub(crate) fn from_entry(entry: &'static NameEntry) -> Self {
        Name(entry)
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        &self.0.text
    }

    #[inline]
    pub fn to_raw(self) -> RawStringName {
        RawStringName { entry: self.0 }
    }

    /// Rebuild a handle from its ABI form
    ///
    /// # Safety
    /// `raw` must point to a `RawStringName` produced by this runtime.
    #[inline]
    pub unsafe fn from_raw(raw: *const RawStringName) -> Option<Self> {
        let raw = raw.as_ref()?;
        raw.entry.as_ref().map(Name)
    }

    /// Number of distinct names interned so far
    pub fn interned_count() -> usize {
        NAMES.len()
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.0, other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const NameEntry as usize).hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{:?}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_identity() {
        let a = Name::intern("add_child");
        let b = Name::intern(&String::from("add_child"));
        assert_eq!(a, b);
        assert!(core::ptr::eq(a.to_raw().entry, b.to_raw().entry));
        assert_ne!(a, Name::intern("remove_child"));
    }

    #[test]
    fn test_raw_roundtrip() {
        let name = Name::intern("get_child_count");
        let raw = name.to_raw();
        let back = unsafe { Name::from_raw(&raw) }.unwrap();
        assert_eq!(back.as_str(), "get_child_count");
    }

    #[test]
    fn test_null_raw() {
        let raw = RawStringName { entry: core::ptr::null() };
        assert!(unsafe { Name::from_raw(&raw) }.is_none());
        assert!(unsafe { Name::from_raw(core::ptr::null()) }.is_none());
    }
}
