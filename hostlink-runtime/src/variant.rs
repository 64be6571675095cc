//! Variant layout - the single tagged container crossing the ABI
//!
//! Design: fixed 24-byte `#[repr(C)]` buffer with explicit padding:
//! - `tag` selects the payload kind
//! - Scalars are stored inline in `payload`
//! - Heap kinds store one `Arc` strong reference as a raw pointer
//!
//! `Value` is the owned, safe mirror used everywhere inside the runtime.
//! Moving between the two is explicit (`encode`, `decode_clone`,
//! `decode_take`) so every strong reference is released exactly once.

use crate::callable::CallableData;
use crate::names::{Name, NameEntry, RawStringName};
use crate::objects::ObjectData;
use core::ffi::c_void;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Payload kind codes shared with the bridge
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

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "Nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "String",
            Self::Vector3 => "Vector3",
            Self::StringName => "StringName",
            Self::Object => "Object",
            Self::Callable => "Callable",
        }
    }
}

/// Binary layout of a variant as seen by the bridge
#[repr(C)]
pub struct RawVariant {
    tag: u32,
    _pad: u32,
    payload: [u64; 2],
}

pub const VARIANT_SIZE: usize = 24;

const _: () = assert!(core::mem::size_of::<RawVariant>() == VARIANT_SIZE);
const _: () = assert!(core::mem::align_of::<RawVariant>() == 8);

impl RawVariant {
    const NIL: RawVariant = RawVariant { tag: 0, _pad: 0, payload: [0; 2] };

    #[inline]
    pub fn tag(&self) -> u32 {
        self.tag
    }
}

/// Owned variant value
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<String>),
    Vector3([f32; 3]),
    StringName(Name),
    Object(Arc<ObjectData>),
    Callable(Arc<CallableData>),
}

impl Value {
    #[inline]
    pub fn string(text: &str) -> Self {
        Value::String(Arc::new(text.to_owned()))
    }

    #[inline]
    pub fn get_type(&self) -> VariantType {
        match self {
            Value::Nil => VariantType::Nil,
            Value::Bool(_) => VariantType::Bool,
            Value::Int(_) => VariantType::Int,
            Value::Float(_) => VariantType::Float,
            Value::String(_) => VariantType::String,
            Value::Vector3(_) => VariantType::Vector3,
            Value::StringName(_) => VariantType::StringName,
            Value::Object(_) => VariantType::Object,
            Value::Callable(_) => VariantType::Callable,
        }
    }

    /// Numeric view used by comparisons (int widened to float)
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Move into the ABI layout, transferring any strong reference
    pub fn encode(self) -> RawVariant {
        let (tag, payload) = match self {
            Value::Nil => (VariantType::Nil, [0, 0]),
            Value::Bool(b) => (VariantType::Bool, [b as u64, 0]),
            Value::Int(i) => (VariantType::Int, [i as u64, 0]),
            Value::Float(f) => (VariantType::Float, [f.to_bits(), 0]),
            Value::String(s) => (VariantType::String, [Arc::into_raw(s) as usize as u64, 0]),
            Value::Vector3([x, y, z]) => (
                VariantType::Vector3,
                [
                    x.to_bits() as u64 | (y.to_bits() as u64) << 32,
                    z.to_bits() as u64,
                ],
            ),
            Value::StringName(name) => {
                (VariantType::StringName, [name.to_raw().entry as usize as u64, 0])
            }
            Value::Object(obj) => (VariantType::Object, [Arc::into_raw(obj) as usize as u64, 0]),
            Value::Callable(c) => (VariantType::Callable, [Arc::into_raw(c) as usize as u64, 0]),
        };

        RawVariant { tag: tag as u32, _pad: 0, payload }
    }

    /// Decode a copy, taking an additional strong reference for heap kinds
    ///
    /// # Safety
    /// `raw` must hold a value produced by `encode`.
    pub unsafe fn decode_clone(raw: &RawVariant) -> Value {
        let p = raw.payload[0] as usize;
        match VariantType::from_raw(raw.tag) {
            Some(VariantType::String) => Arc::increment_strong_count(p as *const String),
            Some(VariantType::Object) => Arc::increment_strong_count(p as *const ObjectData),
            Some(VariantType::Callable) => Arc::increment_strong_count(p as *const CallableData),
            _ => {}
        }
        Self::decode_take(RawVariant { tag: raw.tag, _pad: 0, payload: raw.payload })
    }

    /// Decode by value, adopting the strong reference held by `raw`
    ///
    /// # Safety
    /// `raw` must hold a value produced by `encode` that nobody else will
    /// decode again.
    pub unsafe fn decode_take(raw: RawVariant) -> Value {
        let p = raw.payload[0] as usize;
        match VariantType::from_raw(raw.tag) {
            Some(VariantType::Nil) => Value::Nil,
            Some(VariantType::Bool) => Value::Bool(raw.payload[0] != 0),
            Some(VariantType::Int) => Value::Int(raw.payload[0] as i64),
            Some(VariantType::Float) => Value::Float(f64::from_bits(raw.payload[0])),
            Some(VariantType::String) => Value::String(Arc::from_raw(p as *const String)),
            Some(VariantType::Vector3) => Value::Vector3([
                f32::from_bits(raw.payload[0] as u32),
                f32::from_bits((raw.payload[0] >> 32) as u32),
                f32::from_bits(raw.payload[1] as u32),
            ]),
            Some(VariantType::StringName) => {
                match (p as *const NameEntry).as_ref() {
                    Some(entry) => Value::StringName(Name::from_entry(entry)),
                    None => Value::Nil,
                }
            }
            Some(VariantType::Object) => Value::Object(Arc::from_raw(p as *const ObjectData)),
            Some(VariantType::Callable) => Value::Callable(Arc::from_raw(p as *const CallableData)),
            None => {
                tracing::warn!(target: "runtime", tag = raw.tag, "corrupt variant tag");
                Value::Nil
            }
        }
    }

    /// Equality under runtime rules: kinds must match, Nil equals only Nil
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector3(a), Value::Vector3(b)) => a == b,
            (Value::StringName(a), Value::StringName(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => a.same_target(b),
            _ => false,
        }
    }

    pub fn hash_value(&self) -> i64 {
        let mut hasher = DefaultHasher::new();
        self.get_type().hash(&mut hasher);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(&mut hasher),
            Value::Int(i) => i.hash(&mut hasher),
            Value::Float(f) => f.to_bits().hash(&mut hasher),
            Value::String(s) => s.hash(&mut hasher),
            Value::Vector3(v) => v.iter().for_each(|c| c.to_bits().hash(&mut hasher)),
            Value::StringName(n) => n.hash(&mut hasher),
            Value::Object(o) => o.id().hash(&mut hasher),
            Value::Callable(c) => c.hash_target(&mut hasher),
        }
        hasher.finish() as i64
    }

    /// Truthiness used by utility functions
    pub fn booleanize(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vector3(v) => v.iter().any(|c| *c != 0.0),
            Value::StringName(n) => !n.as_str().is_empty(),
            Value::Object(_) | Value::Callable(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<null>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Vector3([x, y, z]) => write!(f, "({}, {}, {})", x, y, z),
            Value::StringName(n) => f.write_str(n.as_str()),
            Value::Object(o) => write!(f, "<{}#{}>", o.class().name(), o.id()),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.get_type().name(), self)
    }
}

// ============================================================================
// Raw buffer helpers used by the C ABI
// ============================================================================

/// Initialize an uninitialized buffer
///
/// # Safety
/// `dst` must be valid for writes; previous contents are not released.
#[inline]
pub unsafe fn write_new(dst: *mut RawVariant, value: Value) {
    dst.write(value.encode());
}

/// Overwrite an initialized buffer, releasing its previous contents
///
/// # Safety
/// `dst` must hold a valid variant.
#[inline]
pub unsafe fn assign(dst: *mut RawVariant, value: Value) {
    let old = dst.read();
    dst.write(value.encode());
    drop(Value::decode_take(old));
}

/// Clone the value held by an initialized buffer (null reads as Nil)
///
/// # Safety
/// `src` must be null or hold a valid variant.
#[inline]
pub unsafe fn read(src: *const RawVariant) -> Value {
    match src.as_ref() {
        Some(raw) => Value::decode_clone(raw),
        None => Value::Nil,
    }
}

/// Release the value held by a buffer, leaving Nil behind
///
/// # Safety
/// `dst` must hold a valid variant.
#[inline]
pub unsafe fn destroy(dst: *mut RawVariant) {
    let old = dst.read();
    dst.write(RawVariant::NIL);
    drop(Value::decode_take(old));
}

/// Read `argc` argument pointers into owned values
///
/// # Safety
/// `args` must point to `argc` valid variant pointers (or be null when
/// `argc` is zero).
pub unsafe fn read_args(args: *const *const RawVariant, argc: usize) -> Vec<Value> {
    if args.is_null() || argc == 0 {
        return Vec::new();
    }
    core::slice::from_raw_parts(args, argc)
        .iter()
        .map(|&p| read(p))
        .collect()
}

/// Read a value from a pointer to its native layout
///
/// Native layouts: bool as `u8`, int as `i64`, float as `f64`, Vector3 as
/// `[f32; 3]`, StringName as `RawStringName`, Object as a pointer to the
/// object pointer. String, Callable and Nil have none.
///
/// # Safety
/// `ptr` must be null or point to a valid value of the native layout for `ty`.
pub unsafe fn read_native(ptr: *const c_void, ty: VariantType) -> Option<Value> {
    if ptr.is_null() {
        return None;
    }
    Some(match ty {
        VariantType::Bool => Value::Bool(*(ptr as *const u8) != 0),
        VariantType::Int => Value::Int(*(ptr as *const i64)),
        VariantType::Float => Value::Float(*(ptr as *const f64)),
        VariantType::Vector3 => Value::Vector3(*(ptr as *const [f32; 3])),
        VariantType::StringName => Value::StringName(Name::from_raw(ptr as *const RawStringName)?),
        VariantType::Object => match ObjectData::from_ptr(*(ptr as *const *const c_void)) {
            Some(obj) => Value::Object(obj),
            None => Value::Nil,
        },
        VariantType::Nil | VariantType::String | VariantType::Callable => return None,
    })
}

/// Write a value to a pointer to its native layout; kind mismatches are ignored
///
/// Objects are written as a new strong reference owned by the receiver.
///
/// # Safety
/// `ret` must be null or valid for writes of the native layout for `ty`.
pub unsafe fn write_native(ret: *mut c_void, ty: VariantType, value: Value) {
    if ret.is_null() {
        return;
    }
    match (ty, value) {
        (VariantType::Bool, Value::Bool(b)) => *(ret as *mut u8) = b as u8,
        (VariantType::Int, Value::Int(i)) => *(ret as *mut i64) = i,
        (VariantType::Float, Value::Float(f)) => *(ret as *mut f64) = f,
        (VariantType::Vector3, Value::Vector3(v)) => *(ret as *mut [f32; 3]) = v,
        (VariantType::StringName, Value::StringName(n)) => *(ret as *mut RawStringName) = n.to_raw(),
        (VariantType::Object, Value::Object(obj)) => {
            *(ret as *mut *mut c_void) = ObjectData::into_ptr(obj);
        }
        (VariantType::Object, _) => *(ret as *mut *mut c_void) = core::ptr::null_mut(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: Value) -> Value {
        let raw = value.encode();
        unsafe { Value::decode_take(raw) }
    }

    #[test]
    fn test_layout() {
        assert_eq!(core::mem::size_of::<RawVariant>(), 24);
        assert_eq!(core::mem::align_of::<RawVariant>(), 8);
    }

    #[test]
    fn test_scalar_encoding() {
        assert!(roundtrip(Value::Int(-42)).equals(&Value::Int(-42)));
        assert!(roundtrip(Value::Float(1.5)).equals(&Value::Float(1.5)));
        assert!(roundtrip(Value::Bool(true)).equals(&Value::Bool(true)));
        assert!(roundtrip(Value::Nil).equals(&Value::Nil));
        assert!(roundtrip(Value::Vector3([1.0, -2.0, 3.5])).equals(&Value::Vector3([1.0, -2.0, 3.5])));
    }

    #[test]
    fn test_string_refcount() {
        let s = Arc::new(String::from("Foo"));
        let raw = Value::String(s.clone()).encode();
        assert_eq!(Arc::strong_count(&s), 2);

        let copy = unsafe { Value::decode_clone(&raw) };
        assert_eq!(Arc::strong_count(&s), 3);
        drop(copy);

        drop(unsafe { Value::decode_take(raw) });
        assert_eq!(Arc::strong_count(&s), 1);
    }

    #[test]
    fn test_assign_releases_previous() {
        let s = Arc::new(String::from("old"));
        let mut raw = Value::String(s.clone()).encode();
        unsafe { assign(&mut raw, Value::Int(7)) };
        assert_eq!(Arc::strong_count(&s), 1);
        assert!(unsafe { read(&raw) }.equals(&Value::Int(7)));
    }

    #[test]
    fn test_equality_is_kind_strict() {
        assert!(!Value::Int(1).equals(&Value::Float(1.0)));
        assert!(!Value::Nil.equals(&Value::Int(0)));
        assert!(!Value::Nil.equals(&Value::string("")));
        assert!(Value::string("a").equals(&Value::string("a")));
    }
}
