//! Storable-value capability - the only path between host values and variants
//!
//! Every storable host type has exactly one canonical variant kind.
//! Extraction checks the kind first and never asks the runtime to convert
//! across kinds, so a mismatch is a cheap `None`.

use crate::core::string_name::StringName;
use crate::core::variant::{Variant, VariantType};
use crate::core::vector3::Vector3;
use crate::object::Object;
use crate::sys::{self, ConstTypePtr, TypePtr};
use core::ffi::c_void;

/// Total half of the capability: every value has a variant form
///
/// Also implemented by argument-only types such as `&str`.
pub trait ToVariant {
    fn to_variant(&self) -> Variant;
}

/// Host types with a canonical variant kind
pub trait VariantStorable: ToVariant + Sized {
    /// Partial: `None` on kind mismatch or an out-of-range payload
    fn from_variant(variant: &Variant) -> Option<Self>;
}

impl ToVariant for &str {
    #[inline]
    fn to_variant(&self) -> Variant {
        string_variant(self)
    }
}

// ============================================================================
// Native layout helpers
// ============================================================================

/// # Safety
/// `T` must be the native layout of `kind`.
#[inline]
unsafe fn from_layout<T>(kind: VariantType, value: &T) -> Variant {
    let ctor = sys::interface().from_type(kind);
    Variant::from_uninit(|dst| ctor(dst, value as *const T as ConstTypePtr))
}

/// # Safety
/// `T` must be the native layout of `kind` and `variant` must hold `kind`.
#[inline]
unsafe fn to_layout<T>(variant: &Variant, kind: VariantType, mut out: T) -> T {
    let ctor = sys::interface().to_type(kind);
    ctor(&mut out as *mut T as TypePtr, variant.as_ptr());
    out
}

fn string_variant(text: &str) -> Variant {
    unsafe {
        Variant::from_uninit(|dst| (sys::interface().variant_new_string)(dst, text.as_ptr(), text.len() as i64))
    }
}

// ============================================================================
// Scalars
// ============================================================================

impl ToVariant for bool {
    fn to_variant(&self) -> Variant {
        unsafe { from_layout(VariantType::Bool, &(*self as u8)) }
    }
}

impl VariantStorable for bool {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Bool => Some(unsafe { to_layout(variant, VariantType::Bool, 0u8) } != 0),
            _ => None,
        }
    }
}

impl ToVariant for i64 {
    fn to_variant(&self) -> Variant {
        unsafe { from_layout(VariantType::Int, self) }
    }
}

impl VariantStorable for i64 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Int => Some(unsafe { to_layout(variant, VariantType::Int, 0i64) }),
            _ => None,
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl ToVariant for $ty {
                #[inline]
                fn to_variant(&self) -> Variant {
                    (*self as i64).to_variant()
                }
            }

            impl VariantStorable for $ty {
                #[inline]
                fn from_variant(variant: &Variant) -> Option<Self> {
                    i64::from_variant(variant).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

narrow_int!(i8, i16, i32, u8, u16, u32, isize);

impl ToVariant for f64 {
    fn to_variant(&self) -> Variant {
        unsafe { from_layout(VariantType::Float, self) }
    }
}

impl VariantStorable for f64 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Float => Some(unsafe { to_layout(variant, VariantType::Float, 0f64) }),
            _ => None,
        }
    }
}

impl ToVariant for f32 {
    #[inline]
    fn to_variant(&self) -> Variant {
        (*self as f64).to_variant()
    }
}

impl VariantStorable for f32 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        let value = f64::from_variant(variant)?;
        // NaN and infinities carry over; finite values must fit
        if value.is_finite() && value.abs() > f32::MAX as f64 {
            return None;
        }
        Some(value as f32)
    }
}

// ============================================================================
// Composites
// ============================================================================

impl ToVariant for String {
    #[inline]
    fn to_variant(&self) -> Variant {
        string_variant(self)
    }
}

impl VariantStorable for String {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::String => variant.read_string(),
            _ => None,
        }
    }
}

impl ToVariant for Vector3 {
    fn to_variant(&self) -> Variant {
        unsafe { from_layout(VariantType::Vector3, self) }
    }
}

impl VariantStorable for Vector3 {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Vector3 => Some(unsafe { to_layout(variant, VariantType::Vector3, Vector3::ZERO) }),
            _ => None,
        }
    }
}

impl ToVariant for StringName {
    fn to_variant(&self) -> Variant {
        unsafe { from_layout(VariantType::StringName, self) }
    }
}

impl VariantStorable for StringName {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::StringName => {
                let ctor = sys::interface().to_type(VariantType::StringName);
                Some(unsafe { StringName::from_uninit(|dst| ctor(dst, variant.as_ptr())) })
            }
            _ => None,
        }
    }
}

impl ToVariant for Object {
    fn to_variant(&self) -> Variant {
        // Native layout of an object is a pointer to the object pointer
        let raw = self.as_ptr();
        unsafe { from_layout(VariantType::Object, &raw) }
    }
}

impl VariantStorable for Object {
    fn from_variant(variant: &Variant) -> Option<Self> {
        match variant.get_type() {
            VariantType::Object => {
                // The runtime hands back a reference we now own
                let raw = unsafe { to_layout(variant, VariantType::Object, core::ptr::null_mut::<c_void>()) };
                unsafe { Object::from_owned_ptr(raw) }
            }
            _ => None,
        }
    }
}

impl ToVariant for Variant {
    #[inline]
    fn to_variant(&self) -> Variant {
        self.clone()
    }
}

impl VariantStorable for Variant {
    #[inline]
    fn from_variant(variant: &Variant) -> Option<Self> {
        Some(variant.clone())
    }
}

impl<T: VariantStorable> ToVariant for Option<T> {
    fn to_variant(&self) -> Variant {
        match self {
            Some(value) => value.to_variant(),
            None => Variant::nil(),
        }
    }
}

impl<T: VariantStorable> VariantStorable for Option<T> {
    fn from_variant(variant: &Variant) -> Option<Self> {
        if variant.is_nil() {
            return Some(None);
        }
        T::from_variant(variant).map(Some)
    }
}

impl ToVariant for () {
    #[inline]
    fn to_variant(&self) -> Variant {
        Variant::nil()
    }
}

impl VariantStorable for () {
    #[inline]
    fn from_variant(variant: &Variant) -> Option<Self> {
        variant.is_nil().then_some(())
    }
}

macro_rules! variant_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Variant {
                #[inline]
                fn from(value: $ty) -> Self {
                    value.to_variant()
                }
            }
        )*
    };
}

variant_from!(bool, i8, i16, i32, i64, u8, u16, u32, isize, f32, f64, String, Vector3, StringName, Object);

impl From<&str> for Variant {
    #[inline]
    fn from(text: &str) -> Self {
        string_variant(text)
    }
}
