//! Core value types
//!
//! The variant container, the conversions into and out of it, and the
//! fixed-layout payloads that cross the ABI by value.

pub mod convert;
pub mod intern;
pub mod string_name;
pub mod variant;
pub mod vector3;

pub use convert::{ToVariant, VariantStorable};
pub use string_name::StringName;
pub use variant::{Variant, VariantType, VARIANT_SIZE, VARIANT_TYPE_COUNT};
pub use vector3::Vector3;
