//! hostlink runtime - reference in-process host engine
//!
//! Owns the variant binary layout, the interned name table and the object
//! model, and exposes all of it through `extern "C"` entry points resolved
//! by name via `hostlink_get_proc_address`.

pub mod builtins;
pub mod callable;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod names;
pub mod objects;
pub mod variant;

pub use error::{CallErrorKind, CallErrorRaw};
pub use ffi::{hostlink_get_proc_address, ProcAddress, ENTRY_POINTS};
pub use names::{Name, RawStringName};
pub use variant::{RawVariant, Value, VariantType, VARIANT_SIZE};
