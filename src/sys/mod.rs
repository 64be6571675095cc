//! ABI crossing point - the table of runtime entry points
//!
//! Design:
//! 1. Every entry point is resolved once, by name, through the runtime's
//!    `GetProcAddress` loader and stored as a typed function pointer
//! 2. The table lives in a process-wide `OnceCell`; installing the same
//!    loader twice is a no-op, a different one is rejected
//! 3. Native-layout constructors for every fixed-layout kind are resolved
//!    eagerly so conversions never fail on a missing constructor

mod library;
pub mod types;

pub use library::Library;
pub use types::*;

use crate::core::variant::{VariantType, VARIANT_TYPE_COUNT};
use crate::error::InitError;
use crate::logging::{debug, info};
use core::ffi::c_char;
use once_cell::sync::OnceCell;

static INTERFACE: OnceCell<Interface> = OnceCell::new();

/// Libraries loaded by `initialize_from_library` stay mapped for the
/// lifetime of the process
static LIBRARY: OnceCell<Library> = OnceCell::new();

/// Kinds with a fixed native layout
const NATIVE_KINDS: [VariantType; 6] = [
    VariantType::Bool,
    VariantType::Int,
    VariantType::Float,
    VariantType::Vector3,
    VariantType::StringName,
    VariantType::Object,
];

macro_rules! interface_table {
    ($($name:ident: $ty:ty,)*) => {
        /// Resolved runtime entry points
        pub struct Interface {
            loader: GetProcAddress,
            from_type: [Option<VariantFromTypeFn>; VARIANT_TYPE_COUNT],
            to_type: [Option<VariantToTypeFn>; VARIANT_TYPE_COUNT],
            $(pub $name: $ty,)*
        }

        impl Interface {
            /// Resolve every entry point through `loader`
            ///
            /// # Safety
            /// `loader` must return pointers whose real signatures match the
            /// aliases in `sys::types`.
            pub unsafe fn load(loader: GetProcAddress) -> Result<Self, InitError> {
                let mut table = Self {
                    loader,
                    from_type: [None; VARIANT_TYPE_COUNT],
                    to_type: [None; VARIANT_TYPE_COUNT],
                    $($name: load_symbol::<$ty>(loader, concat!(stringify!($name), "\0"))?,)*
                };
                table.load_constructors()?;
                Ok(table)
            }
        }
    };
}

interface_table! {
    variant_new_nil: VariantNewNilFn,
    variant_new_copy: VariantNewCopyFn,
    variant_destroy: VariantDestroyFn,
    variant_get_type: VariantGetTypeFn,
    variant_equal: VariantEqualFn,
    variant_hash: VariantHashFn,
    variant_stringify: VariantStringifyFn,
    variant_new_string: VariantNewStringFn,
    variant_get_string: VariantGetStringFn,
    get_variant_from_type_constructor: GetVariantFromTypeConstructorFn,
    get_variant_to_type_constructor: GetVariantToTypeConstructorFn,
    variant_call: VariantCallFn,
    string_name_new: StringNameNewFn,
    string_name_new_copy: StringNameNewCopyFn,
    string_name_destroy: StringNameDestroyFn,
    string_name_to_utf8: StringNameToUtf8Fn,
    classdb_get_method_bind: ClassdbGetMethodBindFn,
    classdb_construct_object: ClassdbConstructObjectFn,
    classdb_register_class: ClassdbRegisterClassFn,
    classdb_register_method: ClassdbRegisterMethodFn,
    object_method_bind_call: ObjectMethodBindCallFn,
    object_method_bind_ptrcall: ObjectMethodBindPtrcallFn,
    object_get_class_name: ObjectGetClassNameFn,
    object_retain: ObjectRetainFn,
    object_release: ObjectReleaseFn,
    object_get_instance_id: ObjectGetInstanceIdFn,
    variant_get_ptr_builtin_method: GetPtrBuiltinMethodFn,
    variant_get_ptr_utility_function: GetPtrUtilityFunctionFn,
    callable_custom_create: CallableCustomCreateFn,
    callable_method_create: CallableMethodCreateFn,
}

/// `name` must be NUL-terminated
unsafe fn load_symbol<F: Copy>(loader: GetProcAddress, name: &'static str) -> Result<F, InitError> {
    debug_assert!(name.ends_with('\0'));
    debug_assert_eq!(core::mem::size_of::<F>(), core::mem::size_of::<ProcAddress>());

    let display = name.trim_end_matches('\0');
    match loader(name.as_ptr() as *const c_char) {
        Some(entry) => Ok(core::mem::transmute_copy::<ProcAddress, F>(&entry)),
        None => Err(InitError::MissingSymbol(display)),
    }
}

impl Interface {
    unsafe fn load_constructors(&mut self) -> Result<(), InitError> {
        for kind in NATIVE_KINDS {
            let from = (self.get_variant_from_type_constructor)(kind as u32)
                .ok_or(InitError::MissingConstructor { kind, direction: "from-type" })?;
            let to = (self.get_variant_to_type_constructor)(kind as u32)
                .ok_or(InitError::MissingConstructor { kind, direction: "to-type" })?;
            self.from_type[kind as usize] = Some(from);
            self.to_type[kind as usize] = Some(to);
        }
        Ok(())
    }

    /// Constructor writing a variant from a value in native layout
    #[inline]
    pub fn from_type(&self, kind: VariantType) -> VariantFromTypeFn {
        match self.from_type[kind as usize] {
            Some(ctor) => ctor,
            None => panic!("{:?} has no native layout", kind),
        }
    }

    /// Constructor reading a variant into a value in native layout
    #[inline]
    pub fn to_type(&self, kind: VariantType) -> VariantToTypeFn {
        match self.to_type[kind as usize] {
            Some(ctor) => ctor,
            None => panic!("{:?} has no native layout", kind),
        }
    }
}

/// Installed entry point table
///
/// Using the bridge before `initialize` is an internal consistency
/// violation and panics.
#[inline]
pub fn interface() -> &'static Interface {
    match INTERFACE.get() {
        Some(table) => table,
        None => panic!("hostlink used before initialize(): no runtime interface installed"),
    }
}

pub fn is_initialized() -> bool {
    INTERFACE.get().is_some()
}

/// Install the entry point table from `loader`
pub fn install(loader: GetProcAddress) -> Result<&'static Interface, InitError> {
    let mut installed_here = false;
    let table = INTERFACE.get_or_try_init(|| {
        installed_here = true;
        unsafe { Interface::load(loader) }
    })?;

    if installed_here {
        info!(target: "interface", "runtime interface installed");
    } else if table.loader as usize != loader as usize {
        return Err(InitError::AlreadyInitialized);
    } else {
        debug!(target: "interface", "runtime interface already installed");
    }
    Ok(table)
}

/// Load a runtime shared library and install its entry points
///
/// Only one library is ever mapped; asking for another path afterwards fails.
pub fn install_from_library(path: &str, symbol: &str) -> Result<&'static Interface, InitError> {
    let library = LIBRARY.get_or_try_init(|| Library::load(path))?;
    check_library_path(library.path(), path)?;
    let address = library.symbol(symbol).map_err(|source| InitError::Symbol {
        symbol: symbol.to_owned(),
        source,
    })?;
    // SAFETY: the exported symbol is the runtime's `GetProcAddress` loader
    let loader = unsafe { core::mem::transmute::<*const (), GetProcAddress>(address) };
    install(loader)
}

fn check_library_path(loaded: &str, requested: &str) -> Result<(), InitError> {
    if loaded == requested {
        return Ok(());
    }
    Err(InitError::LibraryMismatch { loaded: loaded.to_owned(), requested: requested.to_owned() })
}
