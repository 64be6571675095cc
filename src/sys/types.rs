//! Raw ABI types - pointer aliases, records and entry point signatures
//!
//! Everything here mirrors the runtime's C interface bit for bit. Opaque
//! buffers are passed as untyped pointers; the safe wrappers in `core`
//! own the layout.

use core::ffi::{c_char, c_void};

pub type VariantPtr = *mut c_void;
pub type ConstVariantPtr = *const c_void;
pub type StringNamePtr = *mut c_void;
pub type ConstStringNamePtr = *const c_void;
pub type ObjectPtr = *mut c_void;
pub type ConstObjectPtr = *const c_void;
pub type MethodBindPtr = *const c_void;
pub type TypePtr = *mut c_void;
pub type ConstTypePtr = *const c_void;

/// Untyped entry point returned by the loader
pub type ProcAddress = unsafe extern "C" fn();

/// Name-based entry point loader exported by the runtime
pub type GetProcAddress = unsafe extern "C" fn(name: *const c_char) -> Option<ProcAddress>;

/// Error record filled by every name-addressed call
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallErrorRaw {
    pub error: u32,
    pub argument: i32,
    pub expected: i32,
}

impl CallErrorRaw {
    pub const OK: u32 = 0;
    pub const INVALID_METHOD: u32 = 1;
    pub const INVALID_ARGUMENT: u32 = 2;
    pub const TOO_MANY_ARGUMENTS: u32 = 3;
    pub const TOO_FEW_ARGUMENTS: u32 = 4;
    pub const INSTANCE_IS_NULL: u32 = 5;
    pub const METHOD_NOT_CONST: u32 = 6;

    #[inline]
    pub const fn new(error: u32, argument: i32, expected: i32) -> Self {
        Self { error, argument, expected }
    }

    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.error == Self::OK
    }
}

pub type CallableCallFn = unsafe extern "C" fn(
    userdata: *mut c_void,
    args: *const ConstVariantPtr,
    argc: i64,
    ret: VariantPtr,
    err: *mut CallErrorRaw,
);

pub type CallableFreeFn = unsafe extern "C" fn(userdata: *mut c_void);

/// Registration record for host callables
#[repr(C)]
pub struct CallableCustomInfo {
    pub userdata: *mut c_void,
    pub call_func: Option<CallableCallFn>,
    pub free_func: Option<CallableFreeFn>,
}

// Variants
pub type VariantNewNilFn = unsafe extern "C" fn(dst: VariantPtr);
pub type VariantNewCopyFn = unsafe extern "C" fn(dst: VariantPtr, src: ConstVariantPtr);
pub type VariantDestroyFn = unsafe extern "C" fn(v: VariantPtr);
pub type VariantGetTypeFn = unsafe extern "C" fn(v: ConstVariantPtr) -> u32;
pub type VariantEqualFn = unsafe extern "C" fn(a: ConstVariantPtr, b: ConstVariantPtr) -> u8;
pub type VariantHashFn = unsafe extern "C" fn(v: ConstVariantPtr) -> i64;
pub type VariantStringifyFn = unsafe extern "C" fn(v: ConstVariantPtr, dst: VariantPtr);
pub type VariantNewStringFn = unsafe extern "C" fn(dst: VariantPtr, utf8: *const u8, len: i64);
pub type VariantGetStringFn = unsafe extern "C" fn(v: ConstVariantPtr, buf: *mut u8, cap: i64) -> i64;
pub type VariantFromTypeFn = unsafe extern "C" fn(dst: VariantPtr, src: ConstTypePtr);
pub type VariantToTypeFn = unsafe extern "C" fn(dst: TypePtr, src: ConstVariantPtr);
pub type GetVariantFromTypeConstructorFn = unsafe extern "C" fn(ty: u32) -> Option<VariantFromTypeFn>;
pub type GetVariantToTypeConstructorFn = unsafe extern "C" fn(ty: u32) -> Option<VariantToTypeFn>;
pub type VariantCallFn = unsafe extern "C" fn(
    target: VariantPtr,
    method: ConstStringNamePtr,
    args: *const ConstVariantPtr,
    argc: i64,
    ret: VariantPtr,
    err: *mut CallErrorRaw,
);

// Names
pub type StringNameNewFn = unsafe extern "C" fn(dst: StringNamePtr, utf8: *const u8, len: i64);
pub type StringNameNewCopyFn = unsafe extern "C" fn(dst: StringNamePtr, src: ConstStringNamePtr);
pub type StringNameDestroyFn = unsafe extern "C" fn(name: StringNamePtr);
pub type StringNameToUtf8Fn = unsafe extern "C" fn(name: ConstStringNamePtr, buf: *mut u8, cap: i64) -> i64;

// Class database and objects
pub type ClassdbGetMethodBindFn =
    unsafe extern "C" fn(class: ConstStringNamePtr, method: ConstStringNamePtr) -> MethodBindPtr;
pub type ClassdbConstructObjectFn = unsafe extern "C" fn(class: ConstStringNamePtr) -> ObjectPtr;
pub type ClassdbRegisterClassFn =
    unsafe extern "C" fn(class: ConstStringNamePtr, parent: ConstStringNamePtr) -> u8;
pub type ClassdbRegisterMethodFn = unsafe extern "C" fn(
    class: ConstStringNamePtr,
    method: ConstStringNamePtr,
    callable: ConstVariantPtr,
    argc: i64,
) -> u8;
pub type ObjectMethodBindCallFn = unsafe extern "C" fn(
    bind: MethodBindPtr,
    object: ObjectPtr,
    args: *const ConstVariantPtr,
    argc: i64,
    ret: VariantPtr,
    err: *mut CallErrorRaw,
);
pub type ObjectMethodBindPtrcallFn =
    unsafe extern "C" fn(bind: MethodBindPtr, object: ObjectPtr, args: *const ConstTypePtr, ret: TypePtr);
pub type ObjectGetClassNameFn = unsafe extern "C" fn(object: ConstObjectPtr, dst: StringNamePtr);
pub type ObjectRetainFn = unsafe extern "C" fn(object: ObjectPtr);
pub type ObjectReleaseFn = unsafe extern "C" fn(object: ObjectPtr);
pub type ObjectGetInstanceIdFn = unsafe extern "C" fn(object: ConstObjectPtr) -> u64;

// Builtins and utilities
pub type BuiltinPtrFn = unsafe extern "C" fn(base: TypePtr, args: *const ConstTypePtr, ret: TypePtr, argc: i32);
pub type GetPtrBuiltinMethodFn =
    unsafe extern "C" fn(ty: u32, method: ConstStringNamePtr) -> Option<BuiltinPtrFn>;
pub type UtilityFn = unsafe extern "C" fn(ret: VariantPtr, args: *const ConstVariantPtr, argc: i32);
pub type GetPtrUtilityFunctionFn = unsafe extern "C" fn(name: ConstStringNamePtr) -> Option<UtilityFn>;

// Callables
pub type CallableCustomCreateFn = unsafe extern "C" fn(dst: VariantPtr, info: *const CallableCustomInfo);
pub type CallableMethodCreateFn =
    unsafe extern "C" fn(dst: VariantPtr, object: ConstObjectPtr, method: ConstStringNamePtr);
