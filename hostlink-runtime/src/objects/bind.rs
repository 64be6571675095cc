//! Method binds - resolved entry points stored in class tables
//!
//! A bind is either native (implemented by the runtime, with a declared
//! signature used for argument validation and typed `ptrcall`) or an
//! extension method backed by a host callable.
//!
//! Validation lives here and only here: the bridge never checks argument
//! kinds before crossing the ABI.

use super::ObjectData;
use crate::callable::CallableData;
use crate::error::{CallErrorRaw, CallResult};
use crate::names::Name;
use crate::variant::{read_native, write_native, Value, VariantType};
use core::ffi::c_void;
use std::sync::Arc;

/// Default value for a trailing optional parameter
#[derive(Debug, Clone, Copy)]
pub enum DefaultArg {
    Bool(bool),
    Int(i64),
}

impl DefaultArg {
    #[inline]
    fn to_value(self) -> Value {
        match self {
            DefaultArg::Bool(b) => Value::Bool(b),
            DefaultArg::Int(i) => Value::Int(i),
        }
    }
}

/// Declared parameter
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub ty: VariantType,
    pub default: Option<DefaultArg>,
}

impl Param {
    pub const fn required(ty: VariantType) -> Self {
        Self { ty, default: None }
    }

    pub const fn optional(ty: VariantType, default: DefaultArg) -> Self {
        Self { ty, default: Some(default) }
    }
}

pub type NativeFn = fn(&Arc<ObjectData>, &[Value]) -> CallResult<Value>;

/// Runtime-implemented method
pub struct NativeMethod {
    pub params: &'static [Param],
    pub returns: VariantType,
    pub func: NativeFn,
}

pub enum BindKind {
    Native(NativeMethod),
    /// Host method; the receiver is passed as argument 0
    Extension {
        callable: Arc<CallableData>,
        argc: Option<usize>,
    },
}

/// Resolved method entry
pub struct MethodBind {
    name: Name,
    kind: BindKind,
}

impl MethodBind {
    pub fn native(name: &str, params: &'static [Param], returns: VariantType, func: NativeFn) -> Self {
        Self {
            name: Name::intern(name),
            kind: BindKind::Native(NativeMethod { params, returns, func }),
        }
    }

    pub fn extension(name: Name, callable: Arc<CallableData>, argc: Option<usize>) -> Self {
        Self { name, kind: BindKind::Extension { callable, argc } }
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> &BindKind {
        &self.kind
    }

    /// Variant-level call with full validation
    pub fn call(&self, object: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
        match &self.kind {
            BindKind::Native(native) => {
                let bound = bind_args(native.params, args)?;
                (native.func)(object, &bound)
            }
            BindKind::Extension { callable, argc } => {
                if let Some(expected) = *argc {
                    if args.len() > expected {
                        return Err(CallErrorRaw::too_many(expected));
                    }
                    if args.len() < expected {
                        return Err(CallErrorRaw::too_few(expected));
                    }
                }
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(Value::Object(object.clone()));
                full.extend_from_slice(args);
                callable.call(&full)
            }
        }
    }

    /// Typed call: every declared parameter is passed as a pointer to its
    /// native representation and the result is written to `ret`
    ///
    /// # Safety
    /// `args` must hold one correctly typed pointer per declared parameter
    /// and `ret` must be valid for the declared return type (or null when
    /// the method returns nothing).
    pub unsafe fn ptrcall(
        &self,
        object: &Arc<ObjectData>,
        args: *const *const c_void,
        ret: *mut c_void,
    ) -> CallResult<()> {
        let native = match &self.kind {
            BindKind::Native(native) => native,
            BindKind::Extension { .. } => return Err(CallErrorRaw::invalid_method()),
        };

        let mut values = Vec::with_capacity(native.params.len());
        for (i, param) in native.params.iter().enumerate() {
            let ptr = if args.is_null() { core::ptr::null() } else { *args.add(i) };
            values.push(read_native(ptr, param.ty).ok_or(CallErrorRaw::invalid_argument(i, param.ty))?);
        }

        let result = (native.func)(object, &values)?;
        write_native(ret, native.returns, result);
        Ok(())
    }
}

/// Check arity, coerce kinds and fill defaults
fn bind_args(params: &[Param], args: &[Value]) -> CallResult<Vec<Value>> {
    let required = params.iter().take_while(|p| p.default.is_none()).count();
    if args.len() > params.len() {
        return Err(CallErrorRaw::too_many(params.len()));
    }
    if args.len() < required {
        return Err(CallErrorRaw::too_few(required));
    }

    let mut bound = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        match args.get(i) {
            Some(arg) => bound.push(coerce(arg, param.ty).ok_or(CallErrorRaw::invalid_argument(i, param.ty))?),
            None => match param.default {
                Some(default) => bound.push(default.to_value()),
                None => return Err(CallErrorRaw::too_few(required)),
            },
        }
    }
    Ok(bound)
}

/// Implicit conversions accepted at call boundaries
pub fn coerce(value: &Value, ty: VariantType) -> Option<Value> {
    if value.get_type() == ty {
        return Some(value.clone());
    }
    match (value, ty) {
        (Value::Int(i), VariantType::Float) => Some(Value::Float(*i as f64)),
        (Value::Bool(b), VariantType::Int) => Some(Value::Int(*b as i64)),
        (Value::String(s), VariantType::StringName) => Some(Value::StringName(Name::intern(s))),
        (Value::StringName(n), VariantType::String) => Some(Value::string(n.as_str())),
        _ => None,
    }
}
