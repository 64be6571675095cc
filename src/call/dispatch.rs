//! Call dispatcher - name-addressed calls on runtime receivers
//!
//! Design:
//! 1. Resolve (class, method) to an opaque bind, cached per pair
//! 2. Marshal argument pointers with the fixed-arity arrays
//! 3. Call through the runtime with a nil result buffer and a cleared
//!    error record; any error code means "no result"
//!
//! Argument validation is the runtime's job: kinds and arity are never
//! checked here.

use crate::call::pointers::{with_pointers, MAX_INLINE_ARGS};
use crate::config;
use crate::core::convert::{ToVariant, VariantStorable};
use crate::core::string_name::StringName;
use crate::core::variant::{Variant, VariantType};
use crate::error::CallError;
use crate::logging::{debug, log_call, log_call_failed};
use crate::object::Object;
use crate::sys::{self, BuiltinPtrFn, CallErrorRaw};
use core::ffi::c_void;
use core::ptr::NonNull;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

static CALLS: AtomicU64 = AtomicU64::new(0);
static FAILED_CALLS: AtomicU64 = AtomicU64::new(0);
static HEAP_MARSHALS: AtomicU64 = AtomicU64::new(0);

static METHOD_CACHE: Lazy<MethodCache> = Lazy::new(MethodCache::new);

/// Builtin pointer methods per (kind, name)
static BUILTINS: Lazy<DashMap<(VariantType, &'static str), BuiltinPtrFn>> = Lazy::new(DashMap::new);

/// Resolved method entry; valid for the lifetime of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodBind(NonNull<c_void>);

// Binds are immutable runtime records with stable addresses.
unsafe impl Send for MethodBind {}
unsafe impl Sync for MethodBind {}

impl MethodBind {
    #[inline]
    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr() as *const c_void
    }
}

struct CachedBind {
    // Held so the key bytes stay valid names
    _class: StringName,
    _method: StringName,
    bind: MethodBind,
}

/// (class, method) -> bind cache; unresolved lookups are never stored
pub struct MethodCache {
    binds: DashMap<(u64, u64), CachedBind>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MethodCache {
    fn new() -> Self {
        Self {
            binds: DashMap::with_capacity(256),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, class: &StringName, method: &StringName) -> Option<MethodBind> {
        match self.binds.get(&(class.key(), method.key())) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.bind)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert if absent; a concurrent fill for the same pair keeps the first bind
    pub fn insert(&self, class: &StringName, method: &StringName, bind: MethodBind) -> MethodBind {
        self.binds
            .entry((class.key(), method.key()))
            .or_insert_with(|| CachedBind { _class: class.clone(), _method: method.clone(), bind })
            .bind
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    pub fn clear(&self) {
        self.binds.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

pub fn method_cache() -> &'static MethodCache {
    &METHOD_CACHE
}

// ============================================================================
// Resolution
// ============================================================================

pub fn resolve(receiver: &Object, method: &StringName) -> Option<MethodBind> {
    resolve_in(&receiver.class_name(), method)
}

/// Resolve `method` on `class` (inherited methods included)
pub fn resolve_in(class: &StringName, method: &StringName) -> Option<MethodBind> {
    resolve_with(class, method, config::current().dispatch.method_cache)
}

pub(crate) fn resolve_with(class: &StringName, method: &StringName, use_cache: bool) -> Option<MethodBind> {
    if use_cache {
        if let Some(bind) = METHOD_CACHE.get(class, method) {
            return Some(bind);
        }
    }

    let raw = unsafe { (sys::interface().classdb_get_method_bind)(class.as_ptr(), method.as_ptr()) };
    let Some(bind) = NonNull::new(raw as *mut c_void).map(MethodBind) else {
        debug!(target: "dispatch", class = %class, method = %method, "method not resolved");
        return None;
    };

    Some(if use_cache { METHOD_CACHE.insert(class, method, bind) } else { bind })
}

/// Typed builtin method of a variant kind, cached per name
pub fn resolve_builtin(kind: VariantType, method: &'static str) -> Option<BuiltinPtrFn> {
    if let Some(found) = BUILTINS.get(&(kind, method)) {
        return Some(*found);
    }
    let name = StringName::cached(method);
    let found = unsafe { (sys::interface().variant_get_ptr_builtin_method)(kind as u32, name.as_ptr()) }?;
    BUILTINS.insert((kind, method), found);
    Some(found)
}

// ============================================================================
// Calls
// ============================================================================

fn record_failure(method: &StringName, err: &CallError) {
    FAILED_CALLS.fetch_add(1, Ordering::Relaxed);
    if config::current().dispatch.log_failed_calls {
        log_call_failed(method, err);
    }
}

/// Call through a resolved bind
///
/// # Safety
/// `bind` must have been resolved on `receiver`'s class (or an ancestor).
pub unsafe fn call_bind(bind: MethodBind, receiver: &Object, args: &[&Variant]) -> Result<Variant, CallError> {
    let call = sys::interface().object_method_bind_call;
    let mut err = CallErrorRaw::default();
    let result = Variant::new_with(|ret| {
        with_pointers(args.iter().map(|arg| arg.as_ptr()), |ptrs, argc| {
            call(bind.as_ptr(), receiver.as_ptr(), ptrs, argc as i64, ret, &mut err)
        })
    });
    CallError::from_raw(err).map(|()| result)
}

/// Call `method` on `receiver`, reporting why it failed
pub fn try_call(receiver: &Object, method: &StringName, args: &[&Variant]) -> Result<Variant, CallError> {
    CALLS.fetch_add(1, Ordering::Relaxed);
    log_call(method, args.len());

    let result = match resolve(receiver, method) {
        Some(bind) => unsafe { call_bind(bind, receiver, args) },
        None => Err(CallError::InvalidMethod),
    };
    if let Err(err) = &result {
        record_failure(method, err);
    }
    result
}

/// Call `method` on `receiver`; `None` when unresolved or rejected
#[inline]
pub fn call(receiver: &Object, method: &StringName, args: &[&Variant]) -> Option<Variant> {
    try_call(receiver, method, args).ok()
}

/// Convert arguments, call, and extract the result as `R`
pub fn call_typed<R: VariantStorable>(receiver: &Object, method: &StringName, args: &[&dyn ToVariant]) -> Option<R> {
    let owned: SmallVec<[Variant; MAX_INLINE_ARGS]> = args.iter().map(|arg| arg.to_variant()).collect();
    let refs: SmallVec<[&Variant; MAX_INLINE_ARGS]> = owned.iter().collect();
    call(receiver, method, &refs).and_then(|result| R::from_variant(&result))
}

/// Typed call: arguments and result are pointers to native layouts
///
/// The runtime has no error channel here; a rejected call leaves `ret`
/// untouched.
///
/// # Safety
/// Every pointer must match the bind's declared parameter layout and `ret`
/// must be valid for its return layout (or null for no return value).
pub unsafe fn ptrcall(receiver: &Object, bind: MethodBind, args: &[*const c_void], ret: *mut c_void) {
    CALLS.fetch_add(1, Ordering::Relaxed);
    let ptrcall = sys::interface().object_method_bind_ptrcall;
    with_pointers(args.iter().copied(), |ptrs, _| {
        ptrcall(bind.as_ptr(), receiver.as_ptr(), ptrs, ret)
    });
}

/// Name-addressed call on any variant (builtins, callables, objects)
pub fn try_call_variant(target: &mut Variant, method: &StringName, args: &[&Variant]) -> Result<Variant, CallError> {
    CALLS.fetch_add(1, Ordering::Relaxed);
    log_call(method, args.len());

    let variant_call = sys::interface().variant_call;
    let target = target.as_mut_ptr();
    let mut err = CallErrorRaw::default();
    let result = unsafe {
        Variant::new_with(|ret| {
            with_pointers(args.iter().map(|arg| arg.as_ptr()), |ptrs, argc| {
                variant_call(target, method.as_ptr(), ptrs, argc as i64, ret, &mut err)
            })
        })
    };

    let result = CallError::from_raw(err).map(|()| result);
    if let Err(err) = &result {
        record_failure(method, err);
    }
    result
}

#[inline]
pub fn call_variant(target: &mut Variant, method: &StringName, args: &[&Variant]) -> Option<Variant> {
    try_call_variant(target, method, args).ok()
}

// ============================================================================
// Statistics
// ============================================================================

pub(crate) fn record_heap_marshal() {
    HEAP_MARSHALS.fetch_add(1, Ordering::Relaxed);
}

/// Dispatch counters for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub calls: u64,
    pub failed_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub heap_marshals: u64,
}

pub fn dispatch_stats() -> DispatchStats {
    DispatchStats {
        calls: CALLS.load(Ordering::Relaxed),
        failed_calls: FAILED_CALLS.load(Ordering::Relaxed),
        cache_hits: METHOD_CACHE.hits(),
        cache_misses: METHOD_CACHE.misses(),
        heap_marshals: HEAP_MARSHALS.load(Ordering::Relaxed),
    }
}
