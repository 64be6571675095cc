//! Object handles and typed class wrappers
//!
//! Design: `Object` owns exactly one runtime reference:
//! - Retained on clone, released on drop
//! - Created from a pointer the runtime handed over (`from_owned_ptr`) or
//!   one it merely lent (`from_borrowed_ptr`)
//!
//! The runtime is thread-safe, so handles are `Send + Sync`. The bridge
//! does not serialize access to a receiver; two threads calling into the
//! same object race exactly as they would inside the runtime.
//!
//! Typed wrappers (`Node`) call through resolved binds with `ptrcall`:
//! arguments travel as pointers to native layouts, never as variants.

use crate::call::dispatch::{self, MethodBind};
use crate::call::pointers::MAX_INLINE_ARGS;
use crate::core::convert::{ToVariant, VariantStorable};
use crate::core::string_name::StringName;
use crate::core::variant::Variant;
use crate::sys::{self, ObjectPtr};
use core::ffi::c_void;
use core::ptr::NonNull;
use smallvec::SmallVec;
use std::fmt;

pub struct Object {
    ptr: NonNull<c_void>,
}

// The runtime reference-counts and locks objects itself.
unsafe impl Send for Object {}
unsafe impl Sync for Object {}

impl Object {
    /// Construct an instance of `class`; `None` for an unknown class
    pub fn new(class: &StringName) -> Option<Object> {
        unsafe {
            let raw = (sys::interface().classdb_construct_object)(class.as_ptr());
            Self::from_owned_ptr(raw)
        }
    }

    /// Adopt a reference the runtime transferred to us
    ///
    /// # Safety
    /// `ptr` must be null or an object pointer whose reference the caller owns.
    #[inline]
    pub unsafe fn from_owned_ptr(ptr: ObjectPtr) -> Option<Object> {
        NonNull::new(ptr).map(|ptr| Object { ptr })
    }

    /// Take a new reference to an object the runtime lent us
    ///
    /// # Safety
    /// `ptr` must be null or a live object pointer.
    pub unsafe fn from_borrowed_ptr(ptr: ObjectPtr) -> Option<Object> {
        let ptr = NonNull::new(ptr)?;
        (sys::interface().object_retain)(ptr.as_ptr());
        Some(Object { ptr })
    }

    #[inline]
    pub fn as_ptr(&self) -> ObjectPtr {
        self.ptr.as_ptr()
    }

    pub fn class_name(&self) -> StringName {
        unsafe { StringName::from_uninit(|dst| (sys::interface().object_get_class_name)(self.as_ptr(), dst)) }
    }

    pub fn instance_id(&self) -> u64 {
        unsafe { (sys::interface().object_get_instance_id)(self.as_ptr()) }
    }

    /// Dynamic call by name; `None` when unresolved or rejected
    pub fn call(&self, method: &StringName, args: &[Variant]) -> Option<Variant> {
        let refs: SmallVec<[&Variant; MAX_INLINE_ARGS]> = args.iter().collect();
        dispatch::call(self, method, &refs)
    }

    pub fn call_typed<R: VariantStorable>(&self, method: &StringName, args: &[&dyn ToVariant]) -> Option<R> {
        dispatch::call_typed(self, method, args)
    }

    /// Whether the runtime class of this object is `class` or inherits it
    pub fn is_class(&self, class: &str) -> bool {
        self.call_typed::<bool>(StringName::cached("is_class"), &[&class])
            .unwrap_or(false)
    }

    /// Checked downcast to a typed wrapper
    pub fn cast<T: ClassWrapper>(self) -> Option<T> {
        self.is_class(T::CLASS_NAME).then(|| T::from_object(self))
    }
}

impl Clone for Object {
    fn clone(&self) -> Self {
        unsafe { (sys::interface().object_retain)(self.as_ptr()) };
        Object { ptr: self.ptr }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        unsafe { (sys::interface().object_release)(self.as_ptr()) }
    }
}

/// Same instance
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class_name(), self.instance_id())
    }
}

/// Typed view of a runtime class
pub trait ClassWrapper: Sized {
    const CLASS_NAME: &'static str;

    /// Wrap without checking; see `Object::cast` for the checked path
    fn from_object(object: Object) -> Self;

    fn as_object(&self) -> &Object;
}

// ============================================================================
// Node
// ============================================================================

/// Where `add_child` places an internal child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i64)]
pub enum InternalMode {
    #[default]
    Disabled = 0,
    Front = 1,
    Back = 2,
}

impl InternalMode {
    #[inline]
    pub const fn raw_value(self) -> i64 {
        self as i64
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Node(Object);

impl ClassWrapper for Node {
    const CLASS_NAME: &'static str = "Node";

    #[inline]
    fn from_object(object: Object) -> Self {
        Node(object)
    }

    #[inline]
    fn as_object(&self) -> &Object {
        &self.0
    }
}

#[inline]
fn ptr_of<T>(value: &T) -> *const c_void {
    value as *const T as *const c_void
}

fn node_bind(method: &'static str) -> MethodBind {
    let class = StringName::cached(Node::CLASS_NAME);
    match dispatch::resolve_in(class, StringName::cached(method)) {
        Some(bind) => bind,
        None => panic!("runtime class Node has no method {}", method),
    }
}

impl Node {
    /// New detached node
    ///
    /// Panics when the runtime has no `Node` class.
    pub fn new() -> Node {
        match Object::new(StringName::cached(Self::CLASS_NAME)) {
            Some(object) => Node(object),
            None => panic!("runtime cannot construct Node"),
        }
    }

    #[inline]
    pub fn upcast(self) -> Object {
        self.0
    }

    /// Dynamic call by name
    pub fn call(&self, method: &StringName, args: &[Variant]) -> Option<Variant> {
        self.0.call(method, args)
    }

    #[inline]
    unsafe fn ptrcall(&self, method: &'static str, args: &[*const c_void], ret: *mut c_void) {
        dispatch::ptrcall(&self.0, node_bind(method), args, ret);
    }

    pub fn add_child(&self, child: &Node) {
        self.add_child_with(child, false, InternalMode::Disabled);
    }

    pub fn add_child_with(&self, child: &Node, force_readable_name: bool, internal: InternalMode) {
        let child = child.0.as_ptr();
        let force = force_readable_name as u8;
        let internal = internal.raw_value();
        unsafe {
            self.ptrcall(
                "add_child",
                &[ptr_of(&child), ptr_of(&force), ptr_of(&internal)],
                core::ptr::null_mut(),
            )
        }
    }

    pub fn remove_child(&self, child: &Node) {
        let child = child.0.as_ptr();
        unsafe { self.ptrcall("remove_child", &[ptr_of(&child)], core::ptr::null_mut()) }
    }

    /// Children, not counting internal ones
    pub fn get_child_count(&self) -> i64 {
        let include_internal = 0u8;
        let mut count = 0i64;
        unsafe {
            self.ptrcall(
                "get_child_count",
                &[ptr_of(&include_internal)],
                &mut count as *mut i64 as *mut c_void,
            )
        }
        count
    }

    /// Child at `index`; negative indices count from the end
    pub fn get_child(&self, index: i64) -> Option<Node> {
        let include_internal = 0u8;
        let mut child: ObjectPtr = core::ptr::null_mut();
        unsafe {
            self.ptrcall(
                "get_child",
                &[ptr_of(&index), ptr_of(&include_internal)],
                &mut child as *mut ObjectPtr as *mut c_void,
            );
            Object::from_owned_ptr(child).map(Node)
        }
    }

    pub fn get_parent(&self) -> Option<Node> {
        let mut parent: ObjectPtr = core::ptr::null_mut();
        unsafe {
            self.ptrcall("get_parent", &[], &mut parent as *mut ObjectPtr as *mut c_void);
            Object::from_owned_ptr(parent).map(Node)
        }
    }

    pub fn get_name(&self) -> StringName {
        // Overwritten in place; interned names hold no reference to release
        let mut name = StringName::default();
        unsafe { self.ptrcall("get_name", &[], name.as_mut_ptr()) };
        name
    }

    pub fn set_name(&self, name: impl Into<StringName>) {
        let name = name.into();
        unsafe { self.ptrcall("set_name", &[name.as_ptr()], core::ptr::null_mut()) }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({:?})", self.0)
    }
}

impl From<Node> for Object {
    fn from(node: Node) -> Object {
        node.0
    }
}

impl ToVariant for Node {
    #[inline]
    fn to_variant(&self) -> Variant {
        self.0.to_variant()
    }
}

impl VariantStorable for Node {
    fn from_variant(variant: &Variant) -> Option<Self> {
        Object::from_variant(variant)?.cast()
    }
}

impl From<Node> for Variant {
    fn from(node: Node) -> Variant {
        node.to_variant()
    }
}
