//! Host-defined classes - registering classes and methods with the runtime
//!
//! A registered method is a host callable. The runtime prepends the
//! receiver as argument 0; the builder peels it off and hands the method
//! body an `Object` plus the caller's arguments. Arity is declared up
//! front and checked by the runtime, never here.

use crate::call::callable::Callable;
use crate::core::convert::{ToVariant, VariantStorable};
use crate::core::string_name::StringName;
use crate::core::variant::Variant;
use crate::error::RegistrationError;
use crate::logging::{info, trace};
use crate::object::Object;
use crate::sys;
use std::sync::Arc;

pub type MethodFn = dyn Fn(&Object, &[&Variant]) -> Option<Variant> + Send + Sync;

/// Arity accepted by `varargs_method`
pub const ANY_ARITY: i64 = -1;

struct MethodEntry {
    name: StringName,
    argc: i64,
    body: Arc<MethodFn>,
}

/// Collects a class definition and registers it in one step
pub struct ClassBuilder {
    name: StringName,
    parent: StringName,
    methods: Vec<MethodEntry>,
}

impl ClassBuilder {
    /// New class deriving from `Object` until `inherits` says otherwise
    pub fn new(name: impl Into<StringName>) -> Self {
        Self { name: name.into(), parent: StringName::new("Object"), methods: Vec::new() }
    }

    pub fn inherits(mut self, parent: impl Into<StringName>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Method taking exactly `argc` arguments after the receiver
    pub fn method<F>(mut self, name: impl Into<StringName>, argc: i64, body: F) -> Self
    where
        F: Fn(&Object, &[&Variant]) -> Option<Variant> + Send + Sync + 'static,
    {
        self.methods.push(MethodEntry { name: name.into(), argc, body: Arc::new(body) });
        self
    }

    pub fn varargs_method<F>(self, name: impl Into<StringName>, body: F) -> Self
    where
        F: Fn(&Object, &[&Variant]) -> Option<Variant> + Send + Sync + 'static,
    {
        self.method(name, ANY_ARITY, body)
    }

    pub fn name(&self) -> &StringName {
        &self.name
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Register the class, then each method in declaration order
    ///
    /// Stops at the first rejection; methods registered before it stay.
    pub fn register(self) -> Result<(), RegistrationError> {
        let accepted =
            unsafe { (sys::interface().classdb_register_class)(self.name.as_ptr(), self.parent.as_ptr()) };
        if accepted == 0 {
            return Err(RegistrationError::ClassRejected {
                class: self.name.to_string(),
                parent: self.parent.to_string(),
            });
        }

        for entry in &self.methods {
            let callable = method_callable(&self.name, entry).to_variant();
            let accepted = unsafe {
                (sys::interface().classdb_register_method)(
                    self.name.as_ptr(),
                    entry.name.as_ptr(),
                    callable.as_ptr(),
                    entry.argc,
                )
            };
            if accepted == 0 {
                return Err(RegistrationError::MethodRejected {
                    class: self.name.to_string(),
                    method: entry.name.to_string(),
                });
            }
            trace!(target: "registry", class = %self.name, method = %entry.name, argc = entry.argc, "method registered");
        }

        info!(
            target: "registry",
            class = %self.name,
            parent = %self.parent,
            methods = self.methods.len(),
            "class registered"
        );
        Ok(())
    }
}

fn method_callable(class: &StringName, entry: &MethodEntry) -> Callable {
    let body = entry.body.clone();
    Callable::from_fn(format!("{}::{}", class, entry.name), move |args| {
        let (receiver, rest) = args.split_first()?;
        let receiver = Object::from_variant(receiver)?;
        body(&receiver, rest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::init;

    fn sum_body(_: &Object, args: &[&Variant]) -> Option<Variant> {
        let mut total = 0i64;
        for arg in args {
            total += arg.to_native::<i64>()?;
        }
        Some(Variant::from(total))
    }

    #[test]
    fn test_register_and_call() {
        init();
        ClassBuilder::new("RegistryAdder")
            .inherits("Node")
            .method("add", 2, sum_body)
            .varargs_method("sum", sum_body)
            .method("whoami", 0, |receiver, _| Some(Variant::from(receiver.clone())))
            .register()
            .unwrap();

        let object = Object::new(&StringName::new("RegistryAdder")).unwrap();
        assert!(object.is_class("Node"));

        let add = StringName::new("add");
        let result = object.call(&add, &[Variant::from(4i64), Variant::from(5i64)]);
        assert_eq!(result.and_then(|v| v.to_native::<i64>()), Some(9));

        // Arity is the runtime's check
        assert!(object.call(&add, &[Variant::from(4i64)]).is_none());

        let sum = StringName::new("sum");
        let args: Vec<Variant> = (1..=12i64).map(Variant::from).collect();
        assert_eq!(object.call(&sum, &args).and_then(|v| v.to_native::<i64>()), Some(78));
        assert_eq!(object.call(&sum, &[]).and_then(|v| v.to_native::<i64>()), Some(0));

        let me = object.call(&StringName::new("whoami"), &[]).unwrap();
        assert_eq!(me.to_native::<Object>(), Some(object.clone()));
    }

    #[test]
    fn test_inherited_methods_still_resolve() {
        init();
        ClassBuilder::new("RegistryChild").inherits("Node").register().unwrap();
        let object = Object::new(&StringName::new("RegistryChild")).unwrap();
        let count = object.call(&StringName::new("get_child_count"), &[Variant::from(false)]);
        assert_eq!(count.and_then(|v| v.to_native::<i64>()), Some(0));
    }

    #[test]
    fn test_rejections() {
        init();
        let orphan = ClassBuilder::new("RegistryOrphan").inherits("NoSuchParent").register();
        assert!(matches!(orphan, Err(RegistrationError::ClassRejected { .. })));

        ClassBuilder::new("RegistryOnce").register().unwrap();
        let again = ClassBuilder::new("RegistryOnce").register();
        assert!(matches!(again, Err(RegistrationError::ClassRejected { .. })));

        let twice = ClassBuilder::new("RegistryTwice")
            .method("m", 0, |_, _| None)
            .method("m", 0, |_, _| None)
            .register();
        match twice {
            Err(RegistrationError::MethodRejected { class, method }) => {
                assert_eq!(class, "RegistryTwice");
                assert_eq!(method, "m");
            }
            other => panic!("expected method rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_accessors() {
        init();
        let builder = ClassBuilder::new("RegistryUnregistered")
            .method("a", 0, |_, _| None)
            .varargs_method("b", |_, _| None);
        assert_eq!(builder.method_count(), 2);
        assert_eq!(builder.name().to_string(), "RegistryUnregistered");
    }
}
