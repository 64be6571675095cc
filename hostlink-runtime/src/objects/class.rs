//! Class database - single-inheritance class table
//!
//! Lookups walk the parent chain; the first class defining a method wins,
//! so subclasses may shadow inherited methods.

use super::bind::MethodBind;
use super::node;
use crate::logging::{log_class_registered, log_method_registered, log_runtime_init};
use crate::names::Name;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

static CLASSES: Lazy<ClassDb> = Lazy::new(ClassDb::with_builtins);

/// Global class database
#[inline]
pub fn classdb() -> &'static ClassDb {
    &CLASSES
}

/// Class registration failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    AlreadyRegistered(Name),
    ParentNotFound(Name),
    ClassNotFound(Name),
    MethodExists(Name),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered(n) => write!(f, "class {} already registered", n),
            Self::ParentNotFound(n) => write!(f, "parent class {} not found", n),
            Self::ClassNotFound(n) => write!(f, "class {} not found", n),
            Self::MethodExists(n) => write!(f, "method {} already defined", n),
        }
    }
}

impl std::error::Error for RegisterError {}

/// One class entry
pub struct ClassInfo {
    name: Name,
    parent: Option<&'static ClassInfo>,
    methods: RwLock<HashMap<Name, &'static MethodBind>>,
}

impl ClassInfo {
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<&'static ClassInfo> {
        self.parent
    }

    /// Resolve a method, walking up the inheritance chain
    pub fn find_method(&self, method: Name) -> Option<&'static MethodBind> {
        let mut class = Some(self);
        while let Some(c) = class {
            if let Some(bind) = c.methods.read().get(&method) {
                return Some(*bind);
            }
            class = c.parent;
        }
        None
    }

    /// Check whether this class is `other` or derives from it
    pub fn is_a(&self, other: Name) -> bool {
        let mut class = Some(self);
        while let Some(c) = class {
            if c.name == other {
                return true;
            }
            class = c.parent;
        }
        false
    }

    /// Add a method defined directly on this class
    pub fn add_method(&self, bind: MethodBind) -> Result<&'static MethodBind, RegisterError> {
        let mut methods = self.methods.write();
        if methods.contains_key(&bind.name()) {
            return Err(RegisterError::MethodExists(bind.name()));
        }
        log_method_registered(self.name.as_str(), bind.name().as_str());
        let bind: &'static MethodBind = Box::leak(Box::new(bind));
        methods.insert(bind.name(), bind);
        Ok(bind)
    }

    /// Number of methods defined directly on this class
    pub fn own_method_count(&self) -> usize {
        self.methods.read().len()
    }
}

/// Class table keyed by interned name
pub struct ClassDb {
    classes: DashMap<Name, &'static ClassInfo>,
}

impl ClassDb {
    fn with_builtins() -> Self {
        let db = Self { classes: DashMap::with_capacity(64) };

        let object = db.insert(Name::intern("Object"), None);
        node::register_object_methods(object);

        db.insert(Name::intern("RefCounted"), Some(object));

        let node_class = db.insert(Name::intern("Node"), Some(object));
        node::register_node_methods(node_class);

        log_runtime_init(db.classes.len());
        db
    }

    fn insert(&self, name: Name, parent: Option<&'static ClassInfo>) -> &'static ClassInfo {
        let info: &'static ClassInfo = Box::leak(Box::new(ClassInfo {
            name,
            parent,
            methods: RwLock::new(HashMap::new()),
        }));
        self.classes.insert(name, info);
        info
    }

    #[inline]
    pub fn get(&self, name: Name) -> Option<&'static ClassInfo> {
        self.classes.get(&name).map(|c| *c)
    }

    /// Register a new class deriving from `parent`
    pub fn register(&self, name: Name, parent: Name) -> Result<&'static ClassInfo, RegisterError> {
        let parent_info = self.get(parent).ok_or(RegisterError::ParentNotFound(parent))?;

        match self.classes.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegisterError::AlreadyRegistered(name)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let info: &'static ClassInfo = Box::leak(Box::new(ClassInfo {
                    name,
                    parent: Some(parent_info),
                    methods: RwLock::new(HashMap::new()),
                }));
                slot.insert(info);
                log_class_registered(name.as_str(), parent.as_str());
                Ok(info)
            }
        }
    }

    /// Add a method to an existing class
    pub fn register_method(&self, class: Name, bind: MethodBind) -> Result<&'static MethodBind, RegisterError> {
        let info = self.get(class).ok_or(RegisterError::ClassNotFound(class))?;
        info.add_method(bind)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
