//! Builtin methods for `Object` and `Node`
//!
//! Arguments arrive already validated and defaulted by the bind layer.

use super::bind::{DefaultArg, MethodBind, Param};
use super::class::ClassInfo;
use super::{ChildEntry, ObjectData};
use crate::error::{CallErrorRaw, CallResult};
use crate::names::Name;
use crate::variant::{Value, VariantType};
use std::sync::{Arc, Weak};

const NO_PARAMS: &[Param] = &[];

const IS_CLASS_PARAMS: &[Param] = &[Param::required(VariantType::String)];

const ADD_CHILD_PARAMS: &[Param] = &[
    Param::required(VariantType::Object),
    Param::optional(VariantType::Bool, DefaultArg::Bool(false)),
    Param::optional(VariantType::Int, DefaultArg::Int(0)),
];

const REMOVE_CHILD_PARAMS: &[Param] = &[Param::required(VariantType::Object)];

const GET_CHILD_COUNT_PARAMS: &[Param] = &[Param::optional(VariantType::Bool, DefaultArg::Bool(false))];

const GET_CHILD_PARAMS: &[Param] = &[
    Param::required(VariantType::Int),
    Param::optional(VariantType::Bool, DefaultArg::Bool(false)),
];

const SET_NAME_PARAMS: &[Param] = &[Param::required(VariantType::StringName)];

/// Internal-mode values accepted by `add_child`
const INTERNAL_MODE_FRONT: i64 = 1;

pub(super) fn register_object_methods(class: &'static ClassInfo) {
    let methods = [
        MethodBind::native("get_class", NO_PARAMS, VariantType::String, get_class),
        MethodBind::native("is_class", IS_CLASS_PARAMS, VariantType::Bool, is_class),
        MethodBind::native("get_instance_id", NO_PARAMS, VariantType::Int, get_instance_id),
    ];
    for bind in methods {
        let _ = class.add_method(bind);
    }
}

pub(super) fn register_node_methods(class: &'static ClassInfo) {
    let methods = [
        MethodBind::native("add_child", ADD_CHILD_PARAMS, VariantType::Nil, add_child),
        MethodBind::native("remove_child", REMOVE_CHILD_PARAMS, VariantType::Nil, remove_child),
        MethodBind::native("get_child_count", GET_CHILD_COUNT_PARAMS, VariantType::Int, get_child_count),
        MethodBind::native("get_child", GET_CHILD_PARAMS, VariantType::Object, get_child),
        MethodBind::native("get_parent", NO_PARAMS, VariantType::Object, get_parent),
        MethodBind::native("get_name", NO_PARAMS, VariantType::StringName, get_name),
        MethodBind::native("set_name", SET_NAME_PARAMS, VariantType::Nil, set_name),
    ];
    for bind in methods {
        let _ = class.add_method(bind);
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn object_arg(args: &[Value], index: usize) -> CallResult<Arc<ObjectData>> {
    match args.get(index) {
        Some(Value::Object(obj)) => Ok(obj.clone()),
        _ => Err(CallErrorRaw::invalid_argument(index, VariantType::Object)),
    }
}

fn bool_arg(args: &[Value], index: usize) -> bool {
    matches!(args.get(index), Some(Value::Bool(true)))
}

fn int_arg(args: &[Value], index: usize) -> CallResult<i64> {
    match args.get(index) {
        Some(Value::Int(i)) => Ok(*i),
        _ => Err(CallErrorRaw::invalid_argument(index, VariantType::Int)),
    }
}

fn node_class() -> Name {
    Name::intern("Node")
}

// ============================================================================
// Object
// ============================================================================

fn get_class(this: &Arc<ObjectData>, _args: &[Value]) -> CallResult<Value> {
    Ok(Value::string(this.class().name().as_str()))
}

fn is_class(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::Bool(this.class().is_a(Name::intern(s)))),
        _ => Err(CallErrorRaw::invalid_argument(0, VariantType::String)),
    }
}

fn get_instance_id(this: &Arc<ObjectData>, _args: &[Value]) -> CallResult<Value> {
    Ok(Value::Int(this.id() as i64))
}

// ============================================================================
// Node
// ============================================================================

fn add_child(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    let child = object_arg(args, 0)?;
    let force_readable_name = bool_arg(args, 1);
    let internal = int_arg(args, 2)?;

    if Arc::ptr_eq(this, &child) || !child.class().is_a(node_class()) {
        return Err(CallErrorRaw::invalid_argument(0, VariantType::Object));
    }
    if child.state().parent.upgrade().is_some() {
        return Err(CallErrorRaw::invalid_argument(0, VariantType::Object));
    }

    // Reject cycles: the child may not be one of our ancestors
    let mut ancestor = this.state().parent.upgrade();
    while let Some(node) = ancestor {
        if Arc::ptr_eq(&node, &child) {
            return Err(CallErrorRaw::invalid_argument(0, VariantType::Object));
        }
        ancestor = node.state().parent.upgrade();
    }

    {
        let mut child_state = child.state();
        child_state.parent = Arc::downgrade(this);
        if force_readable_name && child_state.name.is_none() {
            let readable = format!("@{}@{}", child.class().name(), child.id());
            child_state.name = Some(Name::intern(&readable));
        }
    }

    let entry = ChildEntry { node: child, internal: internal != 0 };
    let mut state = this.state();
    if internal == INTERNAL_MODE_FRONT {
        state.children.insert(0, entry);
    } else {
        state.children.push(entry);
    }
    Ok(Value::Nil)
}

fn remove_child(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    let child = object_arg(args, 0)?;

    let removed = {
        let mut state = this.state();
        match state.children.iter().position(|c| Arc::ptr_eq(&c.node, &child)) {
            Some(index) => Some(state.children.remove(index)),
            None => None,
        }
    };

    match removed {
        Some(entry) => {
            entry.node.state().parent = Weak::new();
            Ok(Value::Nil)
        }
        None => Err(CallErrorRaw::invalid_argument(0, VariantType::Object)),
    }
}

fn get_child_count(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    let include_internal = bool_arg(args, 0);
    let state = this.state();
    let count = state.children.iter().filter(|c| include_internal || !c.internal).count();
    Ok(Value::Int(count as i64))
}

fn get_child(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    let index = int_arg(args, 0)?;
    let include_internal = bool_arg(args, 1);

    let state = this.state();
    let visible: Vec<&ChildEntry> = state
        .children
        .iter()
        .filter(|c| include_internal || !c.internal)
        .collect();

    let resolved = if index < 0 { visible.len() as i64 + index } else { index };
    match usize::try_from(resolved).ok().and_then(|i| visible.get(i)) {
        Some(entry) => Ok(Value::Object(entry.node.clone())),
        None => Ok(Value::Nil),
    }
}

fn get_parent(this: &Arc<ObjectData>, _args: &[Value]) -> CallResult<Value> {
    match this.state().parent.upgrade() {
        Some(parent) => Ok(Value::Object(parent)),
        None => Ok(Value::Nil),
    }
}

fn get_name(this: &Arc<ObjectData>, _args: &[Value]) -> CallResult<Value> {
    let name = this.state().name.unwrap_or_else(|| this.class().name());
    Ok(Value::StringName(name))
}

fn set_name(this: &Arc<ObjectData>, args: &[Value]) -> CallResult<Value> {
    match args.first() {
        Some(Value::StringName(name)) => {
            this.state().name = Some(*name);
            Ok(Value::Nil)
        }
        _ => Err(CallErrorRaw::invalid_argument(0, VariantType::StringName)),
    }
}
