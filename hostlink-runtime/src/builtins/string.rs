//! String builtin methods (variant-level only; String has no fixed native layout)

use crate::error::{CallErrorRaw, CallResult};
use crate::variant::{Value, VariantType};

pub fn call(base: &str, method: &str, args: &[Value]) -> CallResult<Value> {
    match (method, args) {
        ("length", []) => Ok(Value::Int(base.chars().count() as i64)),
        ("to_upper", []) => Ok(Value::string(&base.to_uppercase())),
        ("to_lower", []) => Ok(Value::string(&base.to_lowercase())),
        ("begins_with", [Value::String(prefix)]) => Ok(Value::Bool(base.starts_with(prefix.as_str()))),
        ("begins_with", [_]) => Err(CallErrorRaw::invalid_argument(0, VariantType::String)),
        ("length" | "to_upper" | "to_lower", _) => Err(CallErrorRaw::too_many(0)),
        ("begins_with", []) => Err(CallErrorRaw::too_few(1)),
        ("begins_with", _) => Err(CallErrorRaw::too_many(1)),
        _ => Err(CallErrorRaw::invalid_method()),
    }
}
