//! Call paths into the runtime
//!
//! - `dispatch`: name-addressed method calls with a per-(class, method) cache
//! - `vararg`: receiver-less utility functions
//! - `callable`: invocable references in both directions
//! - `pointers`: fixed-arity pointer arrays shared by every path

pub mod callable;
pub mod dispatch;
pub mod pointers;
pub mod vararg;

pub use callable::{Callable, HostClosure};
pub use dispatch::{dispatch_stats, method_cache, DispatchStats, MethodBind, MethodCache};
pub use pointers::{with_pointers, RawPointers, MAX_INLINE_ARGS};
pub use vararg::{call_variadic, utility, UtilityFunction};
