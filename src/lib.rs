//! hostlink - value marshaling and dynamic call dispatch across a
//! C-style function-pointer ABI
//!
//! The bridge owns no values of its own: variants, names and objects are
//! runtime records behind fixed-size opaque buffers. Everything the runtime
//! exposes is reached through one table of entry points installed by
//! `initialize`.
//!
//! Layers, bottom up:
//! - `sys`: the entry point table and raw ABI types
//! - `core`: variants, names, conversions and `Vector3`
//! - `call`: pointer marshaling, method dispatch, utilities, callables
//! - `object` / `registry`: runtime objects and host-defined classes

pub mod call;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod object;
pub mod registry;
pub mod sys;

#[cfg(test)]
mod test_support;

pub use call::{call_variadic, utility, Callable, DispatchStats, MethodBind, UtilityFunction};
pub use config::{BridgeConfig, DispatchConfig, LogConfig};
pub use crate::core::{StringName, ToVariant, Variant, VariantStorable, VariantType, Vector3};
pub use error::{CallError, ConfigError, InitError, LoadError, RegistrationError, SymbolError};
pub use object::{ClassWrapper, InternalMode, Node, Object};
pub use registry::ClassBuilder;
pub use sys::{GetProcAddress, ProcAddress};

/// Install the runtime's entry points, configured from the environment
///
/// Installing the same loader again is a no-op; a different loader is
/// `InitError::AlreadyInitialized`.
pub fn initialize(get_proc_address: GetProcAddress) -> Result<(), InitError> {
    let config = config::current();
    logging::init_with_config(&config.log);
    sys::install(get_proc_address).map(|_| ())
}

/// Like `initialize`, with an explicit configuration
///
/// The first configuration installed in the process wins, including the
/// environment defaults a prior `initialize` settled on.
pub fn initialize_with_config(get_proc_address: GetProcAddress, config: BridgeConfig) -> Result<(), InitError> {
    let config = config::install(config);
    logging::init_with_config(&config.log);
    sys::install(get_proc_address).map(|_| ())
}

/// Load the runtime from a shared library exporting a `GetProcAddress` symbol
pub fn initialize_from_library(path: &str, symbol: &str) -> Result<(), InitError> {
    let config = config::current();
    logging::init_with_config(&config.log);
    sys::install_from_library(path, symbol).map(|_| ())
}

pub fn is_initialized() -> bool {
    sys::is_initialized()
}
