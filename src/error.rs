//! Error types for the non-optional surfaces of the bridge
//!
//! Conversions, dispatch and vararg calls report failure as `None`; the
//! enums below back initialization, configuration, class registration and
//! the `try_*` call variants that want the reason.

use crate::core::variant::VariantType;
use crate::sys::types::CallErrorRaw;
use thiserror::Error;

/// Errors raised while installing the ABI table
#[derive(Debug, Error)]
pub enum InitError {
    /// The loader returned null for a required entry point
    #[error("entry point '{0}' not provided by the runtime")]
    MissingSymbol(&'static str),

    /// The runtime has no native-layout constructor for a kind the bridge needs
    #[error("runtime has no {direction} constructor for {kind:?}")]
    MissingConstructor {
        kind: VariantType,
        direction: &'static str,
    },

    /// A different loader was already installed
    #[error("bridge already initialized with a different runtime")]
    AlreadyInitialized,

    /// A different runtime library is already mapped
    #[error("runtime library '{loaded}' already loaded, cannot switch to '{requested}'")]
    LibraryMismatch { loaded: String, requested: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("symbol '{symbol}': {source}")]
    Symbol {
        symbol: String,
        #[source]
        source: SymbolError,
    },
}

/// Dynamic library loading errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("invalid library name")]
    InvalidName,

    #[error("failed to load library: {0}")]
    LoadFailed(String),
}

/// Symbol lookup errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    #[error("invalid symbol name")]
    InvalidName,

    #[error("symbol not found")]
    NotFound,
}

/// Why a call produced no result
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    /// Unknown method, or the runtime rejected the identifier
    #[error("invalid method")]
    InvalidMethod,

    #[error("invalid argument {argument}: expected {expected:?}")]
    InvalidArgument { argument: i32, expected: VariantType },

    #[error("too many arguments: expected {expected}")]
    TooManyArguments { expected: i32 },

    #[error("too few arguments: expected {expected}")]
    TooFewArguments { expected: i32 },

    #[error("instance is null")]
    InstanceIsNull,

    #[error("method is not const")]
    MethodNotConst,

    /// The runtime reported an error code this bridge does not know
    #[error("unknown call error code {0}")]
    Unknown(u32),
}

impl CallError {
    /// Decode the runtime's error record
    pub fn from_raw(raw: CallErrorRaw) -> Result<(), CallError> {
        Err(match raw.error {
            CallErrorRaw::OK => return Ok(()),
            CallErrorRaw::INVALID_METHOD => CallError::InvalidMethod,
            CallErrorRaw::INVALID_ARGUMENT => CallError::InvalidArgument {
                argument: raw.argument,
                expected: u32::try_from(raw.expected)
                    .ok()
                    .and_then(VariantType::from_raw)
                    .unwrap_or(VariantType::Nil),
            },
            CallErrorRaw::TOO_MANY_ARGUMENTS => CallError::TooManyArguments { expected: raw.expected },
            CallErrorRaw::TOO_FEW_ARGUMENTS => CallError::TooFewArguments { expected: raw.expected },
            CallErrorRaw::INSTANCE_IS_NULL => CallError::InstanceIsNull,
            CallErrorRaw::METHOD_NOT_CONST => CallError::MethodNotConst,
            other => CallError::Unknown(other),
        })
    }

    /// Encode for the runtime (used by the callable trampoline)
    pub fn to_raw(self) -> CallErrorRaw {
        match self {
            CallError::InvalidMethod | CallError::Unknown(_) => CallErrorRaw::new(CallErrorRaw::INVALID_METHOD, 0, 0),
            CallError::InvalidArgument { argument, expected } => {
                CallErrorRaw::new(CallErrorRaw::INVALID_ARGUMENT, argument, expected as i32)
            }
            CallError::TooManyArguments { expected } => CallErrorRaw::new(CallErrorRaw::TOO_MANY_ARGUMENTS, 0, expected),
            CallError::TooFewArguments { expected } => CallErrorRaw::new(CallErrorRaw::TOO_FEW_ARGUMENTS, 0, expected),
            CallError::InstanceIsNull => CallErrorRaw::new(CallErrorRaw::INSTANCE_IS_NULL, 0, 0),
            CallError::MethodNotConst => CallErrorRaw::new(CallErrorRaw::METHOD_NOT_CONST, 0, 0),
        }
    }
}

/// Host class registration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Unknown parent or duplicate class name
    #[error("runtime rejected class '{class}' (parent '{parent}')")]
    ClassRejected { class: String, parent: String },

    /// Duplicate method or unknown class
    #[error("runtime rejected method '{class}::{method}'")]
    MethodRejected { class: String, method: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
