//! Call error reporting - C-compatible error record
//!
//! The runtime never unwinds across the ABI; every failing call fills a
//! `CallErrorRaw` and leaves the result buffer holding Nil.

use crate::variant::VariantType;

/// Error codes written into `CallErrorRaw::error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CallErrorKind {
    Ok = 0,
    InvalidMethod = 1,
    InvalidArgument = 2,
    TooManyArguments = 3,
    TooFewArguments = 4,
    InstanceIsNull = 5,
    MethodNotConst = 6,
}

/// Error record shared with the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct CallErrorRaw {
    pub error: u32,
    pub argument: i32,
    pub expected: i32,
}

impl CallErrorRaw {
    pub const OK: CallErrorRaw = CallErrorRaw { error: 0, argument: 0, expected: 0 };

    #[inline]
    pub const fn new(kind: CallErrorKind, argument: i32, expected: i32) -> Self {
        Self { error: kind as u32, argument, expected }
    }

    #[inline]
    pub const fn invalid_method() -> Self {
        Self::new(CallErrorKind::InvalidMethod, 0, 0)
    }

    #[inline]
    pub const fn invalid_argument(argument: usize, expected: VariantType) -> Self {
        Self::new(CallErrorKind::InvalidArgument, argument as i32, expected as i32)
    }

    #[inline]
    pub const fn too_many(expected: usize) -> Self {
        Self::new(CallErrorKind::TooManyArguments, 0, expected as i32)
    }

    #[inline]
    pub const fn too_few(expected: usize) -> Self {
        Self::new(CallErrorKind::TooFewArguments, 0, expected as i32)
    }

    #[inline]
    pub const fn instance_is_null() -> Self {
        Self::new(CallErrorKind::InstanceIsNull, 0, 0)
    }

    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.error == CallErrorKind::Ok as u32
    }

    /// Store into a caller-provided slot (null slots are ignored)
    ///
    /// # Safety
    /// `slot` must be null or valid for writes.
    #[inline]
    pub unsafe fn store(self, slot: *mut CallErrorRaw) {
        if let Some(slot) = slot.as_mut() {
            *slot = self;
        }
    }
}

/// Result type used by method implementations
pub type CallResult<T> = Result<T, CallErrorRaw>;
