//! Fixed-arity pointer arrays - argument lists without allocation
//!
//! Design: `RawPointers<N>` is exactly `N` raw pointers in C layout. The
//! `Option<NonNull>` niche encodes null as the zero address, so the array
//! can be handed to the runtime as `*const *const c_void` directly.
//!
//! `with_pointers` picks the cheapest representation for a list of any
//! length; only lists longer than `MAX_INLINE_ARGS` touch the heap.

use crate::call::dispatch::record_heap_marshal;
use crate::logging::log_heap_marshal;
use core::ffi::c_void;
use core::ptr::NonNull;

/// Longest argument list marshaled on the stack
pub const MAX_INLINE_ARGS: usize = 9;

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawPointers<const N: usize>([Option<NonNull<c_void>>; N]);

impl<const N: usize> RawPointers<N> {
    pub const LEN: usize = N;

    #[inline]
    pub const fn from_array(ptrs: [Option<NonNull<c_void>>; N]) -> Self {
        Self(ptrs)
    }

    /// Pointer `I`, bound-checked at compile time
    #[inline]
    pub const fn get<const I: usize>(&self) -> Option<NonNull<c_void>> {
        const { assert!(I < N, "pointer index out of bounds") };
        self.0[I]
    }

    #[inline]
    pub fn as_ptr(&self) -> *const *const c_void {
        self.0.as_ptr() as *const *const c_void
    }

    /// Fill from exactly `N` raw pointers
    #[inline]
    fn fill(ptrs: impl Iterator<Item = *const c_void>) -> Self {
        let mut out = [None; N];
        for (slot, ptr) in out.iter_mut().zip(ptrs) {
            *slot = NonNull::new(ptr as *mut c_void);
        }
        Self(out)
    }
}

macro_rules! raw_pointers {
    ($($alias:ident = $n:literal ($($arg:ident),+);)*) => {
        $(
            pub type $alias = RawPointers<$n>;

            const _: () = assert!(
                core::mem::size_of::<$alias>() == $n * core::mem::size_of::<*const c_void>()
            );

            impl RawPointers<$n> {
                #[inline]
                pub const fn new($($arg: Option<NonNull<c_void>>),+) -> Self {
                    Self([$($arg),+])
                }
            }
        )*

        /// Hand `f` an array view of `ptrs` and its length
        pub fn with_pointers<R>(
            ptrs: impl ExactSizeIterator<Item = *const c_void>,
            f: impl FnOnce(*const *const c_void, usize) -> R,
        ) -> R {
            let mut ptrs = ptrs;
            match ptrs.len() {
                0 => f(core::ptr::null(), 0),
                1 => {
                    let single = ptrs.next().unwrap_or(core::ptr::null());
                    f(&single, 1)
                }
                $($n => f(RawPointers::<$n>::fill(ptrs).as_ptr(), $n),)*
                len => {
                    log_heap_marshal(len);
                    record_heap_marshal();
                    let heap: Vec<*const c_void> = ptrs.collect();
                    f(heap.as_ptr(), heap.len())
                }
            }
        }
    };
}

raw_pointers! {
    RawPointersN2 = 2 (p0, p1);
    RawPointersN3 = 3 (p0, p1, p2);
    RawPointersN4 = 4 (p0, p1, p2, p3);
    RawPointersN5 = 5 (p0, p1, p2, p3, p4);
    RawPointersN6 = 6 (p0, p1, p2, p3, p4, p5);
    RawPointersN7 = 7 (p0, p1, p2, p3, p4, p5, p6);
    RawPointersN8 = 8 (p0, p1, p2, p3, p4, p5, p6, p7);
    RawPointersN9 = 9 (p0, p1, p2, p3, p4, p5, p6, p7, p8);
}
