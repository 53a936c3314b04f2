//! Supporting utility type.
mod bytestr;
pub use bytestr::ByteStr;

/// Trace when `verbose` feature enabled.
macro_rules! verbose {
    ($($tt:tt)*) => {
        #[cfg(feature = "verbose")]
        tracing::trace!($($tt)*)
    };
}

/// Create and enter `Span` when `verbose` feature enabled.
macro_rules! span {
    ($($tt:tt)*) => {
        #[cfg(feature = "verbose")]
        let s = tracing::trace_span!($($tt)*);
        #[cfg(feature = "verbose")]
        let _s = s.enter();
    };
}

/// Generate `From` implementation into the given error type.
macro_rules! from {
    ($target:ty: <$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for $target {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

/// Implement `Display`, `Debug` and `Error` for an error type using
/// its `Display` implementation as the `Debug` output.
macro_rules! display_error {
    ($ty:ty) => {
        impl std::error::Error for $ty { }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "\"{self}\"")
            }
        }
    };
}

pub(crate) use verbose;
pub(crate) use span;
pub(crate) use from;
pub(crate) use display_error;
