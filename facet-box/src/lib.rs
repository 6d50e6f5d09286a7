//! `facet-box` provides a two-word boxed value that can hold scalars, borrowed strings,
//! borrowed byte buffers, or any other value behind a type-erased reference.
//!
//! # Features
//!
//! - **Two-word `Value` type**: `Value` is exactly 16 bytes on 64-bit targets, whatever it holds
//! - **Allocation-free boxing**: scalars are stored inline, strings and bytes are borrowed
//! - **Type-erased escape hatch**: anything implementing [`Erasable`] can be boxed by reference
//! - **Total conversions**: every accessor returns a value; failed parses fall back to defaults
//!
//! # Design
//!
//! The pointer word either holds one of a handful of sentinel addresses (nil and the five
//! scalar kinds) or a real pointer. When it holds a real pointer, the low byte of the extension
//! word says what it points at: a string, a byte buffer, an erased value, or a shared erased
//! record. See the [`value`](Value) documentation for the full layout.
//!
//! ```
//! use facet_box::Value;
//!
//! let s = String::from("1234");
//! let v = Value::from(&s);
//! assert!(v.is_string());
//! assert_eq!(v.to_i64(), 1234);
//! assert_eq!(Value::f64(f64::NAN).to_bool(), false);
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]

extern crate alloc;

mod value;
pub use value::*;

mod inline;
pub use inline::{MAX_INLINE_LEN, MAX_INLINE_SPARE};

mod erased;
pub use erased::*;

mod registry;
pub use registry::*;

mod convert;

mod unboxed;
pub use unboxed::*;

mod config;
pub use config::*;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace, warn as warn_event};

#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
/// Forwards to tracing::warn when the tracing feature is enabled
macro_rules! warn_event {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
pub(crate) use {debug, trace, warn_event};
