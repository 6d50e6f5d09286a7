//! Best-effort conversions between every kind a [`Value`] can hold.
//!
//! Every `to_*` accessor is total. A matching kind is decoded directly; scalars convert with
//! `as` semantics; strings and byte buffers are parsed strictly; erased values are asked for
//! the matching capability and, failing that, their rendered text is parsed. When nothing
//! works the result is `false`, `0` or NaN.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};

use crate::{Erased, Unboxed, Value};

impl<'a> Value<'a> {
    /// Converts to a boolean.
    ///
    /// Nonzero numbers are `true`, NaN is `false`. Strings accept `1`, `t`, `T`, `TRUE`,
    /// `true`, `True` and their `false` counterparts.
    pub fn to_bool(&self) -> bool {
        if let Some(b) = self.as_bool() {
            return b;
        }
        match self.unbox() {
            Unboxed::Nil => false,
            Unboxed::Bool(b) => b,
            Unboxed::Int(v) => v != 0,
            Unboxed::Uint(v) | Unboxed::CustomBits(v) => v != 0,
            Unboxed::Float(v) => v > 0.0 || v < 0.0,
            Unboxed::String(s) => parse_bool(s.as_bytes()).unwrap_or(false),
            Unboxed::Bytes(b) => parse_bool(b).unwrap_or(false),
            Unboxed::Erased(e) => from_erased(e, Erased::as_bool, parse_bool).unwrap_or(false),
        }
    }

    /// Converts to a signed integer. Floats saturate, unparsable input yields 0.
    pub fn to_i64(&self) -> i64 {
        if let Some(v) = self.as_i64() {
            return v;
        }
        match self.unbox() {
            Unboxed::Nil => 0,
            Unboxed::Bool(b) => b as i64,
            Unboxed::Int(v) => v,
            Unboxed::Uint(v) | Unboxed::CustomBits(v) => v as i64,
            Unboxed::Float(v) => v as i64,
            Unboxed::String(s) => parse_i64(s.as_bytes()).unwrap_or(0),
            Unboxed::Bytes(b) => parse_i64(b).unwrap_or(0),
            Unboxed::Erased(e) => from_erased(e, Erased::as_i64, parse_i64).unwrap_or(0),
        }
    }

    /// Converts to an unsigned integer. Floats saturate, unparsable input yields 0.
    pub fn to_u64(&self) -> u64 {
        if let Some(v) = self.as_u64() {
            return v;
        }
        match self.unbox() {
            Unboxed::Nil => 0,
            Unboxed::Bool(b) => b as u64,
            Unboxed::Int(v) => v as u64,
            Unboxed::Uint(v) | Unboxed::CustomBits(v) => v,
            Unboxed::Float(v) => v as u64,
            Unboxed::String(s) => parse_u64(s.as_bytes()).unwrap_or(0),
            Unboxed::Bytes(b) => parse_u64(b).unwrap_or(0),
            Unboxed::Erased(e) => from_erased(e, Erased::as_u64, parse_u64).unwrap_or(0),
        }
    }

    /// Converts to a float. Unparsable input yields NaN.
    pub fn to_f64(&self) -> f64 {
        if let Some(v) = self.as_f64() {
            return v;
        }
        match self.unbox() {
            Unboxed::Nil => 0.0,
            Unboxed::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Unboxed::Int(v) => v as f64,
            Unboxed::Uint(v) | Unboxed::CustomBits(v) => v as f64,
            Unboxed::Float(v) => v,
            Unboxed::String(s) => parse_f64(s.as_bytes()).unwrap_or(f64::NAN),
            Unboxed::Bytes(b) => parse_f64(b).unwrap_or(f64::NAN),
            Unboxed::Erased(e) => from_erased(e, Erased::as_f64, parse_f64).unwrap_or(f64::NAN),
        }
    }

    /// Converts to text.
    ///
    /// Strings are borrowed. Byte buffers are borrowed when they are valid UTF-8 and decoded
    /// lossily otherwise. Nil is the empty string.
    pub fn to_str(&self) -> Cow<'a, str> {
        match self.unbox() {
            Unboxed::Nil => Cow::Borrowed(""),
            Unboxed::Bool(b) => Cow::Borrowed(if b { "true" } else { "false" }),
            Unboxed::Int(v) => Cow::Owned(v.to_string()),
            Unboxed::Uint(v) | Unboxed::CustomBits(v) => Cow::Owned(v.to_string()),
            Unboxed::Float(v) => Cow::Owned(format_f64(v)),
            Unboxed::String(s) => Cow::Borrowed(s),
            Unboxed::Bytes(b) => String::from_utf8_lossy(b),
            Unboxed::Erased(e) => e.to_str(),
        }
    }

    /// Converts to bytes: the buffer itself, the bytes of a string, or the bytes of
    /// [`Value::to_str`].
    pub fn to_bytes(&self) -> Cow<'a, [u8]> {
        match self.unbox() {
            Unboxed::Bytes(b) => Cow::Borrowed(b),
            Unboxed::String(s) => Cow::Borrowed(s.as_bytes()),
            _ => match self.to_str() {
                Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
                Cow::Owned(s) => Cow::Owned(s.into_bytes()),
            },
        }
    }
}

macro_rules! narrow {
    ($($name:ident -> $ty:ty = $wide:ident),* $(,)?) => {
        impl Value<'_> {$(
            #[doc = concat!(
                "Converts to `", stringify!($ty), "` by truncating [`Value::", stringify!($wide), "`]."
            )]
            pub fn $name(&self) -> $ty {
                self.$wide() as $ty
            }
        )*}
    };
}

narrow!(
    to_i8 -> i8 = to_i64,
    to_i16 -> i16 = to_i64,
    to_i32 -> i32 = to_i64,
    to_isize -> isize = to_i64,
    to_u8 -> u8 = to_u64,
    to_u16 -> u16 = to_u64,
    to_u32 -> u32 = to_u64,
    to_usize -> usize = to_u64,
    to_f32 -> f32 = to_f64,
);

fn from_erased<'e, T>(
    erased: Erased<'e>,
    capability: fn(&Erased<'e>) -> Option<T>,
    parse: fn(&[u8]) -> Option<T>,
) -> Option<T> {
    capability(&erased).or_else(|| parse(erased.to_str().as_bytes()))
}

pub(crate) fn parse_bool(text: &[u8]) -> Option<bool> {
    match text {
        b"1" | b"t" | b"T" | b"TRUE" | b"true" | b"True" => Some(true),
        b"0" | b"f" | b"F" | b"FALSE" | b"false" | b"False" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_i64(text: &[u8]) -> Option<i64> {
    core::str::from_utf8(text).ok()?.parse().ok()
}

pub(crate) fn parse_u64(text: &[u8]) -> Option<u64> {
    core::str::from_utf8(text).ok()?.parse().ok()
}

/// Finite text that overflows to an infinity is out of range, not infinite.
pub(crate) fn parse_f64(text: &[u8]) -> Option<f64> {
    let text = core::str::from_utf8(text).ok()?;
    let v: f64 = text.parse().ok()?;
    if v.is_infinite() {
        let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
        if !unsigned.eq_ignore_ascii_case("inf") && !unsigned.eq_ignore_ascii_case("infinity") {
            return None;
        }
    }
    Some(v)
}

/// Shortest decimal that round-trips, never in exponent form.
pub(crate) fn format_f64(v: f64) -> String {
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    v.to_string()
}
