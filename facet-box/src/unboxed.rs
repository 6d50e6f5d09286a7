//! Destructuring a [`Value`] into an ordinary enum.

use crate::{Encoding, Erased, ErasedKind, Value};

/// A decoded [`Value`], borrowing whatever the value borrowed.
///
/// Strings and byte buffers decode to slices whichever encoding they were stored in; their
/// tag and spare capacity are not part of the decoded form.
#[derive(Debug, Clone, Copy)]
pub enum Unboxed<'a> {
    /// No value
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Float
    Float(f64),
    /// Opaque 64-bit payload
    CustomBits(u64),
    /// String
    String(&'a str),
    /// Byte buffer
    Bytes(&'a [u8]),
    /// Any other erased value
    Erased(Erased<'a>),
}

impl<'a> Value<'a> {
    /// Decodes the value. Never allocates.
    pub fn unbox(&self) -> Unboxed<'a> {
        if self.is_nil() {
            return Unboxed::Nil;
        }
        if let Some(b) = self.as_bool() {
            return Unboxed::Bool(b);
        }
        if let Some(v) = self.as_i64() {
            return Unboxed::Int(v);
        }
        if let Some(v) = self.as_u64() {
            return Unboxed::Uint(v);
        }
        if let Some(v) = self.as_f64() {
            return Unboxed::Float(v);
        }
        if let Some(v) = self.as_custom_bits() {
            return Unboxed::CustomBits(v);
        }
        match self.encoding() {
            Encoding::InlineString => Unboxed::String(self.as_str().unwrap_or_default()),
            Encoding::InlineBytes => Unboxed::Bytes(self.as_bytes().unwrap_or_default()),
            _ => {
                let erased = self.erased_view();
                match erased.kind() {
                    ErasedKind::String | ErasedKind::TaggedString => {
                        Unboxed::String(erased.as_str().unwrap_or_default())
                    }
                    ErasedKind::Bytes => Unboxed::Bytes(erased.as_bytes().unwrap_or_default()),
                    ErasedKind::Other => Unboxed::Erased(erased),
                }
            }
        }
    }
}

impl<'a> From<Unboxed<'a>> for Value<'a> {
    fn from(unboxed: Unboxed<'a>) -> Self {
        match unboxed {
            Unboxed::Nil => Value::nil(),
            Unboxed::Bool(b) => Value::bool(b),
            Unboxed::Int(v) => Value::i64(v),
            Unboxed::Uint(v) => Value::u64(v),
            Unboxed::Float(v) => Value::f64(v),
            Unboxed::CustomBits(v) => Value::custom_bits(v),
            Unboxed::String(s) => Value::string(s),
            Unboxed::Bytes(b) => Value::bytes(b),
            Unboxed::Erased(e) => Value::from_erased(e),
        }
    }
}

impl<'a> From<Erased<'a>> for Value<'a> {
    fn from(erased: Erased<'a>) -> Self {
        Value::from_erased(erased)
    }
}
