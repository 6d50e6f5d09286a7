//! Core `Value` type: two machine words that hold any boxable payload.
//!
//! # Memory Layout
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │        ext (64 bits)         │        ptr (pointer)         │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! The pointer word is inspected first. If it is null the value is nil; if it points inside
//! a private five-byte static block it is one of the scalar kinds and `ext` holds the raw
//! bits. Any other pointer is a real pointer, and the low byte of `ext` says what it points at.
//!
//! | `ptr`                 | `ext` low byte | Kind                 | rest of `ext`                 |
//! |-----------------------|----------------|----------------------|-------------------------------|
//! | null                  | -              | nil                  | 0                             |
//! | bool sentinel         | -              | bool                 | 0 or 1                        |
//! | int sentinel          | -              | signed integer       | two's complement bits         |
//! | uint sentinel         | -              | unsigned integer     | raw bits                      |
//! | float sentinel        | -              | float                | IEEE-754 bits                 |
//! | custom sentinel       | -              | opaque 64-bit        | raw bits                      |
//! | first byte of text    | 1              | inline string        | length, 16-bit tag            |
//! | first byte of buffer  | 2              | inline bytes         | length, spare capacity        |
//! | data pointer          | 3              | erased (inline)      | descriptor address            |
//! | `Arc` record pointer  | 4              | erased (record)      | -                             |
//!
//! Strings, byte buffers and inline erased values borrow the caller's storage for `'a`.
//! Records are reference counted: clones share them and the last drop frees them.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt::{self, Debug, Display, Formatter};
use core::marker::PhantomData;
use core::ptr;

use crate::erased::{ErasedPtr, ErasedRecord};
use crate::inline::{self, PTR_TAG_MASK};
use crate::trace;
use crate::{
    Descriptor, DescriptorRegistry, Erasable, Erased, ErasedKind, EscapeConfig, TaggedString,
};

/// Backing storage for the scalar sentinels. Only the addresses matter.
static SENTINELS: [u8; 5] = [0; 5];

/// Scalar kinds identified by a sentinel address in the pointer word.
#[repr(usize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Sentinel {
    Bool = 0,
    Int = 1,
    Uint = 2,
    Float = 3,
    CustomBits = 4,
}

impl Sentinel {
    #[inline]
    fn ptr(self) -> *const u8 {
        SENTINELS.as_ptr().wrapping_add(self as usize)
    }

    #[inline]
    fn from_ptr(p: *const u8) -> Option<Self> {
        match p.addr().wrapping_sub(SENTINELS.as_ptr().addr()) {
            0 => Some(Sentinel::Bool),
            1 => Some(Sentinel::Int),
            2 => Some(Sentinel::Uint),
            3 => Some(Sentinel::Float),
            4 => Some(Sentinel::CustomBits),
            _ => None,
        }
    }
}

/// Low byte of the extension word for non-primitive values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PtrTag {
    /// Inline string
    String = 1,
    /// Inline byte buffer
    Bytes = 2,
    /// Descriptor address packed next to a data pointer
    Erased = 3,
    /// Pointer to a shared [`ErasedRecord`]
    ErasedRecord = 4,
}

impl From<u64> for PtrTag {
    fn from(ext: u64) -> Self {
        match ext & PTR_TAG_MASK {
            1 => PtrTag::String,
            2 => PtrTag::Bytes,
            3 => PtrTag::Erased,
            4 => PtrTag::ErasedRecord,
            _ => unreachable!(),
        }
    }
}

/// The observable kind of a [`Value`].
///
/// Strings and byte buffers report [`ValueKind::String`] and [`ValueKind::Bytes`] whichever
/// encoding they ended up in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    /// No value
    Nil,
    /// Boolean
    Bool,
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    Uint,
    /// 64-bit float
    Float,
    /// Opaque 64-bit payload
    CustomBits,
    /// UTF-8 string
    String,
    /// Byte buffer
    Bytes,
    /// Any other [`Erasable`] value
    Erased,
}

/// The physical encoding used by a [`Value`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Nil or a scalar stored in the extension word
    Primitive,
    /// Borrowed string with length and tag in the extension word
    InlineString,
    /// Borrowed byte buffer with length and spare capacity in the extension word
    InlineBytes,
    /// Data pointer plus descriptor address packed in the extension word
    ErasedInline,
    /// Pointer to a shared record holding the descriptor and data
    ErasedRecord,
}

/// A two-word boxed value.
///
/// `Value` holds nil, a scalar, a borrowed string or byte buffer, or a reference to any
/// [`Erasable`] value, and is exactly two machine words on 64-bit targets. Construction never
/// fails and every `to_*` accessor returns a value: see the conversion methods for the
/// fallback rules.
#[repr(C)]
pub struct Value<'a> {
    ext: u64,
    ptr: *const u8,
    marker: PhantomData<&'a ()>,
}

#[cfg(target_pointer_width = "64")]
static_assertions::assert_eq_size!(Value<'static>, [usize; 2]);
static_assertions::assert_impl_all!(Value<'static>: Send, Sync, Clone, Default);

// Safety: scalars and borrowed slices are plain data, erased payloads are `Erasable` and
// therefore `Sync`, and records are shared through an atomic reference count.
unsafe impl Send for Value<'_> {}
unsafe impl Sync for Value<'_> {}

impl Value<'static> {
    /// The nil value.
    pub const NIL: Self = Value {
        ext: 0,
        ptr: ptr::null(),
        marker: PhantomData,
    };
}

impl<'a> Value<'a> {
    // === Scalar constructors ===

    #[inline]
    fn scalar(sentinel: Sentinel, bits: u64) -> Self {
        Self {
            ext: bits,
            ptr: sentinel.ptr(),
            marker: PhantomData,
        }
    }

    /// Nil.
    #[inline]
    pub const fn nil() -> Self {
        Self {
            ext: 0,
            ptr: ptr::null(),
            marker: PhantomData,
        }
    }

    /// Boxes a boolean.
    #[inline]
    pub fn bool(b: bool) -> Self {
        Self::scalar(Sentinel::Bool, b as u64)
    }

    /// Boxes a signed integer.
    #[inline]
    pub fn i64(v: i64) -> Self {
        Self::scalar(Sentinel::Int, v as u64)
    }

    /// Boxes an unsigned integer.
    #[inline]
    pub fn u64(v: u64) -> Self {
        Self::scalar(Sentinel::Uint, v)
    }

    /// Boxes a float. NaN payloads are preserved bit for bit.
    #[inline]
    pub fn f64(v: f64) -> Self {
        Self::scalar(Sentinel::Float, v.to_bits())
    }

    /// Boxes an opaque 64-bit payload. Conversions treat it as an unsigned integer.
    #[inline]
    pub fn custom_bits(bits: u64) -> Self {
        Self::scalar(Sentinel::CustomBits, bits)
    }

    // === Strings and bytes ===

    /// Borrows a string.
    pub fn string(s: &'a str) -> Self {
        Self::text(s, 0, Descriptor::STRING)
    }

    /// Borrows a string and attaches a 16-bit tag, readable back with [`Value::tag`].
    pub fn string_with_tag(s: &'a str, tag: u16) -> Self {
        Self::text(s, tag, Descriptor::TAGGED_STRING)
    }

    fn text(s: &'a str, tag: u16, descriptor: &'static Descriptor) -> Self {
        if inline::string_fits(s.len()) && !EscapeConfig::current().force_string_escape {
            return Self {
                ext: inline::pack_string(s.len(), tag),
                ptr: inline::slice_ptr(s.as_bytes()),
                marker: PhantomData,
            };
        }
        trace!(len = s.len(), tag, "string takes the erased record path");
        Self::record(descriptor, ErasedPtr::slice(s.as_bytes(), tag as u64))
    }

    /// Borrows a byte buffer.
    pub fn bytes(b: &'a [u8]) -> Self {
        Self::bytes_with_spare(b, 0)
    }

    /// Borrows a byte buffer, recording how much spare capacity follows it.
    pub fn bytes_with_spare(b: &'a [u8], spare: usize) -> Self {
        if inline::bytes_fit(b.len(), spare) && !EscapeConfig::current().force_string_escape {
            return Self {
                ext: inline::pack_bytes(b.len(), spare),
                ptr: inline::slice_ptr(b),
                marker: PhantomData,
            };
        }
        trace!(len = b.len(), spare, "bytes take the erased record path");
        Self::record(Descriptor::BYTES, ErasedPtr::slice(b, spare as u64))
    }

    // === Erased values ===

    /// Boxes any [`Erasable`] value.
    ///
    /// Scalars, `String`, `&'static str`, `Vec<u8>` and `()` are recognized and stored in
    /// their native encoding. Everything else takes the erased path, see [`Value::erased`].
    pub fn any<T: Erasable>(value: &'a T) -> Self {
        let any: &'a dyn core::any::Any = value;

        macro_rules! recognize {
            ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {$(
                if let Some($v) = any.downcast_ref::<$ty>() {
                    return $body;
                }
            )*};
        }

        recognize!(
            bool => |v| Self::bool(*v),
            i8 => |v| Self::from(*v),
            i16 => |v| Self::from(*v),
            i32 => |v| Self::from(*v),
            i64 => |v| Self::i64(*v),
            isize => |v| Self::from(*v),
            u8 => |v| Self::from(*v),
            u16 => |v| Self::from(*v),
            u32 => |v| Self::from(*v),
            u64 => |v| Self::u64(*v),
            usize => |v| Self::from(*v),
            f32 => |v| Self::from(*v),
            f64 => |v| Self::f64(*v),
            String => |v| Self::string(v.as_str()),
            &'static str => |v| Self::string(*v),
            Vec<u8> => |v| Self::from(v),
            () => |_v| Self::nil(),
        );

        Self::erased(value)
    }

    /// Boxes `value` through the erased path, registering its descriptor globally.
    pub fn erased<T: Erasable>(value: &'a T) -> Self {
        Self::erased_in(value, DescriptorRegistry::global())
    }

    /// Boxes `value` through the erased path, registering its descriptor in `registry`.
    ///
    /// `String`, `&'static str` and `Vec<u8>` always land in a shared record that keeps them
    /// text or bytes, so predicates and conversions see the exact payload.
    pub fn erased_in<T: Erasable>(value: &'a T, registry: &DescriptorRegistry) -> Self {
        let any: &'a dyn core::any::Any = value;
        if let Some(s) = any.downcast_ref::<String>() {
            return Self::record(Descriptor::STRING, ErasedPtr::slice(s.as_bytes(), 0));
        }
        if let Some(s) = any.downcast_ref::<&'static str>() {
            return Self::record(Descriptor::STRING, ErasedPtr::slice(s.as_bytes(), 0));
        }
        if let Some(b) = any.downcast_ref::<Vec<u8>>() {
            let spare = (b.capacity() - b.len()) as u64;
            return Self::record(Descriptor::BYTES, ErasedPtr::slice(b, spare));
        }
        Self::escape(Descriptor::of::<T>(), ErasedPtr::from_ref(value), registry)
    }

    fn escape(
        descriptor: &'static Descriptor,
        data: ErasedPtr,
        registry: &DescriptorRegistry,
    ) -> Self {
        let addr = ptr::from_ref(descriptor).expose_provenance();
        if descriptor.kind() == ErasedKind::Other
            && inline::descriptor_fits(addr)
            && !EscapeConfig::current().force_erased_record
        {
            registry.register(descriptor);
            return Self {
                ext: inline::pack_descriptor(addr),
                ptr: data.data.cast(),
                marker: PhantomData,
            };
        }
        trace!(
            type_name = descriptor.type_name(),
            "value takes the erased record path"
        );
        Self::record(descriptor, data)
    }

    fn record(descriptor: &'static Descriptor, data: ErasedPtr) -> Self {
        let record = Arc::new(ErasedRecord {
            descriptor,
            ptr: data,
        });
        Self {
            ext: PtrTag::ErasedRecord as u64,
            ptr: Arc::into_raw(record).cast(),
            marker: PhantomData,
        }
    }

    /// Re-boxes a decoded erased payload, keeping its kind, tag and spare capacity.
    pub(crate) fn from_erased(erased: Erased<'a>) -> Self {
        let (descriptor, data) = erased.parts();
        match descriptor.kind() {
            ErasedKind::String | ErasedKind::TaggedString | ErasedKind::Bytes => {
                Self::record(descriptor, data)
            }
            ErasedKind::Other => Self::escape(descriptor, data, DescriptorRegistry::global()),
        }
    }

    // === Discriminant ===

    #[inline]
    fn sentinel(&self) -> Option<Sentinel> {
        Sentinel::from_ptr(self.ptr)
    }

    #[inline]
    fn ptr_tag(&self) -> Option<PtrTag> {
        if self.is_primitive() {
            None
        } else {
            Some(PtrTag::from(self.ext))
        }
    }

    /// Returns `true` for nil and the scalar kinds.
    #[inline]
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.ptr.is_null() || self.sentinel().is_some()
    }

    /// Returns the physical encoding of this value.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self.ptr_tag() {
            None => Encoding::Primitive,
            Some(PtrTag::String) => Encoding::InlineString,
            Some(PtrTag::Bytes) => Encoding::InlineBytes,
            Some(PtrTag::Erased) => Encoding::ErasedInline,
            Some(PtrTag::ErasedRecord) => Encoding::ErasedRecord,
        }
    }

    /// Returns the observable kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        if self.ptr.is_null() {
            return ValueKind::Nil;
        }
        if let Some(sentinel) = self.sentinel() {
            return match sentinel {
                Sentinel::Bool => ValueKind::Bool,
                Sentinel::Int => ValueKind::Int,
                Sentinel::Uint => ValueKind::Uint,
                Sentinel::Float => ValueKind::Float,
                Sentinel::CustomBits => ValueKind::CustomBits,
            };
        }
        match PtrTag::from(self.ext) {
            PtrTag::String => ValueKind::String,
            PtrTag::Bytes => ValueKind::Bytes,
            PtrTag::Erased => ValueKind::Erased,
            PtrTag::ErasedRecord => match self.record_ref().descriptor.kind() {
                ErasedKind::String | ErasedKind::TaggedString => ValueKind::String,
                ErasedKind::Bytes => ValueKind::Bytes,
                ErasedKind::Other => ValueKind::Erased,
            },
        }
    }

    /// Only valid when the pointer tag is `ErasedRecord`.
    #[inline]
    fn record_ref(&self) -> &ErasedRecord {
        debug_assert_eq!(self.ptr_tag(), Some(PtrTag::ErasedRecord));
        // Safety: the record is kept alive by the reference this value holds.
        unsafe { &*self.ptr.cast::<ErasedRecord>() }
    }

    /// Returns `true` if this is nil.
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.ptr.is_null()
    }

    /// Returns `true` if this is a boolean.
    #[inline]
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.sentinel() == Some(Sentinel::Bool)
    }

    /// Returns `true` if this is a signed integer.
    #[inline]
    #[must_use]
    pub fn is_int(&self) -> bool {
        self.sentinel() == Some(Sentinel::Int)
    }

    /// Returns `true` if this is an unsigned integer.
    #[inline]
    #[must_use]
    pub fn is_uint(&self) -> bool {
        self.sentinel() == Some(Sentinel::Uint)
    }

    /// Returns `true` if this is a float.
    #[inline]
    #[must_use]
    pub fn is_float(&self) -> bool {
        self.sentinel() == Some(Sentinel::Float)
    }

    /// Returns `true` if this is a signed integer, unsigned integer or float.
    #[inline]
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(
            self.sentinel(),
            Some(Sentinel::Int | Sentinel::Uint | Sentinel::Float)
        )
    }

    /// Returns `true` if this is an opaque 64-bit payload.
    #[inline]
    #[must_use]
    pub fn is_custom_bits(&self) -> bool {
        self.sentinel() == Some(Sentinel::CustomBits)
    }

    /// Returns `true` if this is a string, inline or not.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }

    /// Returns `true` if this is a byte buffer, inline or not.
    #[must_use]
    pub fn is_bytes(&self) -> bool {
        self.kind() == ValueKind::Bytes
    }

    /// Returns `true` if this holds an erased value other than a string or byte buffer.
    #[must_use]
    pub fn is_erased(&self) -> bool {
        self.kind() == ValueKind::Erased
    }

    /// Tag attached with [`Value::string_with_tag`], or 0.
    #[must_use]
    pub fn tag(&self) -> u16 {
        match self.ptr_tag() {
            Some(PtrTag::String) => inline::unpack_tag(self.ext),
            Some(PtrTag::ErasedRecord) => self.erased_view().tag().unwrap_or(0),
            _ => 0,
        }
    }

    /// Length plus recorded spare capacity of a byte buffer.
    #[must_use]
    pub fn bytes_capacity(&self) -> Option<usize> {
        match self.ptr_tag() {
            Some(PtrTag::Bytes) => {
                Some(inline::unpack_len(self.ext) + inline::unpack_spare(self.ext))
            }
            Some(PtrTag::ErasedRecord) => {
                let erased = self.erased_view();
                Some(erased.as_bytes()?.len() + erased.spare_capacity()?)
            }
            _ => None,
        }
    }

    // === Strict accessors ===

    /// The boolean, if this is one.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.is_bool().then_some(self.ext != 0)
    }

    /// The signed integer, if this is one.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.is_int().then_some(self.ext as i64)
    }

    /// The unsigned integer, if this is one.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.is_uint().then_some(self.ext)
    }

    /// The float, if this is one.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.is_float().then_some(f64::from_bits(self.ext))
    }

    /// The opaque payload, if this is one.
    #[inline]
    #[must_use]
    pub fn as_custom_bits(&self) -> Option<u64> {
        self.is_custom_bits().then_some(self.ext)
    }

    /// The string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self.ptr_tag()? {
            PtrTag::String => {
                let len = inline::unpack_len(self.ext);
                // Safety: built from a `&'a str` of exactly this length.
                Some(unsafe {
                    core::str::from_utf8_unchecked(core::slice::from_raw_parts(self.ptr, len))
                })
            }
            PtrTag::ErasedRecord => self.erased_view().as_str(),
            _ => None,
        }
    }

    /// The string together with its tag, if this is a string.
    #[must_use]
    pub fn as_tagged_string(&self) -> Option<TaggedString<'a>> {
        let text = self.as_str()?;
        Some(TaggedString {
            tag: self.tag(),
            text,
        })
    }

    /// The byte buffer, if this is one.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.ptr_tag()? {
            PtrTag::Bytes => {
                let len = inline::unpack_len(self.ext);
                // Safety: built from a `&'a [u8]` of exactly this length.
                Some(unsafe { core::slice::from_raw_parts(self.ptr, len) })
            }
            PtrTag::ErasedRecord => self.erased_view().as_bytes(),
            _ => None,
        }
    }

    /// The erased payload, if this holds something other than a scalar, string or bytes.
    #[must_use]
    pub fn as_erased(&self) -> Option<Erased<'a>> {
        match self.ptr_tag()? {
            PtrTag::Erased | PtrTag::ErasedRecord => {
                let erased = self.erased_view();
                (erased.kind() == ErasedKind::Other).then_some(erased)
            }
            _ => None,
        }
    }

    /// Decodes either erased encoding. Never allocates.
    pub(crate) fn erased_view(&self) -> Erased<'a> {
        match self.ptr_tag() {
            Some(PtrTag::Erased) => {
                let addr = inline::unpack_descriptor(self.ext);
                // Safety: the address was exposed from a `&'static Descriptor` in `escape`.
                let descriptor = unsafe { &*ptr::with_exposed_provenance::<Descriptor>(addr) };
                Erased::new(descriptor, ErasedPtr::thin(self.ptr.cast()))
            }
            _ => {
                let record = self.record_ref();
                Erased::new(record.descriptor, record.ptr)
            }
        }
    }
}

impl Clone for Value<'_> {
    fn clone(&self) -> Self {
        if self.ptr_tag() == Some(PtrTag::ErasedRecord) {
            // Safety: the pointer came from `Arc::into_raw` and this value owns a count.
            unsafe { Arc::increment_strong_count(self.ptr.cast::<ErasedRecord>()) };
        }
        Self {
            ext: self.ext,
            ptr: self.ptr,
            marker: PhantomData,
        }
    }
}

impl Drop for Value<'_> {
    fn drop(&mut self) {
        if self.ptr_tag() == Some(PtrTag::ErasedRecord) {
            // Safety: the pointer came from `Arc::into_raw` and this value owns a count.
            drop(unsafe { Arc::from_raw(self.ptr.cast::<ErasedRecord>()) });
        }
    }
}

impl Default for Value<'_> {
    fn default() -> Self {
        Self::nil()
    }
}

impl Debug for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.unbox(), f)
    }
}

impl Display for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

// === From ===

macro_rules! from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value<'_> {
            fn from(v: $ty) -> Self {
                Self::i64(v as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value<'_> {
            fn from(v: $ty) -> Self {
                Self::u64(v as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::bool(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Self::f64(v as f64)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::f64(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Self::string(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Self {
        Self::string(s.as_str())
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(b: &'a Vec<u8>) -> Self {
        Self::bytes_with_spare(b.as_slice(), b.capacity() - b.len())
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::nil(),
        }
    }
}
