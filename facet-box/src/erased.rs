//! Type-erased payloads: the [`Erasable`] capability trait, per-type [`Descriptor`]s, and the
//! [`Erased`] view handed back when a value is decoded.
//!
//! A descriptor plays the role of a vtable. Each `Erasable` type gets exactly one descriptor
//! per monomorphization, built at compile time from an associated const, in the same way
//! `Facet::SHAPE` is built for reflected types. Strings, byte buffers and tagged strings that
//! are pushed onto the escape path use three built-in descriptors whose vtable entries read a
//! `(pointer, length)` pair instead of a sized value.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt::{self, Debug, Display, Formatter};
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::inline;

/// A value that can be boxed through the type-erased escape path.
///
/// [`render`](Erasable::render) supplies the textual form of the value. Every other method
/// is an optional capability: returning `None` means the type has no such conversion, and
/// the conversion engine falls back to parsing the rendered text instead.
///
/// ```
/// use core::fmt;
/// use facet_box::{Erasable, Value};
///
/// #[derive(Debug)]
/// struct Celsius(f64);
///
/// impl Erasable for Celsius {
///     fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}°C", self.0)
///     }
///     fn as_f64(&self) -> Option<f64> {
///         Some(self.0)
///     }
/// }
///
/// let temp = Celsius(21.5);
/// let v = Value::any(&temp);
/// assert_eq!(v.to_f64(), 21.5);
/// assert_eq!(v.to_string(), "21.5°C");
/// ```
pub trait Erasable: Debug + Sync + 'static {
    /// Writes the textual form of the value. Defaults to the `Debug` representation.
    fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }

    /// Boolean capability.
    fn as_bool(&self) -> Option<bool> {
        None
    }

    /// Signed integer capability.
    fn as_i64(&self) -> Option<i64> {
        None
    }

    /// Unsigned integer capability.
    fn as_u64(&self) -> Option<u64> {
        None
    }

    /// Floating point capability.
    fn as_f64(&self) -> Option<f64> {
        None
    }
}

macro_rules! erasable_int {
    ($($ty:ty),* $(,)?) => {$(
        impl Erasable for $ty {
            fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(self, f)
            }
            fn as_bool(&self) -> Option<bool> {
                Some(*self != 0)
            }
            fn as_i64(&self) -> Option<i64> {
                Some(*self as i64)
            }
            fn as_u64(&self) -> Option<u64> {
                Some(*self as u64)
            }
            fn as_f64(&self) -> Option<f64> {
                Some(*self as f64)
            }
        }
    )*};
}

erasable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! erasable_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Erasable for $ty {
            fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(self, f)
            }
            fn as_bool(&self) -> Option<bool> {
                Some(*self > 0.0 || *self < 0.0)
            }
            fn as_i64(&self) -> Option<i64> {
                Some(*self as i64)
            }
            fn as_u64(&self) -> Option<u64> {
                Some(*self as u64)
            }
            fn as_f64(&self) -> Option<f64> {
                Some(*self as f64)
            }
        }
    )*};
}

erasable_float!(f32, f64);

impl Erasable for bool {
    fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
    fn as_bool(&self) -> Option<bool> {
        Some(*self)
    }
    fn as_i64(&self) -> Option<i64> {
        Some(*self as i64)
    }
    fn as_u64(&self) -> Option<u64> {
        Some(*self as u64)
    }
    fn as_f64(&self) -> Option<f64> {
        Some(if *self { 1.0 } else { 0.0 })
    }
}

impl Erasable for () {
    fn render(&self, _f: &mut Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl Erasable for String {
    fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

impl Erasable for &'static str {
    fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

impl Erasable for Vec<u8> {
    fn render(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&String::from_utf8_lossy(self), f)
    }
}

/// What an erased payload is, as far as the conversion engine is concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErasedKind {
    /// A string that did not fit (or was not allowed) inline
    String,
    /// A byte buffer that did not fit (or was not allowed) inline
    Bytes,
    /// A string carrying a 16-bit tag, see [`TaggedString`]
    TaggedString,
    /// Any other [`Erasable`] value
    Other,
}

/// A string paired with a 16-bit tag.
///
/// Inline strings keep their tag in the extension word; when a tagged string is pushed onto
/// the escape path it travels as a `TaggedString` record instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaggedString<'a> {
    /// Caller-supplied tag
    pub tag: u16,
    /// The string itself
    pub text: &'a str,
}

/// Type-erased reference to a payload.
///
/// Sized payloads only use `data`. Slices also use `len`; `extra` holds the tag of a tagged
/// string or the spare capacity of a byte buffer.
#[derive(Debug, Copy, Clone)]
pub(crate) struct ErasedPtr {
    pub(crate) data: *const (),
    pub(crate) len: usize,
    pub(crate) extra: u64,
}

impl ErasedPtr {
    #[inline]
    pub(crate) fn from_ref<T>(value: &T) -> Self {
        // Zero-sized values may live at any address, sentinel block included.
        let data = if size_of::<T>() == 0 {
            NonNull::<T>::dangling().as_ptr().cast_const().cast()
        } else {
            (value as *const T).cast()
        };
        Self::thin(data)
    }

    #[inline]
    pub(crate) const fn thin(data: *const ()) -> Self {
        Self {
            data,
            len: 0,
            extra: 0,
        }
    }

    #[inline]
    pub(crate) fn slice(bytes: &[u8], extra: u64) -> Self {
        Self {
            data: inline::slice_ptr(bytes).cast(),
            len: bytes.len(),
            extra,
        }
    }

    /// Safety: `data` must point to a live `T` for `'a`.
    #[inline]
    unsafe fn get<'a, T>(self) -> &'a T {
        unsafe { &*self.data.cast::<T>() }
    }

    /// Safety: `(data, len)` must describe a live byte slice for `'a`.
    #[inline]
    unsafe fn bytes<'a>(self) -> &'a [u8] {
        unsafe { core::slice::from_raw_parts(self.data.cast::<u8>(), self.len) }
    }
}

/// Per-type function table used to operate on erased payloads.
#[derive(Copy, Clone)]
struct ErasedVTable {
    render: unsafe fn(ErasedPtr, &mut Formatter<'_>) -> fmt::Result,
    as_bool: unsafe fn(ErasedPtr) -> Option<bool>,
    as_i64: unsafe fn(ErasedPtr) -> Option<i64>,
    as_u64: unsafe fn(ErasedPtr) -> Option<u64>,
    as_f64: unsafe fn(ErasedPtr) -> Option<f64>,
}

/// Runtime metadata describing the dynamic type of an erased payload.
///
/// Descriptors are `'static`; obtain one with [`Descriptor::of`].
pub struct Descriptor {
    type_name: fn() -> &'static str,
    type_id: fn() -> TypeId,
    kind: ErasedKind,
    vtable: ErasedVTable,
}

trait Describe {
    const DESCRIPTOR: &'static Descriptor;
}

impl<T: Erasable> Describe for T {
    const DESCRIPTOR: &'static Descriptor = &Descriptor {
        type_name: core::any::type_name::<T>,
        type_id: TypeId::of::<T>,
        kind: ErasedKind::Other,
        vtable: ErasedVTable {
            render: render_sized::<T>,
            as_bool: as_bool_sized::<T>,
            as_i64: as_i64_sized::<T>,
            as_u64: as_u64_sized::<T>,
            as_f64: as_f64_sized::<T>,
        },
    };
}

unsafe fn render_sized<T: Erasable>(ptr: ErasedPtr, f: &mut Formatter<'_>) -> fmt::Result {
    unsafe { ptr.get::<T>() }.render(f)
}

unsafe fn as_bool_sized<T: Erasable>(ptr: ErasedPtr) -> Option<bool> {
    unsafe { ptr.get::<T>() }.as_bool()
}

unsafe fn as_i64_sized<T: Erasable>(ptr: ErasedPtr) -> Option<i64> {
    unsafe { ptr.get::<T>() }.as_i64()
}

unsafe fn as_u64_sized<T: Erasable>(ptr: ErasedPtr) -> Option<u64> {
    unsafe { ptr.get::<T>() }.as_u64()
}

unsafe fn as_f64_sized<T: Erasable>(ptr: ErasedPtr) -> Option<f64> {
    unsafe { ptr.get::<T>() }.as_f64()
}

unsafe fn render_str(ptr: ErasedPtr, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(unsafe { core::str::from_utf8_unchecked(ptr.bytes()) })
}

unsafe fn render_bytes(ptr: ErasedPtr, f: &mut Formatter<'_>) -> fmt::Result {
    Display::fmt(&String::from_utf8_lossy(unsafe { ptr.bytes() }), f)
}

// Slice payloads are parsed by the conversion engine directly, they expose no capabilities.
unsafe fn no_bool(_: ErasedPtr) -> Option<bool> {
    None
}

unsafe fn no_i64(_: ErasedPtr) -> Option<i64> {
    None
}

unsafe fn no_u64(_: ErasedPtr) -> Option<u64> {
    None
}

unsafe fn no_f64(_: ErasedPtr) -> Option<f64> {
    None
}

impl Descriptor {
    pub(crate) const STRING: &'static Descriptor = &Descriptor {
        type_name: core::any::type_name::<str>,
        type_id: TypeId::of::<str>,
        kind: ErasedKind::String,
        vtable: ErasedVTable {
            render: render_str,
            as_bool: no_bool,
            as_i64: no_i64,
            as_u64: no_u64,
            as_f64: no_f64,
        },
    };

    pub(crate) const BYTES: &'static Descriptor = &Descriptor {
        type_name: core::any::type_name::<[u8]>,
        type_id: TypeId::of::<[u8]>,
        kind: ErasedKind::Bytes,
        vtable: ErasedVTable {
            render: render_bytes,
            as_bool: no_bool,
            as_i64: no_i64,
            as_u64: no_u64,
            as_f64: no_f64,
        },
    };

    pub(crate) const TAGGED_STRING: &'static Descriptor = &Descriptor {
        type_name: core::any::type_name::<TaggedString<'static>>,
        type_id: TypeId::of::<TaggedString<'static>>,
        kind: ErasedKind::TaggedString,
        vtable: ErasedVTable {
            render: render_str,
            as_bool: no_bool,
            as_i64: no_i64,
            as_u64: no_u64,
            as_f64: no_f64,
        },
    };

    /// Returns the descriptor for `T`.
    #[inline]
    pub fn of<T: Erasable>() -> &'static Descriptor {
        <T as Describe>::DESCRIPTOR
    }

    /// Name of the described type, as reported by [`core::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// `TypeId` of the described type.
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// What kind of payload this descriptor describes.
    pub fn kind(&self) -> ErasedKind {
        self.kind
    }

    /// Returns `true` if this descriptor describes `T`.
    pub fn is<T: Erasable>(&self) -> bool {
        self.kind == ErasedKind::Other && self.type_id() == TypeId::of::<T>()
    }
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type_name", &self.type_name())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Heap record used by the slow escape path.
pub(crate) struct ErasedRecord {
    pub(crate) descriptor: &'static Descriptor,
    pub(crate) ptr: ErasedPtr,
}

/// A decoded, type-erased payload borrowed from a [`Value`](crate::Value).
///
/// Reconstructing an `Erased` never allocates, whichever escape path the value took.
#[derive(Copy, Clone)]
pub struct Erased<'a> {
    descriptor: &'static Descriptor,
    ptr: ErasedPtr,
    marker: PhantomData<&'a ()>,
}

// Safety: every payload reachable through an `Erased` is either a byte slice or an
// `Erasable` value, and `Erasable` requires `Sync`.
unsafe impl Send for Erased<'_> {}
unsafe impl Sync for Erased<'_> {}

impl<'a> Erased<'a> {
    #[inline]
    pub(crate) fn new(descriptor: &'static Descriptor, ptr: ErasedPtr) -> Self {
        Self {
            descriptor,
            ptr,
            marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn parts(&self) -> (&'static Descriptor, ErasedPtr) {
        (self.descriptor, self.ptr)
    }

    /// The descriptor of the payload.
    #[must_use]
    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    /// Name of the payload's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// What kind of payload this is.
    #[must_use]
    pub fn kind(&self) -> ErasedKind {
        self.descriptor.kind
    }

    /// Returns `true` if the payload is a `T`.
    #[must_use]
    pub fn is<T: Erasable>(&self) -> bool {
        self.descriptor.is::<T>()
    }

    /// Returns the payload as a `T`, if that is what it is.
    #[must_use]
    pub fn downcast_ref<T: Erasable>(&self) -> Option<&'a T> {
        if self.is::<T>() {
            Some(unsafe { self.ptr.get::<T>() })
        } else {
            None
        }
    }

    /// Returns the payload as a string if it is a (possibly tagged) string.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self.descriptor.kind {
            ErasedKind::String | ErasedKind::TaggedString => {
                Some(unsafe { core::str::from_utf8_unchecked(self.ptr.bytes()) })
            }
            _ => None,
        }
    }

    /// Returns the payload as bytes if it is a byte buffer.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.descriptor.kind {
            ErasedKind::Bytes => Some(unsafe { self.ptr.bytes() }),
            _ => None,
        }
    }

    /// Returns the payload as a [`TaggedString`] if it is one.
    #[must_use]
    pub fn as_tagged_string(&self) -> Option<TaggedString<'a>> {
        let tag = self.tag()?;
        let text = self.as_str()?;
        Some(TaggedString { tag, text })
    }

    /// Tag of a tagged string payload.
    #[must_use]
    pub fn tag(&self) -> Option<u16> {
        match self.descriptor.kind {
            ErasedKind::TaggedString => Some(self.ptr.extra as u16),
            _ => None,
        }
    }

    /// Spare capacity recorded for a byte buffer payload.
    pub(crate) fn spare_capacity(&self) -> Option<usize> {
        match self.descriptor.kind {
            ErasedKind::Bytes => Some(self.ptr.extra as usize),
            _ => None,
        }
    }

    /// Boolean capability of the payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        unsafe { (self.descriptor.vtable.as_bool)(self.ptr) }
    }

    /// Signed integer capability of the payload.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        unsafe { (self.descriptor.vtable.as_i64)(self.ptr) }
    }

    /// Unsigned integer capability of the payload.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        unsafe { (self.descriptor.vtable.as_u64)(self.ptr) }
    }

    /// Floating point capability of the payload.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        unsafe { (self.descriptor.vtable.as_f64)(self.ptr) }
    }

    /// Textual form of the payload, borrowed when it is already a string.
    #[must_use]
    pub fn to_str(&self) -> Cow<'a, str> {
        match self.descriptor.kind {
            ErasedKind::String | ErasedKind::TaggedString => {
                Cow::Borrowed(unsafe { core::str::from_utf8_unchecked(self.ptr.bytes()) })
            }
            ErasedKind::Bytes => String::from_utf8_lossy(unsafe { self.ptr.bytes() }),
            ErasedKind::Other => Cow::Owned(alloc::format!("{self}")),
        }
    }
}

impl Display for Erased<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        unsafe { (self.descriptor.vtable.render)(self.ptr, f) }
    }
}

impl Debug for Erased<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.descriptor.kind {
            ErasedKind::Other => f
                .debug_tuple("Erased")
                .field(&self.type_name())
                .field(&format_args!("{self}"))
                .finish(),
            ErasedKind::Bytes => Debug::fmt(self.as_bytes().unwrap_or_default(), f),
            ErasedKind::String => Debug::fmt(self.as_str().unwrap_or_default(), f),
            ErasedKind::TaggedString => match self.as_tagged_string() {
                Some(tagged) => Debug::fmt(&tagged, f),
                None => f.write_str("TaggedString"),
            },
        }
    }
}
