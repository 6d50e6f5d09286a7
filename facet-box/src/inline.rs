//! Bit packing for the extension word of non-primitive values.
//!
//! Strings and byte buffers are never copied: the pointer word points at the caller's first
//! byte and the extension word carries everything needed to rebuild the slice.
//!
//! ```text
//!  63                  32 31                   8 7          0
//! ┌──────────────────────┬──────────────────────┬────────────┐
//! │        length        │  tag / spare capacity │ pointer tag│
//! └──────────────────────┴──────────────────────┴────────────┘
//! ```
//!
//! - strings keep a caller-supplied 16-bit tag in bits 8–23
//! - byte buffers keep up to 23 bits of spare capacity in bits 8–30
//! - inline erased values keep the descriptor address in bits 8–63 instead

use core::ptr::NonNull;

use crate::value::PtrTag;

/// Longest string or byte buffer that can be boxed without taking the erased path.
pub const MAX_INLINE_LEN: usize = 0x7FFF_FFFF;

/// Largest spare capacity (beyond the length) that an inline byte buffer can record.
pub const MAX_INLINE_SPARE: usize = 0x7F_FFFF;

/// Mask selecting the pointer tag from the extension word.
pub(crate) const PTR_TAG_MASK: u64 = 0xFF;

const LEN_SHIFT: u32 = 32;
const META_SHIFT: u32 = 8;

/// Descriptor addresses must fit in the 56 bits above the pointer tag.
const DESCRIPTOR_LIMIT: u64 = 1 << (u64::BITS - META_SHIFT);

#[inline]
pub(crate) const fn string_fits(len: usize) -> bool {
    len <= MAX_INLINE_LEN
}

#[inline]
pub(crate) const fn bytes_fit(len: usize, spare: usize) -> bool {
    len <= MAX_INLINE_LEN && spare <= MAX_INLINE_SPARE
}

#[inline]
pub(crate) const fn descriptor_fits(addr: usize) -> bool {
    (addr as u64) < DESCRIPTOR_LIMIT
}

#[inline]
pub(crate) const fn pack_string(len: usize, tag: u16) -> u64 {
    debug_assert!(string_fits(len));
    ((len as u64) << LEN_SHIFT) | ((tag as u64) << META_SHIFT) | PtrTag::String as u64
}

#[inline]
pub(crate) const fn pack_bytes(len: usize, spare: usize) -> u64 {
    debug_assert!(bytes_fit(len, spare));
    ((len as u64) << LEN_SHIFT) | ((spare as u64) << META_SHIFT) | PtrTag::Bytes as u64
}

#[inline]
pub(crate) const fn pack_descriptor(addr: usize) -> u64 {
    debug_assert!(descriptor_fits(addr));
    ((addr as u64) << META_SHIFT) | PtrTag::Erased as u64
}

#[inline]
pub(crate) const fn unpack_len(ext: u64) -> usize {
    (ext >> LEN_SHIFT) as usize
}

#[inline]
pub(crate) const fn unpack_tag(ext: u64) -> u16 {
    (ext >> META_SHIFT) as u16
}

#[inline]
pub(crate) const fn unpack_spare(ext: u64) -> usize {
    ((ext >> META_SHIFT) & MAX_INLINE_SPARE as u64) as usize
}

#[inline]
pub(crate) const fn unpack_descriptor(ext: u64) -> usize {
    (ext >> META_SHIFT) as usize
}

/// Pointer stored for a borrowed slice.
///
/// Empty slices may point anywhere, so they are normalized to a dangling address that can
/// never collide with the scalar sentinels.
#[inline]
pub(crate) fn slice_ptr(bytes: &[u8]) -> *const u8 {
    if bytes.is_empty() {
        NonNull::<u8>::dangling().as_ptr().cast_const()
    } else {
        bytes.as_ptr()
    }
}
