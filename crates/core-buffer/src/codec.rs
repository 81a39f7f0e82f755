//! Fixed-size element codecs.
//!
//! A codec maps one element to exactly `size_of_item()` bytes and back. The
//! byte position of element index `i` relative to a base offset is
//! `base + i * size_of_item()`.

use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

pub trait ByteCodec<T>: Send + Sync {
    fn size_of_item(&self) -> usize;

    /// Decode one element; `bytes.len() == size_of_item()`.
    fn decode(&self, bytes: &[u8]) -> T;

    /// Encode one element into `out`; `out.len() == size_of_item()`.
    fn encode(&self, item: &T, out: &mut [u8]);

    /// Byte offset of element `index`, or `None` on overflow.
    fn offset(&self, base: usize, index: usize) -> Option<usize> {
        index.checked_mul(self.size_of_item())?.checked_add(base)
    }
}

/// Native-layout codec for plain-old-data types.
pub struct PodCodec<T>(PhantomData<fn() -> T>);

impl<T> PodCodec<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for PodCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PodCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PodCodec<T> {}

impl<T> std::fmt::Debug for PodCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PodCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T: Pod> ByteCodec<T> for PodCodec<T> {
    fn size_of_item(&self) -> usize {
        size_of::<T>()
    }

    fn decode(&self, bytes: &[u8]) -> T {
        bytemuck::pod_read_unaligned(bytes)
    }

    fn encode(&self, item: &T, out: &mut [u8]) {
        out.copy_from_slice(bytemuck::bytes_of(item));
    }
}

/// Little-endian codec for primitive integers; byte order is fixed regardless
/// of the host.
pub struct LittleEndian<T>(PhantomData<fn() -> T>);

impl<T> LittleEndian<T> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for LittleEndian<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LittleEndian<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LittleEndian<{}>", std::any::type_name::<T>())
    }
}

macro_rules! le_codec {
    ($($t:ty),* $(,)?) => {
        $(
            impl ByteCodec<$t> for LittleEndian<$t> {
                fn size_of_item(&self) -> usize {
                    size_of::<$t>()
                }

                fn decode(&self, bytes: &[u8]) -> $t {
                    let mut raw = [0u8; size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }

                fn encode(&self, item: &$t, out: &mut [u8]) {
                    out.copy_from_slice(&item.to_le_bytes());
                }
            }
        )*
    };
}

le_codec!(u8, i8, u16, i16, u32, i32, u64, i64);
