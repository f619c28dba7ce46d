//! Cached Image Module
//!
//! The decoded-image abstraction the memory store holds, and the cost
//! functions used to bound it.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

// == Cached Image ==
/// A decoded, displayable image.
///
/// Decoding is the caller's business; the cache only needs the dimensions for
/// its pixel budget and an encoder for writing temporary images to disk.
pub trait CachedImage: Send + Sync + 'static {
    /// Width and height in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Encodes the image for the disk cache, or `None` if it cannot be encoded.
    fn encode(&self) -> Option<Vec<u8>>;

    /// Width times height.
    fn pixel_count(&self) -> u64 {
        let (width, height) = self.dimensions();
        u64::from(width) * u64::from(height)
    }
}

impl CachedImage for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Encodes as PNG.
    fn encode(&self) -> Option<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        match self.write_to(&mut buf, ImageFormat::Png) {
            Ok(()) => Some(buf.into_inner()),
            Err(err) => {
                debug!(error = %err, "failed to encode image as PNG");
                None
            }
        }
    }
}

// == Weigher ==
/// Cost function for values held by [`crate::cache::MemoryStore`].
pub trait Weigher<V: ?Sized>: Send + Sync {
    /// Returns the budget cost of `value`.
    fn weigh(&self, value: &V) -> u64;
}

impl<V: ?Sized, F> Weigher<V> for F
where
    F: Fn(&V) -> u64 + Send + Sync,
{
    fn weigh(&self, value: &V) -> u64 {
        self(value)
    }
}

/// Weighs images by pixel count.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelWeigher;

impl<I: CachedImage> Weigher<I> for PixelWeigher {
    fn weigh(&self, value: &I) -> u64 {
        value.pixel_count()
    }
}
