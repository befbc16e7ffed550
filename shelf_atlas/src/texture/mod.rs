// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture storage backends.
//!
//! The cache never touches a graphics device directly. Every sheet is backed by
//! a texture created, updated, and destroyed through a [`TextureBackend`]:
//! - [`CpuTextures`](cpu::CpuTextures) keeps pixel storage in memory, for CPU
//!   rendering and for tests
//! - [`TextureCommandRecorder`](commands::TextureCommandRecorder) records the
//!   texture operations so the application can replay them on the GPU at
//!   render time

pub mod commands;
pub mod cpu;

use crate::config::PixelFormat;

/// A graphics-device texture service used by [`AtlasCache`](crate::AtlasCache).
///
/// Calls are blocking and issued inline with insertion and compaction.
pub trait TextureBackend {
    /// Handle to a texture owned by this backend.
    type Texture;

    /// Create a square `size` x `size` texture.
    ///
    /// `initial`, when given, holds `size * size` tightly packed pixels in `format`.
    /// Otherwise the texture starts out zeroed.
    fn create_texture(
        &mut self,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<Self::Texture, TextureError>;

    /// Overwrite the `size[0]` x `size[1]` region at `origin` with `pixels`.
    fn sub_upload(
        &mut self,
        texture: &Self::Texture,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError>;

    /// Release a texture. The handle is consumed.
    fn destroy_texture(&mut self, texture: Self::Texture);
}

impl<T: TextureBackend + ?Sized> TextureBackend for &mut T {
    type Texture = T::Texture;

    fn create_texture(
        &mut self,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<Self::Texture, TextureError> {
        (**self).create_texture(format, size, initial)
    }

    fn sub_upload(
        &mut self,
        texture: &Self::Texture,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        (**self).sub_upload(texture, format, origin, size, pixels)
    }

    fn destroy_texture(&mut self, texture: Self::Texture) {
        (**self).destroy_texture(texture);
    }
}

/// Identifier for a texture created by one of the bundled backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(u32);

impl TextureId {
    /// Wrap a raw identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A failure reported by a texture backend.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextureError {
    /// The device could not allocate the texture.
    OutOfMemory,
    /// The upload region or pixel buffer does not match the texture.
    InvalidRegion,
    /// The texture handle is not known to the backend.
    UnknownTexture(TextureId),
    /// The device was lost.
    DeviceLost,
}

impl core::fmt::Display for TextureError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of texture memory"),
            Self::InvalidRegion => write!(f, "upload region does not match the texture"),
            Self::UnknownTexture(id) => write!(f, "unknown texture {}", id.get()),
            Self::DeviceLost => write!(f, "device lost"),
        }
    }
}

impl core::error::Error for TextureError {}

/// Check that an upload of `pixels` into a `texture_size` texture is well formed.
pub(crate) fn check_region(
    texture_format: PixelFormat,
    texture_size: u32,
    format: PixelFormat,
    origin: [u32; 2],
    size: [u32; 2],
    pixels: &[u8],
) -> Result<(), TextureError> {
    let in_bounds = origin[0]
        .checked_add(size[0])
        .is_some_and(|right| right <= texture_size)
        && origin[1]
            .checked_add(size[1])
            .is_some_and(|bottom| bottom <= texture_size);
    let len_matches = Some(pixels.len()) == format.bitmap_len(size[0], size[1]);
    if format != texture_format || !in_bounds || !len_matches {
        return Err(TextureError::InvalidRegion);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_must_fit_texture() {
        let ok = check_region(PixelFormat::Alpha8, 8, PixelFormat::Alpha8, [6, 0], [2, 1], &[0; 2]);
        assert!(ok.is_ok());

        let overflow =
            check_region(PixelFormat::Alpha8, 8, PixelFormat::Alpha8, [7, 0], [2, 1], &[0; 2]);
        assert_eq!(overflow, Err(TextureError::InvalidRegion));
    }

    #[test]
    fn region_must_match_format() {
        let wrong_format =
            check_region(PixelFormat::Rgba8, 8, PixelFormat::Alpha8, [0, 0], [1, 1], &[0; 1]);
        assert_eq!(wrong_format, Err(TextureError::InvalidRegion));

        let short_buffer =
            check_region(PixelFormat::Rgba8, 8, PixelFormat::Rgba8, [0, 0], [1, 1], &[0; 3]);
        assert_eq!(short_buffer, Err(TextureError::InvalidRegion));
    }
}
