// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Texture backend that owns its pixel storage in memory.

use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};
use foldhash::fast::FixedState;
use hashbrown::HashMap;

use super::commands::TextureReplayTarget;
use super::{TextureBackend, TextureError, TextureId, check_region};
use crate::config::PixelFormat;

/// A square texture held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct CpuTexture {
    format: PixelFormat,
    size: u32,
    data: Vec<u8>,
}

impl CpuTexture {
    fn new(format: PixelFormat, size: u32, initial: Option<&[u8]>) -> Result<Self, TextureError> {
        let len = format
            .bitmap_len(size, size)
            .ok_or(TextureError::OutOfMemory)?;
        if initial.is_some_and(|pixels| pixels.len() != len) {
            return Err(TextureError::InvalidRegion);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| TextureError::OutOfMemory)?;
        match initial {
            Some(pixels) => data.extend_from_slice(pixels),
            None => data.resize(len, 0),
        }
        Ok(Self { format, size, data })
    }

    /// Pixel format of the texture.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Side length in pixels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The raw, row-major pixel data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The bytes of the pixel at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.size as usize + x as usize) * bpp;
        self.data.get(start..start + bpp)
    }

    fn write(
        &mut self,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        check_region(self.format, self.size, format, origin, size, pixels)?;
        let bpp = self.format.bytes_per_pixel();
        let row_len = size[0] as usize * bpp;
        if row_len == 0 {
            return Ok(());
        }
        let stride = self.size as usize * bpp;
        for (row, src) in pixels.chunks_exact(row_len).enumerate() {
            let start = (origin[1] as usize + row) * stride + origin[0] as usize * bpp;
            self.data[start..start + row_len].copy_from_slice(src);
        }
        Ok(())
    }

    /// Save the texture to a PNG file at the specified path.
    #[cfg(feature = "png")]
    pub fn save_png(&self, path: &std::path::Path) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::BufWriter;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let w = BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.size, self.size);
        encoder.set_color(match self.format {
            PixelFormat::Alpha8 => png::ColorType::Grayscale,
            PixelFormat::Rgba8 => png::ColorType::Rgba,
        });
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(std::io::Error::other)?;

        writer
            .write_image_data(&self.data)
            .map_err(std::io::Error::other)?;

        Ok(())
    }
}

impl Debug for CpuTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CpuTexture")
            .field("format", &self.format)
            .field("size", &self.size)
            .field("data", &self.data.len())
            .finish()
    }
}

/// In-memory texture backend.
///
/// Useful for CPU renderers, which sample glyphs straight out of the stored
/// pixels, and as a replay target for
/// [`TextureCommandRecorder`](super::commands::TextureCommandRecorder).
#[derive(Debug, Default)]
pub struct CpuTextures {
    textures: HashMap<TextureId, CpuTexture, FixedState>,
    next_id: u32,
}

impl CpuTextures {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a texture.
    pub fn texture(&self, id: TextureId) -> Option<&CpuTexture> {
        self.textures.get(&id)
    }

    /// Number of textures currently alive.
    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether no texture is alive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn insert(&mut self, id: TextureId, texture: CpuTexture) {
        self.next_id = self.next_id.max(id.get().wrapping_add(1));
        self.textures.insert(id, texture);
    }
}

impl TextureBackend for CpuTextures {
    type Texture = TextureId;

    fn create_texture(
        &mut self,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<TextureId, TextureError> {
        let id = TextureId::new(self.next_id);
        let texture = CpuTexture::new(format, size, initial)?;
        self.insert(id, texture);
        Ok(id)
    }

    fn sub_upload(
        &mut self,
        texture: &TextureId,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        self.textures
            .get_mut(texture)
            .ok_or(TextureError::UnknownTexture(*texture))?
            .write(format, origin, size, pixels)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("destroying unknown texture {}", texture.get());
        }
    }
}

impl TextureReplayTarget for CpuTextures {
    fn create_texture_with_id(
        &mut self,
        id: TextureId,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<(), TextureError> {
        let texture = CpuTexture::new(format, size, initial)?;
        self.insert(id, texture);
        Ok(())
    }

    fn upload(
        &mut self,
        id: TextureId,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        self.sub_upload(&id, format, origin, size, pixels)
    }

    fn destroy(&mut self, id: TextureId) {
        self.destroy_texture(id);
    }
}
