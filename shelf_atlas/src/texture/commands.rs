// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred texture commands.
//!
//! GPU renderers often cannot touch their device while glyphs are being
//! encoded. [`TextureCommandRecorder`] is a [`TextureBackend`] that records
//! every create/upload/destroy as a [`TextureCommand`] instead of executing it.
//! At render time the application drains the queue with
//! [`TextureCommandRecorder::take_commands`] and replays it into anything that
//! implements [`TextureReplayTarget`].

use alloc::vec::Vec;
use foldhash::fast::FixedState;
use hashbrown::HashSet;

use super::{TextureBackend, TextureError, TextureId};
use crate::config::PixelFormat;

/// A single texture operation recorded for deferred execution.
///
/// The variants correspond 1:1 to the methods on [`TextureReplayTarget`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureCommand {
    /// Create a square texture.
    Create {
        /// Identifier the texture is referred to by later commands.
        texture: TextureId,
        /// Pixel format.
        format: PixelFormat,
        /// Side length in pixels.
        size: u32,
        /// Initial contents, if any.
        initial: Option<Vec<u8>>,
    },
    /// Overwrite a region of a texture.
    Upload {
        /// Target texture.
        texture: TextureId,
        /// Pixel format of `pixels`.
        format: PixelFormat,
        /// Top-left corner of the region.
        origin: [u32; 2],
        /// Width and height of the region.
        size: [u32; 2],
        /// Tightly packed pixels.
        pixels: Vec<u8>,
    },
    /// Release a texture.
    Destroy {
        /// Texture to release.
        texture: TextureId,
    },
}

/// Trait for types that can execute recorded [`TextureCommand`]s.
pub trait TextureReplayTarget {
    /// Create a texture under the given identifier.
    fn create_texture_with_id(
        &mut self,
        id: TextureId,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<(), TextureError>;
    /// Overwrite a region of a texture.
    fn upload(
        &mut self,
        id: TextureId,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError>;
    /// Release a texture.
    fn destroy(&mut self, id: TextureId);
}

/// Replay recorded commands into a target, stopping at the first failure.
pub fn replay_texture_commands(
    commands: &[TextureCommand],
    target: &mut impl TextureReplayTarget,
) -> Result<(), TextureError> {
    for cmd in commands {
        match cmd {
            TextureCommand::Create {
                texture,
                format,
                size,
                initial,
            } => target.create_texture_with_id(*texture, *format, *size, initial.as_deref())?,
            TextureCommand::Upload {
                texture,
                format,
                origin,
                size,
                pixels,
            } => target.upload(*texture, *format, *origin, *size, pixels)?,
            TextureCommand::Destroy { texture } => target.destroy(*texture),
        }
    }
    Ok(())
}

/// Records texture operations for later replay.
///
/// Identifiers are handed out eagerly so the cache can refer to its sheets
/// right away; the textures themselves only exist once the commands are
/// replayed.
#[derive(Debug, Default)]
pub struct TextureCommandRecorder {
    commands: Vec<TextureCommand>,
    live: HashSet<TextureId, FixedState>,
    next_id: u32,
}

impl TextureCommandRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last [`take_commands`](Self::take_commands).
    #[inline]
    pub fn commands(&self) -> &[TextureCommand] {
        &self.commands
    }

    /// Take all pending commands, leaving the internal queue empty.
    pub fn take_commands(&mut self) -> Vec<TextureCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Number of textures created and not yet destroyed.
    #[inline]
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }
}

impl TextureBackend for TextureCommandRecorder {
    type Texture = TextureId;

    fn create_texture(
        &mut self,
        format: PixelFormat,
        size: u32,
        initial: Option<&[u8]>,
    ) -> Result<TextureId, TextureError> {
        if initial.is_some_and(|pixels| Some(pixels.len()) != format.bitmap_len(size, size)) {
            return Err(TextureError::InvalidRegion);
        }
        let texture = TextureId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.live.insert(texture);
        self.commands.push(TextureCommand::Create {
            texture,
            format,
            size,
            initial: initial.map(<[u8]>::to_vec),
        });
        Ok(texture)
    }

    fn sub_upload(
        &mut self,
        texture: &TextureId,
        format: PixelFormat,
        origin: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        if !self.live.contains(texture) {
            return Err(TextureError::UnknownTexture(*texture));
        }
        if Some(pixels.len()) != format.bitmap_len(size[0], size[1]) {
            return Err(TextureError::InvalidRegion);
        }
        self.commands.push(TextureCommand::Upload {
            texture: *texture,
            format,
            origin,
            size,
            pixels: pixels.to_vec(),
        });
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live.remove(&texture);
        self.commands.push(TextureCommand::Destroy { texture });
    }
}
