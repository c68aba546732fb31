use crate::{
    foundation::core::{PixelSize, Rect, SurfaceId},
    render::backend::PassTarget,
};

/// Identity of a pool bucket.
///
/// `Sized` packs a power-of-two width and height as `(w << 16) | h`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// Surfaces exactly the size of the output.
    Screen,
    /// Packed power-of-two dimensions.
    Sized(u32),
}

impl BucketKey {
    /// Pack `width`/`height` into a sized key. Returns `None` if either exceeds 16 bits.
    pub fn sized(width: u32, height: u32) -> Option<Self> {
        if width > 0xFFFF || height > 0xFFFF {
            return None;
        }
        Some(Self::Sized((width << 16) | height))
    }

    /// Unpack the dimensions of a sized key.
    pub fn dims(self) -> Option<(u32, u32)> {
        match self {
            Self::Screen => None,
            Self::Sized(k) => Some((k >> 16, k & 0xFFFF)),
        }
    }
}

/// An offscreen surface checked out from a [`crate::SurfacePool`].
///
/// Render textures are move-only: a texture goes back to its pool by value, so it cannot be
/// returned twice.
#[derive(Debug)]
pub struct RenderTexture {
    surface: SurfaceId,
    real: PixelSize,
    resolution: f64,
    filter_frame: Option<Rect>,
    pub(crate) pool_id: u64,
    pub(crate) key: BucketKey,
    pub(crate) screen_epoch: u32,
}

impl RenderTexture {
    pub(crate) fn new(
        surface: SurfaceId,
        real: PixelSize,
        pool_id: u64,
        key: BucketKey,
        screen_epoch: u32,
    ) -> Self {
        Self {
            surface,
            real,
            resolution: 1.0,
            filter_frame: None,
            pool_id,
            key,
            screen_epoch,
        }
    }

    /// Backend handle of the surface.
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Allocated size in device pixels.
    pub fn real_size(&self) -> PixelSize {
        self.real
    }

    /// Device-pixel ratio the texture is addressed with.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub(crate) fn set_resolution(&mut self, resolution: f64) {
        self.resolution = resolution;
    }

    /// Width in CSS pixels.
    pub fn width(&self) -> f64 {
        f64::from(self.real.width) / self.resolution
    }

    /// Height in CSS pixels.
    pub fn height(&self) -> f64 {
        f64::from(self.real.height) / self.resolution
    }

    /// Full texture frame in CSS pixels, anchored at the origin.
    pub fn frame(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }

    /// Valid sub-region written by the filter pass that owns this texture.
    pub fn filter_frame(&self) -> Option<Rect> {
        self.filter_frame
    }

    /// Tag the valid sub-region.
    pub fn set_filter_frame(&mut self, frame: Option<Rect>) {
        self.filter_frame = frame;
    }

    /// Pool bucket this texture returns to.
    pub fn bucket(&self) -> BucketKey {
        self.key
    }

    /// Bind target covering this texture's valid sub-region.
    pub fn target(&self) -> PassTarget {
        PassTarget {
            surface: Some(self.surface),
            frame: self.filter_frame,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/texture.rs"]
mod tests;
