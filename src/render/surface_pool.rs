use crate::foundation::core::PixelSize;
use crate::foundation::error::{FilterError, FilterResult};
use crate::foundation::math::{next_pow2, pixel_extent, validate_resolution};
use crate::render::backend::SurfaceBackend;
use crate::render::texture::{BucketKey, RenderTexture};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Pool configuration for cached render textures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Maximum number of retained surfaces per bucket. `None` retains everything released.
    pub max_surfaces_per_bucket: Option<usize>,
}

impl SurfacePoolOpts {
    /// Return options with a per-bucket retention cap.
    pub fn with_max_surfaces_per_bucket(mut self, cap: Option<usize>) -> Self {
        self.max_surfaces_per_bucket = cap;
        self
    }
}

/// Running counters for a [`SurfacePool`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfacePoolStats {
    /// Surfaces sitting in free lists.
    pub retained_surfaces: usize,
    /// Surfaces currently checked out.
    pub outstanding_surfaces: usize,
    /// Surfaces created through the backend.
    pub alloc_surfaces: u64,
    /// Acquisitions served from a free list.
    pub reused_surfaces: u64,
    /// Surfaces destroyed through the backend.
    pub destroyed_surfaces: u64,
    /// Releases that destroyed the surface instead of retaining it.
    pub dropped_on_release: u64,
}

struct Bucket {
    key: BucketKey,
    surfaces: Vec<RenderTexture>,
}

/// Size-bucketed pool of offscreen render textures.
///
/// Requests matching the output size exactly share the screen bucket. Everything else is rounded
/// up to power-of-two dimensions so that nearby sizes reuse the same surfaces across frames.
pub struct SurfacePool {
    id: u64,
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,

    screen: PixelSize,
    full_screen: bool,
    // Bumped on every resize; screen textures from an older epoch are stale.
    screen_epoch: u32,

    bucket_idx_by_key: HashMap<BucketKey, usize>,
    buckets: Vec<Bucket>,
}

impl SurfacePool {
    /// Create an empty pool with no known screen size.
    pub fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            opts,
            stats: SurfacePoolStats::default(),
            screen: PixelSize::default(),
            full_screen: true,
            screen_epoch: 0,
            bucket_idx_by_key: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    /// Output size used for the screen-bucket fast path.
    pub fn screen_size(&self) -> PixelSize {
        self.screen
    }

    /// Number of free surfaces retained under `key`.
    pub fn retained_in(&self, key: BucketKey) -> usize {
        self.bucket_idx_by_key
            .get(&key)
            .map_or(0, |&bi| self.buckets[bi].surfaces.len())
    }

    pub(crate) fn set_full_screen_enabled(&mut self, enabled: bool) {
        self.full_screen = enabled;
    }

    fn bucket_for(&self, px: PixelSize) -> FilterResult<(BucketKey, PixelSize)> {
        if self.full_screen && !self.screen.is_empty() && px == self.screen {
            return Ok((BucketKey::Screen, px));
        }
        let w = next_pow2(px.width);
        let h = next_pow2(px.height);
        let key = BucketKey::sized(w, h).ok_or_else(|| {
            FilterError::contract(format!(
                "surface {}x{} rounds to {w}x{h}, which exceeds the 16-bit bucket key",
                px.width, px.height
            ))
        })?;
        Ok((key, PixelSize::new(w, h)))
    }

    /// Check out a texture covering at least `min_width x min_height` CSS pixels at `resolution`.
    pub fn acquire<B: SurfaceBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        min_width: f64,
        min_height: f64,
        resolution: f64,
    ) -> FilterResult<RenderTexture> {
        let resolution = validate_resolution(resolution)?;
        let px = PixelSize::new(
            pixel_extent(min_width, resolution)?,
            pixel_extent(min_height, resolution)?,
        );
        let (key, real) = self.bucket_for(px)?;

        let pooled = self
            .bucket_idx_by_key
            .get(&key)
            .and_then(|&bi| self.buckets[bi].surfaces.pop());

        let mut texture = match pooled {
            Some(t) => {
                self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
                self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
                t
            }
            None => {
                let surface = backend.create_surface(real.width, real.height)?;
                self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
                tracing::debug!(
                    surface = surface.0,
                    width = real.width,
                    height = real.height,
                    ?key,
                    "filter surface created"
                );
                RenderTexture::new(surface, real, self.id, key, self.screen_epoch)
            }
        };

        texture.set_resolution(resolution);
        backend.set_surface_resolution(texture.surface(), resolution);
        self.stats.outstanding_surfaces = self.stats.outstanding_surfaces.saturating_add(1);
        Ok(texture)
    }

    /// Return a texture to the bucket it was acquired from.
    pub fn release<B: SurfaceBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mut texture: RenderTexture,
    ) -> FilterResult<()> {
        if texture.pool_id != self.id {
            return Err(FilterError::contract(format!(
                "surface {:?} was not acquired from this pool",
                texture.surface()
            )));
        }
        self.stats.outstanding_surfaces = self.stats.outstanding_surfaces.saturating_sub(1);
        texture.set_filter_frame(None);

        if texture.key == BucketKey::Screen && texture.screen_epoch != self.screen_epoch {
            tracing::warn!(
                surface = texture.surface().0,
                "screen surface returned after resize; destroying"
            );
            self.destroy(backend, texture);
            return Ok(());
        }

        let key = texture.key;
        let bi = match self.bucket_idx_by_key.get(&key).copied() {
            Some(i) => i,
            None => {
                let i = self.buckets.len();
                self.buckets.push(Bucket {
                    key,
                    surfaces: Vec::new(),
                });
                self.bucket_idx_by_key.insert(key, i);
                i
            }
        };

        let bucket = &mut self.buckets[bi];
        if let Some(cap) = self.opts.max_surfaces_per_bucket
            && bucket.surfaces.len() >= cap
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            self.destroy(backend, texture);
            return Ok(());
        }

        bucket.surfaces.push(texture);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        Ok(())
    }

    /// Destroy every retained surface and forget all buckets.
    pub fn drain<B: SurfaceBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.stats.outstanding_surfaces > 0 {
            tracing::warn!(
                outstanding = self.stats.outstanding_surfaces,
                "draining filter pool with surfaces still checked out"
            );
        }
        let buckets = std::mem::take(&mut self.buckets);
        self.bucket_idx_by_key.clear();
        for bucket in buckets {
            tracing::debug!(key = ?bucket.key, count = bucket.surfaces.len(), "draining bucket");
            for texture in bucket.surfaces {
                self.destroy(backend, texture);
            }
        }
        self.stats.retained_surfaces = 0;
    }

    /// Track a new output size.
    ///
    /// Only the screen bucket is invalidated: sized buckets are keyed by absolute dimensions and
    /// stay valid across resizes.
    pub fn on_resize<B: SurfaceBackend + ?Sized>(&mut self, backend: &mut B, size: PixelSize) {
        if size == self.screen {
            return;
        }
        tracing::debug!(
            width = size.width,
            height = size.height,
            "filter pool screen size changed"
        );
        if let Some(&bi) = self.bucket_idx_by_key.get(&BucketKey::Screen) {
            let stale = std::mem::take(&mut self.buckets[bi].surfaces);
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(stale.len());
            for texture in stale {
                self.destroy(backend, texture);
            }
        }
        self.screen = size;
        self.screen_epoch = self.screen_epoch.wrapping_add(1);
    }

    fn destroy<B: SurfaceBackend + ?Sized>(&mut self, backend: &mut B, texture: RenderTexture) {
        tracing::debug!(surface = texture.surface().0, "filter surface destroyed");
        backend.destroy_surface(texture.surface());
        self.stats.destroyed_surfaces = self.stats.destroyed_surfaces.saturating_add(1);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
