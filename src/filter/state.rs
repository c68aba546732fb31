use crate::{
    filter::effect::{Filter, FilterTarget},
    foundation::core::{Rect, SurfaceId},
    render::backend::PassTarget,
    render::texture::RenderTexture,
};
use smallvec::SmallVec;
use std::rc::Rc;

/// One nesting level of the filter stack.
///
/// States are pooled by [`FilterStatePool`] and reset before reuse.
pub struct FilterState {
    pub(crate) target: Option<Rc<dyn FilterTarget>>,
    pub(crate) filters: SmallVec<[Rc<dyn Filter>; 4]>,
    pub(crate) source_frame: Rect,
    pub(crate) destination_frame: Rect,
    pub(crate) resolution: f64,
    pub(crate) legacy: bool,
    pub(crate) render_texture: Option<RenderTexture>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            target: None,
            filters: SmallVec::new(),
            source_frame: Rect::ZERO,
            destination_frame: Rect::ZERO,
            resolution: 1.0,
            legacy: false,
            render_texture: None,
        }
    }
}

impl std::fmt::Debug for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterState")
            .field("filters", &self.filters.len())
            .field("source_frame", &self.source_frame)
            .field("destination_frame", &self.destination_frame)
            .field("resolution", &self.resolution)
            .field("legacy", &self.legacy)
            .field("render_texture", &self.render_texture)
            .finish_non_exhaustive()
    }
}

impl FilterState {
    /// Node the filters are applied to.
    pub fn target(&self) -> Option<&Rc<dyn FilterTarget>> {
        self.target.as_ref()
    }

    /// Filters in application order.
    pub fn filters(&self) -> &[Rc<dyn Filter>] {
        &self.filters
    }

    /// Padded, fitted and pixel-snapped bounds of the target, in parent space.
    pub fn source_frame(&self) -> Rect {
        self.source_frame
    }

    /// Allocated size of the backing texture, in CSS pixels, anchored at the origin.
    pub fn destination_frame(&self) -> Rect {
        self.destination_frame
    }

    /// Resolution shared by the chain.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Whether any filter in the chain is legacy.
    pub fn legacy(&self) -> bool {
        self.legacy
    }

    fn clear(&mut self) {
        debug_assert!(
            self.render_texture.is_none(),
            "filter state recycled while still owning a render texture"
        );
        self.target = None;
        self.filters.clear();
        self.source_frame = Rect::ZERO;
        self.destination_frame = Rect::ZERO;
        self.resolution = 1.0;
        self.legacy = false;
        self.render_texture = None;
    }
}

/// Free list of cleared [`FilterState`] values.
#[derive(Debug, Default)]
pub(crate) struct FilterStatePool {
    free: Vec<FilterState>,
}

impl FilterStatePool {
    pub(crate) fn acquire(&mut self) -> FilterState {
        self.free.pop().unwrap_or_default()
    }

    pub(crate) fn release(&mut self, mut state: FilterState) {
        state.clear();
        self.free.push(state);
    }

    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.free.clear();
    }
}

/// LIFO stack of filter levels above a root entry.
///
/// The root is the target that was bound when the first level was pushed; the outermost pop
/// composites into it.
#[derive(Debug, Default)]
pub(crate) struct FilterStack {
    root: Option<SurfaceId>,
    levels: Vec<FilterState>,
}

impl FilterStack {
    pub(crate) fn depth(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub(crate) fn root(&self) -> Option<SurfaceId> {
        self.root
    }

    pub(crate) fn capture_root(&mut self, current: Option<SurfaceId>) {
        self.root = current;
    }

    pub(crate) fn push(&mut self, state: FilterState) {
        self.levels.push(state);
    }

    pub(crate) fn top(&self) -> Option<&FilterState> {
        self.levels.last()
    }

    pub(crate) fn pop(&mut self) -> Option<FilterState> {
        self.levels.pop()
    }

    /// Where the level above the current top composites into.
    pub(crate) fn top_target(&self) -> PassTarget {
        match self
            .levels
            .last()
            .and_then(|s| s.render_texture.as_ref())
        {
            Some(t) => t.target(),
            None => PassTarget {
                surface: self.root,
                frame: None,
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/state.rs"]
mod tests;
