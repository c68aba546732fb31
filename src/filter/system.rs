use crate::{
    filter::effect::{AutoFitPolicy, ChainParams, Filter, FilterPass, FilterTarget, SpriteSource},
    filter::geometry::PassGeometries,
    filter::sprite::sprite_matrix,
    filter::state::{FilterStack, FilterState, FilterStatePool},
    filter::uniforms::GlobalUniforms,
    foundation::core::{Affine, PixelSize, Rect, SurfaceId},
    foundation::error::{FilterError, FilterResult},
    foundation::frame::{ceil_rect, fit_rect, pad_rect},
    render::backend::{FilterBackend, PassTarget, ShaderInputs},
    render::surface_pool::{SurfacePool, SurfacePoolOpts, SurfacePoolStats},
    render::texture::RenderTexture,
};
use std::rc::Rc;

/// Options for [`FilterSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterSystemOpts {
    /// Texture pool configuration.
    pub pool: SurfacePoolOpts,
    /// Serve output-sized requests from an exact-size screen bucket.
    pub enable_full_screen: bool,
    /// How per-filter `auto_fit` flags combine.
    pub auto_fit: AutoFitPolicy,
    /// Also clear the destination before the final compositing pass.
    pub force_clear: bool,
}

impl Default for FilterSystemOpts {
    fn default() -> Self {
        Self {
            pool: SurfacePoolOpts::default(),
            enable_full_screen: true,
            auto_fit: AutoFitPolicy::Any,
            force_clear: false,
        }
    }
}

impl FilterSystemOpts {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> FilterResult<Self> {
        serde_json::from_str(s).map_err(|e| FilterError::serde(e.to_string()))
    }

    /// Return options with a texture pool configuration.
    pub fn with_pool(mut self, pool: SurfacePoolOpts) -> Self {
        self.pool = pool;
        self
    }

    /// Return options with the screen-bucket fast path toggled.
    pub fn with_full_screen(mut self, enabled: bool) -> Self {
        self.enable_full_screen = enabled;
        self
    }

    /// Return options with an auto-fit policy.
    pub fn with_auto_fit(mut self, policy: AutoFitPolicy) -> Self {
        self.auto_fit = policy;
        self
    }

    /// Return options with forced clearing of the final destination.
    pub fn with_force_clear(mut self, force: bool) -> Self {
        self.force_clear = force;
        self
    }
}

/// Frames of the level currently being popped, visible to filters during their passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveState {
    /// See [`FilterState::source_frame`].
    pub source_frame: Rect,
    /// See [`FilterState::destination_frame`].
    pub destination_frame: Rect,
    /// Chain resolution.
    pub resolution: f64,
    /// Whether the chain is legacy.
    pub legacy: bool,
    input_width: f64,
    input_height: f64,
    input_resolution: f64,
    input_filter_frame: Option<Rect>,
}

impl ActiveState {
    fn capture(state: &FilterState, input: &RenderTexture) -> Self {
        Self {
            source_frame: state.source_frame,
            destination_frame: state.destination_frame,
            resolution: state.resolution,
            legacy: state.legacy,
            input_width: input.width(),
            input_height: input.height(),
            input_resolution: input.resolution(),
            input_filter_frame: input.filter_frame(),
        }
    }
}

/// Services a [`Filter`] can use while it runs.
pub trait FilterContext {
    /// Run one full-screen pass of `pass` from `input` into `output`.
    fn apply_filter(
        &mut self,
        pass: FilterPass,
        input: &RenderTexture,
        output: PassTarget,
        clear: bool,
    ) -> FilterResult<()>;

    /// Scratch texture sized and tagged like the active level's input.
    fn get_filter_texture(&mut self, resolution: Option<f64>) -> FilterResult<RenderTexture>;

    /// Scratch texture sized and tagged like `input`.
    fn get_filter_texture_like(
        &mut self,
        input: &RenderTexture,
        resolution: Option<f64>,
    ) -> FilterResult<RenderTexture>;

    /// Hand a scratch texture back to the pool.
    fn return_filter_texture(&mut self, texture: RenderTexture) -> FilterResult<()>;

    /// See [`sprite_matrix`]; uses the active level's frames.
    fn calculate_sprite_matrix(&self, sprite: &dyn SpriteSource) -> FilterResult<Affine>;

    /// Frames of the level being popped, if any.
    fn active_state(&self) -> Option<&ActiveState>;

    /// Uniform block of the current pop.
    fn global_uniforms(&self) -> &GlobalUniforms;
}

/// Applies filter chains to subtrees using pooled offscreen textures.
///
/// Call [`FilterSystem::push`] before rendering a filtered subtree and [`FilterSystem::pop`]
/// after; pushes and pops must nest.
pub struct FilterSystem<B: FilterBackend> {
    backend: B,
    opts: FilterSystemOpts,
    pool: SurfacePool,
    states: FilterStatePool,
    stack: FilterStack,
    globals: GlobalUniforms,
    active: Option<ActiveState>,
    geometries: PassGeometries,
}

impl<B: FilterBackend> FilterSystem<B> {
    /// Create a filter system drawing through `backend`.
    pub fn new(backend: B, opts: FilterSystemOpts) -> Self {
        let mut pool = SurfacePool::new(opts.pool);
        pool.set_full_screen_enabled(opts.enable_full_screen);
        Self {
            backend,
            opts,
            pool,
            states: FilterStatePool::default(),
            stack: FilterStack::default(),
            globals: GlobalUniforms::default(),
            active: None,
            geometries: PassGeometries::default(),
        }
    }

    /// Shared access to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend, e.g. to render a subtree between push and pop.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the system and return the backend. Pooled surfaces are destroyed first.
    pub fn into_backend(mut self) -> B {
        self.destroy();
        self.backend
    }

    /// Options the system was built with.
    pub fn opts(&self) -> FilterSystemOpts {
        self.opts
    }

    /// Number of pushed levels.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Target captured when the outermost level was pushed (`None` is the backbuffer).
    pub fn root_target(&self) -> Option<SurfaceId> {
        self.stack.root()
    }

    /// Top level of the stack, if any.
    pub fn current_state(&self) -> Option<&FilterState> {
        self.stack.top()
    }

    /// Texture pool counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Number of recycled filter states waiting for reuse.
    pub fn pooled_states(&self) -> usize {
        self.states.len()
    }

    /// Begin filtering `target` with `filters`.
    ///
    /// Binds and clears an offscreen texture covering the target's padded bounds; everything
    /// rendered until the matching [`FilterSystem::pop`] lands in it.
    #[tracing::instrument(level = "trace", skip_all, fields(filters = filters.len()))]
    pub fn push(
        &mut self,
        target: Rc<dyn FilterTarget>,
        filters: &[Rc<dyn Filter>],
    ) -> FilterResult<()> {
        let params = ChainParams::reduce(filters, self.opts.auto_fit)?;

        if self.stack.is_empty() {
            self.stack.capture_root(self.backend.current_target());
        }

        let area = target
            .filter_area()
            .unwrap_or_else(|| target.bounds())
            .abs();
        let mut frame = pad_rect(area, params.padding);
        if params.auto_fit {
            frame = fit_rect(frame, self.backend.current_source_frame());
        }
        let frame = ceil_rect(frame, params.resolution);

        let mut texture = self.pool.acquire(
            &mut self.backend,
            frame.width(),
            frame.height(),
            params.resolution,
        )?;
        texture.set_filter_frame(Some(frame));

        let bound = self
            .backend
            .bind_target(texture.target())
            .and_then(|()| self.backend.clear());
        if let Err(e) = bound {
            self.pool.release(&mut self.backend, texture)?;
            return Err(e);
        }

        let mut state = self.states.acquire();
        state.target = Some(target);
        state.filters.extend(filters.iter().cloned());
        state.resolution = params.resolution;
        state.legacy = params.legacy;
        state.source_frame = frame;
        state.destination_frame = Rect::new(0.0, 0.0, texture.width(), texture.height());
        state.render_texture = Some(texture);

        tracing::trace!(
            ?frame,
            resolution = params.resolution,
            depth = self.stack.depth() + 1,
            "filter level pushed"
        );
        self.stack.push(state);
        Ok(())
    }

    /// Run the top level's filter chain and composite it into the level below.
    ///
    /// One filter renders straight into the destination. Longer chains ping-pong between the
    /// level's texture and one extra pooled texture, clearing on every intermediate pass; the
    /// last filter composites into the destination without clearing.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn pop(&mut self) -> FilterResult<()> {
        let mut state = self
            .stack
            .pop()
            .ok_or_else(|| FilterError::contract("pop called with no pushed filter level"))?;
        let Some(input) = state.render_texture.take() else {
            self.states.release(state);
            return Err(FilterError::contract("filter level has no render texture"));
        };

        tracing::trace!(
            depth = self.stack.depth(),
            filters = state.filters.len(),
            "filter level popped"
        );
        self.globals.update(&state);
        self.active = Some(ActiveState::capture(&state, &input));
        let output = self.stack.top_target();

        let result = if state.filters.len() == 1 {
            self.apply_single(&state, input, output)
        } else {
            self.apply_chain(&state, input, output)
        };

        self.active = None;
        self.states.release(state);
        result
    }

    fn apply_single(
        &mut self,
        state: &FilterState,
        input: RenderTexture,
        output: PassTarget,
    ) -> FilterResult<()> {
        let clear = self.opts.force_clear;
        let applied = state.filters[0].apply(self, &input, output, clear, state);
        let released = self.pool.release(&mut self.backend, input);
        applied.and(released)
    }

    fn apply_chain(
        &mut self,
        state: &FilterState,
        input: RenderTexture,
        output: PassTarget,
    ) -> FilterResult<()> {
        let mut flip = input;
        let mut flop = match self.pool.acquire(
            &mut self.backend,
            flip.width(),
            flip.height(),
            state.resolution,
        ) {
            Ok(t) => t,
            Err(e) => {
                self.pool.release(&mut self.backend, flip)?;
                return Err(e);
            }
        };
        flop.set_filter_frame(flip.filter_frame());

        let applied = self.ping_pong(state, &mut flip, &mut flop, output);
        let released_flip = self.pool.release(&mut self.backend, flip);
        let released_flop = self.pool.release(&mut self.backend, flop);
        applied.and(released_flip).and(released_flop)
    }

    fn ping_pong(
        &mut self,
        state: &FilterState,
        flip: &mut RenderTexture,
        flop: &mut RenderTexture,
        output: PassTarget,
    ) -> FilterResult<()> {
        let clear = self.opts.force_clear;
        let Some((last, chain)) = state.filters.split_last() else {
            return Ok(());
        };
        for filter in chain {
            filter.apply(self, flip, flop.target(), true, state)?;
            std::mem::swap(flip, flop);
        }
        last.apply(self, flip, output, clear, state)
    }

    /// Track a new output size; invalidates screen-sized pooled textures.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pool
            .on_resize(&mut self.backend, PixelSize::new(width, height));
    }

    /// Destroy every pooled texture.
    pub fn empty_pool(&mut self) {
        self.pool.drain(&mut self.backend);
    }

    /// Release everything the system holds.
    ///
    /// Levels still on the stack are dropped along with their textures' backend surfaces.
    pub fn destroy(&mut self) {
        while let Some(mut state) = self.stack.pop() {
            tracing::warn!("destroying filter system with an unpopped level");
            if let Some(t) = state.render_texture.take() {
                // Same pool by construction.
                let _ = self.pool.release(&mut self.backend, t);
            }
            self.states.release(state);
        }
        self.pool.drain(&mut self.backend);
        self.states.clear();
        self.active = None;
    }
}

impl<B: FilterBackend> FilterContext for FilterSystem<B> {
    fn apply_filter(
        &mut self,
        pass: FilterPass,
        input: &RenderTexture,
        output: PassTarget,
        clear: bool,
    ) -> FilterResult<()> {
        tracing::trace!(
            program = pass.program.0,
            input = input.surface().0,
            ?output,
            clear,
            legacy = pass.legacy,
            "filter pass"
        );
        self.backend.bind_target(output)?;
        if clear {
            self.backend.clear()?;
        }
        self.backend.bind_state(pass.state);
        self.backend.bind_shader(
            pass.program,
            &ShaderInputs {
                sampler: input.surface(),
                globals: &self.globals,
            },
        )?;
        let geometry = self.geometries.for_pass(pass.legacy, input)?;
        let mode = geometry.draw_mode();
        self.backend.bind_geometry(geometry)?;
        self.backend.draw(mode)
    }

    fn get_filter_texture(&mut self, resolution: Option<f64>) -> FilterResult<RenderTexture> {
        let active = self.active.ok_or_else(|| {
            FilterError::contract("filter texture requested outside of a filter pass")
        })?;
        let mut texture = self.pool.acquire(
            &mut self.backend,
            active.input_width,
            active.input_height,
            resolution.unwrap_or(active.input_resolution),
        )?;
        texture.set_filter_frame(active.input_filter_frame);
        Ok(texture)
    }

    fn get_filter_texture_like(
        &mut self,
        input: &RenderTexture,
        resolution: Option<f64>,
    ) -> FilterResult<RenderTexture> {
        let mut texture = self.pool.acquire(
            &mut self.backend,
            input.width(),
            input.height(),
            resolution.unwrap_or(input.resolution()),
        )?;
        texture.set_filter_frame(input.filter_frame());
        Ok(texture)
    }

    fn return_filter_texture(&mut self, texture: RenderTexture) -> FilterResult<()> {
        self.pool.release(&mut self.backend, texture)
    }

    fn calculate_sprite_matrix(&self, sprite: &dyn SpriteSource) -> FilterResult<Affine> {
        let active = self.active.as_ref().ok_or_else(|| {
            FilterError::contract("sprite matrix requested outside of a filter pass")
        })?;
        sprite_matrix(active.source_frame, active.destination_frame, sprite)
    }

    fn active_state(&self) -> Option<&ActiveState> {
        self.active.as_ref()
    }

    fn global_uniforms(&self) -> &GlobalUniforms {
        &self.globals
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/system.rs"]
mod tests;
