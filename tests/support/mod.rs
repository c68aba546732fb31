#![allow(dead_code)]

use std::collections::BTreeSet;
use std::rc::Rc;

use wavyte_filters::{
    DrawMode, DrawState, Filter, FilterResult, FilterTarget, GlobalUniforms, PassBackend,
    PassGeometry, PassTarget, ProgramId, Rect, ShaderInputs, SurfaceBackend, SurfaceId,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create {
        id: SurfaceId,
        width: u32,
        height: u32,
    },
    Resolution(SurfaceId, f64),
    Destroy(SurfaceId),
    Bind(PassTarget),
    Clear,
    State(DrawState),
    Shader {
        program: ProgramId,
        sampler: SurfaceId,
        globals: GlobalUniforms,
    },
    Geometry {
        mode: DrawMode,
        vertices: [f32; 8],
        uvs: Option<[f32; 8]>,
    },
    Draw(DrawMode),
}

/// One full-screen pass as seen by the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct PassRecord {
    pub program: ProgramId,
    pub input: SurfaceId,
    pub output: PassTarget,
    pub cleared: bool,
    pub globals: GlobalUniforms,
    pub mode: DrawMode,
    pub uvs: Option<[f32; 8]>,
}

pub struct RecordingBackend {
    next: u64,
    pub calls: Vec<Call>,
    pub live: BTreeSet<SurfaceId>,
    pub current: Option<SurfaceId>,
    pub source_frame: Rect,
    pub screen: Rect,
    pub fail_create: bool,
}

impl RecordingBackend {
    pub fn new(width: f64, height: f64) -> Self {
        let screen = Rect::new(0.0, 0.0, width, height);
        Self {
            next: 100,
            calls: Vec::new(),
            live: BTreeSet::new(),
            current: None,
            source_frame: screen,
            screen,
            fail_create: false,
        }
    }

    pub fn created(&self) -> Vec<(SurfaceId, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Create { id, width, height } => Some((*id, *width, *height)),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<SurfaceId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn passes(&self) -> Vec<PassRecord> {
        let mut out = Vec::new();
        let mut target = PassTarget::SCREEN;
        let mut cleared = false;
        let mut shader = None;
        let mut geometry = None;
        for call in &self.calls {
            match call {
                Call::Bind(t) => {
                    target = *t;
                    cleared = false;
                }
                Call::Clear => cleared = true,
                Call::Shader {
                    program,
                    sampler,
                    globals,
                } => shader = Some((*program, *sampler, *globals)),
                Call::Geometry { uvs, .. } => geometry = Some(*uvs),
                Call::Draw(mode) => {
                    let (program, input, globals) = shader.take().expect("draw without shader");
                    out.push(PassRecord {
                        program,
                        input,
                        output: target,
                        cleared,
                        globals,
                        mode: *mode,
                        uvs: geometry.take().flatten(),
                    });
                }
                _ => {}
            }
        }
        out
    }
}

impl SurfaceBackend for RecordingBackend {
    fn create_surface(&mut self, width: u32, height: u32) -> FilterResult<SurfaceId> {
        if self.fail_create {
            return Err(wavyte_filters::FilterError::surface("out of video memory"));
        }
        self.next += 1;
        let id = SurfaceId(self.next);
        self.live.insert(id);
        self.calls.push(Call::Create { id, width, height });
        Ok(id)
    }

    fn set_surface_resolution(&mut self, surface: SurfaceId, resolution: f64) {
        self.calls.push(Call::Resolution(surface, resolution));
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        assert!(self.live.remove(&surface), "double destroy of {surface:?}");
        self.calls.push(Call::Destroy(surface));
    }

    fn bind_target(&mut self, target: PassTarget) -> FilterResult<()> {
        self.current = target.surface;
        self.source_frame = target.frame.unwrap_or(self.screen);
        self.calls.push(Call::Bind(target));
        Ok(())
    }

    fn clear(&mut self) -> FilterResult<()> {
        self.calls.push(Call::Clear);
        Ok(())
    }

    fn current_target(&self) -> Option<SurfaceId> {
        self.current
    }

    fn current_source_frame(&self) -> Rect {
        self.source_frame
    }
}

impl PassBackend for RecordingBackend {
    fn bind_state(&mut self, state: DrawState) {
        self.calls.push(Call::State(state));
    }

    fn bind_shader(&mut self, program: ProgramId, inputs: &ShaderInputs<'_>) -> FilterResult<()> {
        self.calls.push(Call::Shader {
            program,
            sampler: inputs.sampler,
            globals: *inputs.globals,
        });
        Ok(())
    }

    fn bind_geometry(&mut self, geometry: PassGeometry<'_>) -> FilterResult<()> {
        let (vertices, uvs) = match geometry {
            PassGeometry::Unit(q) => (q.vertices, None),
            PassGeometry::Mapped(q) => (q.vertices, Some(q.uvs)),
        };
        self.calls.push(Call::Geometry {
            mode: geometry.draw_mode(),
            vertices,
            uvs,
        });
        Ok(())
    }

    fn draw(&mut self, mode: DrawMode) -> FilterResult<()> {
        self.calls.push(Call::Draw(mode));
        Ok(())
    }
}

pub struct Node {
    pub bounds: Rect,
    pub area: Option<Rect>,
}

impl FilterTarget for Node {
    fn filter_area(&self) -> Option<Rect> {
        self.area
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}

pub fn node(x0: f64, y0: f64, x1: f64, y1: f64) -> Rc<dyn FilterTarget> {
    Rc::new(Node {
        bounds: Rect::new(x0, y0, x1, y1),
        area: None,
    })
}

#[derive(Clone, Copy, Debug)]
pub struct TestFilter {
    pub program: u64,
    pub resolution: f64,
    pub padding: f64,
    pub auto_fit: bool,
    pub legacy: bool,
}

impl TestFilter {
    pub fn new(program: u64) -> Self {
        Self {
            program,
            resolution: 1.0,
            padding: 0.0,
            auto_fit: true,
            legacy: false,
        }
    }

    pub fn with_resolution(mut self, v: f64) -> Self {
        self.resolution = v;
        self
    }

    pub fn with_padding(mut self, v: f64) -> Self {
        self.padding = v;
        self
    }

    pub fn with_auto_fit(mut self, v: bool) -> Self {
        self.auto_fit = v;
        self
    }

    pub fn with_legacy(mut self, v: bool) -> Self {
        self.legacy = v;
        self
    }

    pub fn rc(self) -> Rc<dyn Filter> {
        Rc::new(self)
    }
}

impl Filter for TestFilter {
    fn program(&self) -> ProgramId {
        ProgramId(self.program)
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn padding(&self) -> f64 {
        self.padding
    }

    fn auto_fit(&self) -> bool {
        self.auto_fit
    }

    fn legacy(&self) -> bool {
        self.legacy
    }
}
