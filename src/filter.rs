pub(crate) mod effect;
pub(crate) mod geometry;
pub(crate) mod sprite;
pub(crate) mod state;
pub(crate) mod system;
pub(crate) mod uniforms;
