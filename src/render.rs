pub(crate) mod backend;
pub(crate) mod surface_pool;
pub(crate) mod texture;
