use crate::{
    filter::effect::SpriteSource,
    foundation::core::{Affine, Rect},
    foundation::error::{FilterError, FilterResult},
};

/// Matrix from a pass's normalized output coordinates to a sprite's normalized texture space.
///
/// Applied to a point, the result runs: output frame scale/offset, inverse world transform,
/// division by the sprite's original size, then the anchor offset.
pub fn sprite_matrix(
    source_frame: Rect,
    destination_frame: Rect,
    sprite: &dyn SpriteSource,
) -> FilterResult<Affine> {
    let orig = sprite.original_size();
    if !(orig.width > 0.0 && orig.height > 0.0) {
        return Err(FilterError::validation(format!(
            "sprite original size must be non-zero, got {}x{}",
            orig.width, orig.height
        )));
    }

    let world = sprite.world_transform();
    let det = world.determinant();
    if det == 0.0 || !det.is_finite() {
        return Err(FilterError::validation(
            "sprite world transform is not invertible",
        ));
    }

    let mapped = Affine::new([
        destination_frame.width(),
        0.0,
        0.0,
        destination_frame.height(),
        source_frame.x0,
        source_frame.y0,
    ]);

    Ok(Affine::translate(sprite.anchor())
        * Affine::scale_non_uniform(1.0 / orig.width, 1.0 / orig.height)
        * world.inverse()
        * mapped)
}

#[cfg(test)]
#[path = "../../tests/unit/filter/sprite.rs"]
mod tests;
