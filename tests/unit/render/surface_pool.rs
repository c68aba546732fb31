use super::*;
use crate::foundation::core::{Rect, SurfaceId};
use crate::render::backend::PassTarget;

#[derive(Default)]
struct MockSurfaces {
    next: u64,
    created: Vec<(SurfaceId, u32, u32)>,
    destroyed: Vec<SurfaceId>,
    resolutions: Vec<(SurfaceId, f64)>,
}

impl SurfaceBackend for MockSurfaces {
    fn create_surface(&mut self, width: u32, height: u32) -> FilterResult<SurfaceId> {
        self.next += 1;
        let id = SurfaceId(self.next);
        self.created.push((id, width, height));
        Ok(id)
    }

    fn set_surface_resolution(&mut self, surface: SurfaceId, resolution: f64) {
        self.resolutions.push((surface, resolution));
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.destroyed.push(surface);
    }

    fn bind_target(&mut self, _target: PassTarget) -> FilterResult<()> {
        Ok(())
    }

    fn clear(&mut self) -> FilterResult<()> {
        Ok(())
    }

    fn current_target(&self) -> Option<SurfaceId> {
        None
    }

    fn current_source_frame(&self) -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }
}

fn screen_pool(backend: &mut MockSurfaces) -> SurfacePool {
    let mut p = SurfacePool::new(SurfacePoolOpts::default());
    p.on_resize(backend, PixelSize::new(800, 600));
    p
}

#[test]
fn acquire_rounds_to_power_of_two() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 100.0, 30.0, 1.0).unwrap();
    assert_eq!(t.real_size(), PixelSize::new(128, 32));
    assert_eq!(t.bucket(), BucketKey::sized(128, 32).unwrap());
    assert!(t.width() >= 100.0 && t.height() >= 30.0);
    assert_eq!(b.created, vec![(t.surface(), 128, 32)]);
}

#[test]
fn acquire_scales_by_resolution() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 100.0, 30.0, 2.0).unwrap();
    assert_eq!(t.real_size(), PixelSize::new(256, 64));
    assert_eq!(t.resolution(), 2.0);
    assert_eq!(t.width(), 128.0);
    assert_eq!(b.resolutions.last(), Some(&(t.surface(), 2.0)));
}

#[test]
fn screen_sized_request_uses_screen_bucket() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 400.0, 300.0, 2.0).unwrap();
    assert_eq!(t.bucket(), BucketKey::Screen);
    assert_eq!(t.real_size(), PixelSize::new(800, 600));
}

#[test]
fn screen_bucket_disabled_without_screen_size() {
    let mut b = MockSurfaces::default();
    let mut p = SurfacePool::new(SurfacePoolOpts::default());

    let t = p.acquire(&mut b, 0.0, 0.0, 1.0).unwrap();
    assert_eq!(t.bucket(), BucketKey::sized(1, 1).unwrap());
}

#[test]
fn released_texture_is_reused_from_same_bucket() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 100.0, 100.0, 1.0).unwrap();
    let id = t.surface();
    let key = t.bucket();
    p.release(&mut b, t).unwrap();
    assert_eq!(p.retained_in(key), 1);

    let again = p.acquire(&mut b, 120.0, 65.0, 1.0).unwrap();
    assert_eq!(again.surface(), id);
    assert_eq!(again.filter_frame(), None);
    assert_eq!(b.created.len(), 1);

    let st = p.stats();
    assert_eq!(st.reused_surfaces, 1);
    assert_eq!(st.outstanding_surfaces, 1);
    assert_eq!(st.retained_surfaces, 0);
}

#[test]
fn release_clears_filter_frame() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let mut t = p.acquire(&mut b, 10.0, 10.0, 1.0).unwrap();
    t.set_filter_frame(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    p.release(&mut b, t).unwrap();
    let t = p.acquire(&mut b, 10.0, 10.0, 1.0).unwrap();
    assert_eq!(t.filter_frame(), None);
}

#[test]
fn oversized_request_is_a_contract_violation() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let err = p.acquire(&mut b, 40_000.0, 10.0, 1.0).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(b.created.is_empty());
}

#[test]
fn foreign_texture_release_is_rejected() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);
    let mut other = screen_pool(&mut b);

    let t = other.acquire(&mut b, 10.0, 10.0, 1.0).unwrap();
    let err = p.release(&mut b, t).unwrap_err();
    assert!(err.is_contract_violation());
}

#[test]
fn pool_honors_bucket_cap() {
    let mut b = MockSurfaces::default();
    let mut p = SurfacePool::new(SurfacePoolOpts::default().with_max_surfaces_per_bucket(Some(1)));

    let x = p.acquire(&mut b, 8.0, 8.0, 1.0).unwrap();
    let y = p.acquire(&mut b, 8.0, 8.0, 1.0).unwrap();
    let y_id = y.surface();
    p.release(&mut b, x).unwrap();
    p.release(&mut b, y).unwrap();

    let st = p.stats();
    assert_eq!(st.retained_surfaces, 1);
    assert_eq!(st.dropped_on_release, 1);
    assert_eq!(b.destroyed, vec![y_id]);
}

#[test]
fn resize_destroys_only_screen_bucket() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let screen = p.acquire(&mut b, 800.0, 600.0, 1.0).unwrap();
    let sized = p.acquire(&mut b, 50.0, 50.0, 1.0).unwrap();
    let (screen_id, sized_id) = (screen.surface(), sized.surface());
    p.release(&mut b, screen).unwrap();
    p.release(&mut b, sized).unwrap();

    p.on_resize(&mut b, PixelSize::new(1024, 768));
    assert_eq!(b.destroyed, vec![screen_id]);
    assert_eq!(p.retained_in(BucketKey::Screen), 0);
    assert_eq!(p.screen_size(), PixelSize::new(1024, 768));

    let t = p.acquire(&mut b, 50.0, 50.0, 1.0).unwrap();
    assert_eq!(t.surface(), sized_id);
    let s = p.acquire(&mut b, 1024.0, 768.0, 1.0).unwrap();
    assert_ne!(s.surface(), screen_id);
    assert_eq!(s.real_size(), PixelSize::new(1024, 768));
}

#[test]
fn resize_to_same_size_is_noop() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 800.0, 600.0, 1.0).unwrap();
    p.release(&mut b, t).unwrap();
    p.on_resize(&mut b, PixelSize::new(800, 600));
    assert!(b.destroyed.is_empty());
    assert_eq!(p.retained_in(BucketKey::Screen), 1);
}

#[test]
fn stale_screen_texture_is_destroyed_on_release() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let t = p.acquire(&mut b, 800.0, 600.0, 1.0).unwrap();
    let id = t.surface();
    p.on_resize(&mut b, PixelSize::new(640, 480));
    p.release(&mut b, t).unwrap();

    assert_eq!(b.destroyed, vec![id]);
    assert_eq!(p.retained_in(BucketKey::Screen), 0);
    assert_eq!(p.stats().outstanding_surfaces, 0);
}

#[test]
fn drain_destroys_everything_retained() {
    let mut b = MockSurfaces::default();
    let mut p = screen_pool(&mut b);

    let a = p.acquire(&mut b, 800.0, 600.0, 1.0).unwrap();
    let c = p.acquire(&mut b, 10.0, 10.0, 1.0).unwrap();
    let d = p.acquire(&mut b, 300.0, 10.0, 1.0).unwrap();
    p.release(&mut b, a).unwrap();
    p.release(&mut b, c).unwrap();
    p.release(&mut b, d).unwrap();

    p.drain(&mut b);
    assert_eq!(b.destroyed.len(), 3);
    let st = p.stats();
    assert_eq!(st.retained_surfaces, 0);
    assert_eq!(st.destroyed_surfaces, 3);

    let _ = p.acquire(&mut b, 10.0, 10.0, 1.0).unwrap();
    assert_eq!(b.created.len(), 4);
}
