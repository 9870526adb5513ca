use super::*;
use crate::assets::storage::MemoryStorage;
use crate::surface::pool::{SharedSurfacePool, SurfaceKind, SurfacePool};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn asset() -> Asset {
    Asset::from_premul_rgba8("detail", 4, 3, &[255u8; 4 * 3 * 4]).unwrap()
}

fn opts(strict: bool) -> SessionOpts {
    SessionOpts {
        tick_interval: ms(10),
        animation_duration: ms(100),
        ease: Ease::Linear,
        looping: false,
        strict,
    }
}

fn session(ticker: &TickLoop, strict: bool) -> SessionController {
    SessionController::with_asset(asset(), ticker.clone(), opts(strict)).unwrap()
}

#[test]
fn lifecycle_moves_forward() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    assert_eq!(s.state(), SessionState::Created);
    assert!(s.tick_handle().is_none());
    assert_eq!(s.asset_native_size(), Some(PixelSize::new(4, 3)));

    s.open().unwrap();
    assert_eq!(s.state(), SessionState::Active);
    assert_eq!(ticker.live_tasks(), 1);

    s.close();
    assert_eq!(s.state(), SessionState::Destroyed);
    assert!(!s.holds_asset());
    assert!(s.tick_handle().is_none());
    assert_eq!(ticker.live_tasks(), 0);
}

#[test]
fn ticks_advance_eased_progress() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.open().unwrap();

    ticker.advance(ms(50));
    let f = s.frame();
    assert_eq!(f.ticks, 5);
    assert_eq!(f.elapsed, ms(50));
    assert!((f.progress - 0.5).abs() < 1e-9);

    ticker.advance(ms(500));
    assert_eq!(s.frame().progress, 1.0);
}

#[test]
fn no_ticks_after_close() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.open().unwrap();
    ticker.advance(ms(30));
    s.close();

    let before = ticker.invocations();
    ticker.advance(ms(100));
    assert_eq!(ticker.invocations(), before);
    assert_eq!(s.frame().ticks, 3);
}

#[test]
fn dropping_active_controller_frees_session() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.open().unwrap();
    ticker.advance(ms(20));
    let observer = s.observer();
    assert!(observer.is_alive());

    drop(s);
    assert!(!observer.is_alive());
    assert!(observer.frame().is_none());
    assert_eq!(ticker.live_tasks(), 0);
    let before = ticker.invocations();
    ticker.advance(ms(100));
    assert_eq!(ticker.invocations(), before);
}

#[test]
fn repeated_open_close_cycles_leave_nothing_resident() {
    let ticker = TickLoop::new();
    let observers: Vec<SessionObserver> = (0..20)
        .map(|_| {
            let mut s = session(&ticker, true);
            s.open().unwrap();
            ticker.advance(ms(10));
            s.close();
            s.observer()
        })
        .collect();
    assert!(observers.iter().all(|o| !o.is_alive()));
    assert_eq!(ticker.live_tasks(), 0);
}

#[test]
fn double_close_is_noop() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.open().unwrap();
    s.close();
    s.close();
    assert_eq!(s.state(), SessionState::Destroyed);
}

#[test]
fn close_before_open_does_nothing() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.close();
    assert_eq!(s.state(), SessionState::Created);
    assert!(s.holds_asset());
}

#[test]
fn open_twice_is_invalid_state_when_strict() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.open().unwrap();
    assert!(matches!(s.open(), Err(VignetteError::InvalidState(_))));
    assert_eq!(ticker.live_tasks(), 1);
}

#[test]
fn open_twice_is_ignored_when_lenient() {
    let ticker = TickLoop::new();
    let mut s = session(&ticker, false);
    s.open().unwrap();
    s.open().unwrap();
    assert_eq!(s.state(), SessionState::Active);
    assert_eq!(ticker.live_tasks(), 1);

    s.close();
    assert!(s.open().is_ok());
    assert_eq!(s.state(), SessionState::Destroyed);
}

#[test]
fn zero_tick_interval_is_rejected() {
    let mut o = opts(true);
    o.tick_interval = Duration::ZERO;
    let err = SessionController::with_asset(asset(), TickLoop::new(), o).unwrap_err();
    assert!(matches!(err, VignetteError::Validation(_)));
}

#[test]
fn create_reports_missing_asset() {
    let source = AssetSource::new(MemoryStorage::new());
    let err = SessionController::create(
        &source,
        &AssetId::from("gone"),
        TickLoop::new(),
        opts(true),
    )
    .unwrap_err();
    assert!(matches!(err, VignetteError::NotFound(_)));
}

#[test]
fn destroy_releases_attached_surface() {
    let pool: SharedSurfacePool = Rc::new(RefCell::new(SurfacePool::default()));
    let kind = SurfaceKind::new("detail");
    let ticker = TickLoop::new();
    let mut s = session(&ticker, true);
    s.attach_surface(SurfaceLease::acquire(&pool, &kind)).unwrap();
    let id = s.surface().unwrap();
    assert!(matches!(
        pool.borrow().get(id).unwrap().content(),
        Some(SurfaceContent::Detail(a)) if a.as_str() == "detail"
    ));

    s.open().unwrap();
    s.close();
    assert!(s.surface().is_none());
    assert_eq!(pool.borrow().stats().kind(&kind).in_use, 0);
}
