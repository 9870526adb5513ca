use super::*;

fn row() -> SurfaceKind {
    SurfaceKind::new("row")
}

#[test]
fn scrolling_many_rows_constructs_only_visible_count() {
    let mut pool = SurfacePool::default();
    let kind = row();
    let visible = 6;

    let mut window: std::collections::VecDeque<SurfaceId> = (0..visible)
        .map(|_| pool.acquire(&kind))
        .collect();
    for _ in 0..500 {
        let gone = window.pop_front().unwrap();
        pool.release(gone);
        window.push_back(pool.acquire(&kind));
    }

    let stats = pool.stats().kind(&kind);
    assert_eq!(stats.constructed, visible);
    assert_eq!(stats.in_use, visible);
    assert_eq!(stats.high_water, visible);
    assert_eq!(pool.len(), visible);
    assert_eq!(pool.stats().reuses, 500);
}

#[test]
fn released_surface_is_reused_with_same_identity() {
    let mut pool = SurfacePool::default();
    let a = pool.acquire(&row());
    pool.release(a);
    let b = pool.acquire(&row());
    assert!(a.same_surface(b));
    assert_eq!(a.slot(), b.slot());
    assert_eq!(pool.get(b).unwrap().uses(), 2);
    assert_eq!(pool.get(b).unwrap().state(), SurfaceState::InUse);
}

#[test]
fn release_clears_content() {
    let mut pool = SurfacePool::default();
    let id = pool.acquire(&row());
    pool.assign(id, SurfaceContent::Detail(AssetId::new("x")))
        .unwrap();
    assert!(pool.get(id).unwrap().content().is_some());
    pool.release(id);
    assert!(pool.get(id).is_none());

    let again = pool.acquire(&row());
    assert!(again.same_surface(id));
    assert!(pool.get(again).unwrap().content().is_none());
}

#[test]
fn kinds_do_not_share_surfaces() {
    let mut pool = SurfacePool::default();
    let r = pool.acquire(&row());
    pool.release(r);
    let d = pool.acquire(&SurfaceKind::new("detail"));
    assert!(!r.same_surface(d));
    assert_eq!(pool.get(d).unwrap().kind().as_str(), "detail");
    assert_eq!(pool.stats().kind(&row()).idle(), 1);
}

#[test]
fn double_release_is_rejected_without_changing_state() {
    let mut pool = SurfacePool::default();
    let id = pool.acquire(&row());
    pool.try_release(id).unwrap();
    let before = pool.stats().kind(&row());

    let err = pool.try_release(id).unwrap_err();
    assert!(matches!(err, VignetteError::PoolCorruption(_)));
    assert_eq!(pool.stats().kind(&row()), before);

    // The lenient path ignores it too; the idle set must not hold the slot twice.
    pool.release(id);
    let a = pool.acquire(&row());
    let b = pool.acquire(&row());
    assert_ne!(a, b);
    assert_eq!(pool.stats().rejected_releases, 2);
}

#[test]
fn foreign_handle_is_rejected() {
    let mut ours = SurfacePool::default();
    let mut theirs = SurfacePool::default();
    let _mine = ours.acquire(&row());
    let foreign = theirs.acquire(&row());

    assert!(!ours.owns(foreign));
    assert!(ours.get(foreign).is_none());
    assert!(matches!(
        ours.try_release(foreign),
        Err(VignetteError::PoolCorruption(_))
    ));
    assert!(matches!(
        ours.assign(foreign, SurfaceContent::Detail(AssetId::new("x"))),
        Err(VignetteError::PoolCorruption(_))
    ));
    assert_eq!(ours.stats().kind(&row()).in_use, 1);
}

#[test]
fn assign_requires_in_use_surface() {
    let mut pool = SurfacePool::default();
    let id = pool.acquire(&row());
    pool.release(id);
    assert!(pool
        .assign(id, SurfaceContent::Detail(AssetId::new("x")))
        .is_err());
}

#[test]
fn soft_cap_only_warns() {
    let mut pool = SurfacePool::new(SurfacePoolOpts {
        soft_cap_per_kind: Some(2),
    });
    let ids: Vec<_> = (0..4).map(|_| pool.acquire(&row())).collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(pool.stats().kind(&row()).constructed, 4);
}

#[test]
fn lease_releases_on_drop() {
    let pool: SharedSurfacePool = Rc::new(RefCell::new(SurfacePool::default()));
    let kind = SurfaceKind::new("detail");
    let lease = SurfaceLease::acquire(&pool, &kind);
    lease
        .assign(SurfaceContent::Detail(AssetId::new("x")))
        .unwrap();
    assert_eq!(pool.borrow().stats().kind(&kind).in_use, 1);

    let id = lease.id();
    drop(lease);
    assert_eq!(pool.borrow().stats().kind(&kind).in_use, 0);
    assert!(pool.borrow().get(id).is_none());
    let again = pool.borrow_mut().acquire(&kind);
    assert!(again.same_surface(id));
    assert!(pool.borrow().get(again).unwrap().content().is_none());
}

#[test]
fn lease_outliving_pool_is_harmless() {
    let pool: SharedSurfacePool = Rc::new(RefCell::new(SurfacePool::default()));
    let lease = SurfaceLease::acquire(&pool, &row());
    drop(pool);
    assert!(matches!(
        lease.assign(SurfaceContent::Detail(AssetId::new("x"))),
        Err(VignetteError::InvalidState(_))
    ));
    drop(lease);
}

#[test]
fn stale_handle_cannot_release_surface_of_new_owner() {
    let mut pool = SurfacePool::default();
    let first = pool.acquire(&row());
    pool.release(first);
    let second = pool.acquire(&row());
    assert!(second.same_surface(first));
    pool.assign(second, SurfaceContent::Detail(AssetId::new("owner2")))
        .unwrap();

    assert!(matches!(
        pool.try_release(first),
        Err(VignetteError::PoolCorruption(_))
    ));
    pool.release(first);
    assert!(matches!(
        pool.assign(first, SurfaceContent::Detail(AssetId::new("stale"))),
        Err(VignetteError::PoolCorruption(_))
    ));
    assert!(pool.get(first).is_none());

    let held = pool.get(second).unwrap();
    assert_eq!(held.state(), SurfaceState::InUse);
    assert!(matches!(
        held.content(),
        Some(SurfaceContent::Detail(a)) if a.as_str() == "owner2"
    ));
    assert_eq!(pool.stats().kind(&row()).in_use, 1);
    assert_eq!(pool.stats().rejected_releases, 2);

    let third = pool.acquire(&row());
    assert!(!third.same_surface(second));
}

#[test]
fn lease_survives_host_recycling_its_surface() {
    let pool: SharedSurfacePool = Rc::new(RefCell::new(SurfacePool::default()));
    let kind = SurfaceKind::new("detail");
    let lease = SurfaceLease::acquire(&pool, &kind);
    pool.borrow_mut().release(lease.id());
    let other = pool.borrow_mut().acquire(&kind);

    drop(lease);
    assert_eq!(pool.borrow().get(other).unwrap().state(), SurfaceState::InUse);
    assert_eq!(pool.borrow().stats().kind(&kind).in_use, 1);
}
