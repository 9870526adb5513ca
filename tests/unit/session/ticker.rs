use super::*;
use std::cell::Cell;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn counter() -> (Rc<Cell<u64>>, impl FnMut(TickInfo) -> TickControl + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    (hits, move |_| {
        h.set(h.get() + 1);
        TickControl::Continue
    })
}

#[test]
fn zero_interval_is_rejected() {
    let lp = TickLoop::new();
    let err = lp.schedule(Duration::ZERO, |_| TickControl::Continue);
    assert!(matches!(err, Err(VignetteError::Validation(_))));
}

#[test]
fn runs_once_per_elapsed_interval() {
    let lp = TickLoop::new();
    let (hits, body) = counter();
    lp.schedule(ms(16), body).unwrap();

    lp.advance(ms(15));
    assert_eq!(hits.get(), 0);
    lp.advance(ms(1));
    assert_eq!(hits.get(), 1);
    lp.advance(ms(48));
    assert_eq!(hits.get(), 4);
    assert_eq!(lp.now(), ms(64));
}

#[test]
fn info_reports_time_and_count() {
    let lp = TickLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    lp.advance(ms(5));
    lp.schedule(ms(10), move |info| {
        s.borrow_mut().push((info.now, info.dt, info.count));
        TickControl::Continue
    })
    .unwrap();
    lp.advance(ms(25));
    assert_eq!(
        *seen.borrow(),
        vec![(ms(15), ms(10), 1), (ms(25), ms(10), 2)]
    );
}

#[test]
fn tasks_run_in_due_order() {
    let lp = TickLoop::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    for (name, every) in [("slow", 30), ("fast", 20)] {
        let o = Rc::clone(&order);
        lp.schedule(ms(every), move |info| {
            o.borrow_mut().push((name, info.now));
            TickControl::Continue
        })
        .unwrap();
    }
    lp.advance(ms(60));
    assert_eq!(
        *order.borrow(),
        vec![
            ("fast", ms(20)),
            ("slow", ms(30)),
            ("fast", ms(40)),
            ("slow", ms(60)),
            ("fast", ms(60)),
        ]
    );
}

#[test]
fn cancel_stops_all_further_ticks() {
    let lp = TickLoop::new();
    let (hits, body) = counter();
    let h = lp.schedule(ms(10), body).unwrap();
    lp.advance(ms(30));
    assert_eq!(hits.get(), 3);

    assert_eq!(lp.cancel(h), CancelAck::Cancelled);
    assert!(!lp.is_scheduled(h));
    lp.advance(ms(100));
    assert_eq!(hits.get(), 3);
    assert_eq!(lp.live_tasks(), 0);
    assert_eq!(lp.cancel(h), CancelAck::NotScheduled);
}

#[test]
fn cancel_drops_body_captures() {
    let lp = TickLoop::new();
    let token = Rc::new(());
    let t = Rc::clone(&token);
    let h = lp
        .schedule(ms(10), move |_| {
            assert!(Rc::strong_count(&t) > 1);
            TickControl::Continue
        })
        .unwrap();
    assert_eq!(Rc::strong_count(&token), 2);
    lp.cancel(h);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn cancel_from_inside_tick_makes_it_the_last() {
    let lp = TickLoop::new();
    let hits = Rc::new(Cell::new(0));
    let acks = Rc::new(RefCell::new(Vec::new()));
    let (h2, a2, lp2) = (Rc::clone(&hits), Rc::clone(&acks), lp.clone());
    lp.schedule(ms(10), move |info| {
        h2.set(h2.get() + 1);
        if info.count == 2 {
            a2.borrow_mut().push(lp2.cancel(info.handle));
        }
        TickControl::Continue
    })
    .unwrap();

    lp.advance(ms(100));
    assert_eq!(hits.get(), 2);
    assert_eq!(*acks.borrow(), vec![CancelAck::CancelledInFlight]);
    assert_eq!(lp.live_tasks(), 0);
}

#[test]
fn stop_unschedules_task() {
    let lp = TickLoop::new();
    let hits = Rc::new(Cell::new(0));
    let h2 = Rc::clone(&hits);
    let h = lp
        .schedule(ms(5), move |info| {
            h2.set(h2.get() + 1);
            if info.count == 3 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        })
        .unwrap();
    lp.advance(ms(50));
    assert_eq!(hits.get(), 3);
    assert!(!lp.is_scheduled(h));
}

#[test]
fn stale_handle_does_not_cancel_slot_reuser() {
    let lp = TickLoop::new();
    let (_, first) = counter();
    let old = lp.schedule(ms(10), first).unwrap();
    lp.cancel(old);

    let (hits, second) = counter();
    let new = lp.schedule(ms(10), second).unwrap();
    assert_eq!(lp.cancel(old), CancelAck::NotScheduled);
    assert!(lp.is_scheduled(new));
    lp.advance(ms(10));
    assert_eq!(hits.get(), 1);
}

#[test]
fn advancing_past_the_end_of_time_saturates() {
    let lp = TickLoop::new();
    let (hits, body) = counter();
    let h = lp.schedule(Duration::MAX / 2 + ms(1), body).unwrap();
    lp.advance(ms(1));

    lp.advance(Duration::MAX);
    assert_eq!(lp.now(), Duration::MAX);
    assert_eq!(hits.get(), 1);
    assert!(lp.is_scheduled(h));

    lp.advance(Duration::MAX);
    assert_eq!(lp.now(), Duration::MAX);
    assert_eq!(hits.get(), 1);
}
