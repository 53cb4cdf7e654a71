use super::*;

#[test]
fn new_session_is_delaying_without_start_time() {
    let now = Instant::now();
    let session = Session::begin(CycleId(1), now);

    assert_eq!(session.phase(), Phase::Delaying);
    assert_eq!(session.requested_at(), now);
    assert_eq!(session.started_at(), None);
    assert!(!session.is_visible());
    assert_eq!(session.visible_elapsed(now), None);
}

#[test]
fn phases_only_advance_forward() {
    let requested = Instant::now();
    let mut session = Session::begin(CycleId(7), requested);

    assert!(!session.settle(), "cannot settle before becoming visible");

    let shown = requested + Duration::from_millis(150);
    assert!(session.activate(shown));
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.started_at(), Some(shown));
    assert!(!session.activate(shown + Duration::from_millis(1)));
    assert_eq!(session.started_at(), Some(shown));

    assert!(session.settle());
    assert_eq!(session.phase(), Phase::Settling);
    assert!(session.is_visible());
    assert!(!session.settle());
    assert!(!session.activate(shown));
}

#[test]
fn visible_elapsed_is_measured_from_activation() {
    let requested = Instant::now();
    let mut session = Session::begin(CycleId(2), requested);
    let shown = requested + Duration::from_millis(100);
    session.activate(shown);

    assert_eq!(
        session.visible_elapsed(shown + Duration::from_millis(40)),
        Some(Duration::from_millis(40))
    );
    assert_eq!(session.visible_elapsed(requested), Some(Duration::ZERO));
}
