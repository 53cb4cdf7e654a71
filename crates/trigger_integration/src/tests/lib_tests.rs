use super::*;

#[tokio::test]
async fn emit_without_listeners_reports_zero() {
    let source = ChannelTriggerSource::new("router");
    assert_eq!(source.navigate("/home"), 0);
    assert_eq!(source.listener_count(), 0);
}

#[tokio::test]
async fn subscribers_receive_signals_in_order() {
    let source = ChannelTriggerSource::new("router");
    let mut rx = source.subscribe();

    assert_eq!(source.navigate("/orders"), 1);
    assert_eq!(source.page_ready(ReadyVia::ReadyStateCheck), 1);

    assert_eq!(
        rx.recv().await.expect("navigation"),
        HostSignal::NavigationChanged {
            route: "/orders".to_string()
        }
    );
    assert_eq!(
        rx.recv().await.expect("ready"),
        HostSignal::PageReady {
            via: ReadyVia::ReadyStateCheck
        }
    );
}

#[tokio::test]
async fn readiness_probe_tracks_navigation_and_ready() {
    let source = ChannelTriggerSource::new("router");
    assert!(!source.is_ready().await);

    source.page_ready(ReadyVia::LoadEvent);
    assert!(source.is_ready().await);

    source.navigate("/next");
    assert!(!source.is_ready().await);

    source.set_ready(true);
    assert!(source.is_ready().await);
}

#[tokio::test]
async fn dropped_receiver_no_longer_counts_as_listener() {
    let source = ChannelTriggerSource::new("router");
    let rx = source.subscribe();
    assert_eq!(source.listener_count(), 1);
    drop(rx);
    assert_eq!(source.listener_count(), 0);
}
