use super::roku_power::{PowerStateDriver, TOPIC_NAME};
use super::{StateSource, Unconfigured};
use crate::connection::Connection;
use crate::device::POWER_OFFLINE;
use crate::hub::Hub;
use crate::transport::message::ServerMessage;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tungstenite::protocol::Message as WsMessage;

const INTERVAL: Duration = Duration::from_secs(2);

/// Replays a fixed script of states, repeating the last one forever.
#[derive(Debug)]
struct ScriptedSource {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    queries: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(states: &[&str]) -> (Self, Arc<AtomicUsize>) {
        let queries = Arc::new(AtomicUsize::new(0));
        let source = Self {
            script: Mutex::new(states.iter().map(|s| s.to_string()).collect()),
            last: Mutex::new(POWER_OFFLINE.to_string()),
            queries: queries.clone(),
        };
        (source, queries)
    }
}

impl StateSource for ScriptedSource {
    async fn query_state(&self) -> String {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock();
        if let Some(next) = self.script.lock().pop_front() {
            *last = next;
        }
        last.clone()
    }
}

fn registered(hub: &Hub) -> (Connection, UnboundedReceiver<WsMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = Connection::new(tx);
    hub.register_connection(conn.clone());
    (conn, rx)
}

fn power_modes(rx: &mut UnboundedReceiver<WsMessage>) -> Vec<String> {
    let mut modes = Vec::new();
    while let Ok(WsMessage::Text(text)) = rx.try_recv() {
        match serde_json::from_str::<ServerMessage>(text.as_str()).unwrap() {
            ServerMessage::PowerState { power_mode, .. } => modes.push(power_mode),
            other => panic!("Expected power_state, got {other:?}"),
        }
    }
    modes
}

#[test]
fn test_register_keeps_first_driver() {
    let hub = Arc::new(Hub::new());
    let (source, _) = ScriptedSource::new(&[]);
    let (again, _) = ScriptedSource::new(&[]);

    let first = PowerStateDriver::register(&hub, source, INTERVAL);
    let second = PowerStateDriver::register(&hub, again, INTERVAL);
    first.observe(&hub, "PowerOn".to_string());

    // catch-up comes from the first driver's hooks; the second has no state
    let (conn, mut rx) = registered(&hub);
    hub.subscribe(&conn, TOPIC_NAME);
    assert_eq!(power_modes(&mut rx), vec!["PowerOn"]);
    assert_eq!(second.last_known(), None);
    assert_eq!(hub.subscriber_count(TOPIC_NAME), 1);
}

#[test]
fn test_observe_broadcasts_only_on_change() {
    let hub = Arc::new(Hub::new());
    let (source, _) = ScriptedSource::new(&[]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (conn, mut rx) = registered(&hub);
    hub.subscribe(&conn, TOPIC_NAME);

    assert!(driver.observe(&hub, "PowerOn".to_string()));
    assert!(!driver.observe(&hub, "PowerOn".to_string()));
    assert!(driver.observe(&hub, POWER_OFFLINE.to_string()));
    assert!(!driver.observe(&hub, POWER_OFFLINE.to_string()));

    assert_eq!(power_modes(&mut rx), vec!["PowerOn", POWER_OFFLINE]);
    assert_eq!(driver.last_known().as_deref(), Some(POWER_OFFLINE));
}

#[test]
fn test_catch_up_goes_to_new_subscriber_only() {
    let hub = Arc::new(Hub::new());
    let (source, _) = ScriptedSource::new(&[]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, mut ra) = registered(&hub);
    let (b, mut rb) = registered(&hub);

    hub.subscribe(&a, TOPIC_NAME);
    assert!(power_modes(&mut ra).is_empty());

    driver.observe(&hub, "PowerStandby".to_string());
    assert_eq!(power_modes(&mut ra), vec!["PowerStandby"]);

    hub.subscribe(&b, TOPIC_NAME);
    assert_eq!(power_modes(&mut rb), vec!["PowerStandby"]);
    assert!(power_modes(&mut ra).is_empty());
}

#[test]
fn test_first_subscribe_without_runtime_does_not_break_subscribe() {
    let hub = Arc::new(Hub::new());
    let (source, queries) = ScriptedSource::new(&["PowerOn"]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (conn, _rx) = registered(&hub);

    hub.subscribe(&conn, TOPIC_NAME);

    assert!(hub.is_subscribed(&conn, TOPIC_NAME));
    assert!(!driver.poller_started());
    assert_eq!(queries.load(Ordering::SeqCst), 0);
}

#[test]
fn test_later_subscribe_starts_poller_after_runtime_less_first_subscribe() {
    let hub = Arc::new(Hub::new());
    let (source, queries) = ScriptedSource::new(&["PowerOn"]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, _ra) = registered(&hub);
    let (b, mut rb) = registered(&hub);

    hub.subscribe(&a, TOPIC_NAME);
    assert!(hub.topic_started(TOPIC_NAME));
    assert!(!driver.poller_started());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    rt.block_on(async {
        hub.unsubscribe(&a, TOPIC_NAME);
        hub.subscribe(&b, TOPIC_NAME);
        assert!(driver.poller_started());

        tokio::time::sleep(Duration::from_millis(10)).await;
    });

    assert_eq!(queries.load(Ordering::SeqCst), 1);
    assert_eq!(power_modes(&mut rb), vec!["PowerOn"]);
}

#[tokio::test(start_paused = true)]
async fn test_subscriber_waits_for_first_poll() {
    let hub = Arc::new(Hub::new());
    let (source, _) = ScriptedSource::new(&["PowerOn"]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, mut ra) = registered(&hub);

    hub.subscribe(&a, TOPIC_NAME);
    assert!(driver.poller_started());
    assert!(power_modes(&mut ra).is_empty());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(power_modes(&mut ra), vec!["PowerOn"]);

    // steady state: no further messages
    tokio::time::sleep(INTERVAL * 3).await;
    assert!(power_modes(&mut ra).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_change_reaches_all_subscribers_only() {
    let hub = Arc::new(Hub::new());
    let (source, _) = ScriptedSource::new(&["PowerOn", "PowerOn", "DisplayOff"]);
    PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, mut ra) = registered(&hub);
    let (b, mut rb) = registered(&hub);
    let (_c, mut rc) = registered(&hub);

    hub.subscribe(&a, TOPIC_NAME);
    hub.subscribe(&b, TOPIC_NAME);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(power_modes(&mut ra), vec!["PowerOn"]);
    assert_eq!(power_modes(&mut rb), vec!["PowerOn"]);

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(power_modes(&mut ra), vec!["DisplayOff"]);
    assert_eq!(power_modes(&mut rb), vec!["DisplayOff"]);
    assert!(power_modes(&mut rc).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poller_starts_once() {
    let hub = Arc::new(Hub::new());
    let (source, queries) = ScriptedSource::new(&["PowerOn"]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, _ra) = registered(&hub);
    let (b, _rb) = registered(&hub);

    hub.subscribe(&a, TOPIC_NAME);
    hub.unsubscribe(&a, TOPIC_NAME);
    hub.subscribe(&b, TOPIC_NAME);
    assert!(!driver.start_poller().unwrap());

    // polls at t = 0, 2, 4, 6
    tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;
    assert_eq!(queries.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_poller_exits_when_hub_is_dropped() {
    let hub = Arc::new(Hub::new());
    let (source, queries) = ScriptedSource::new(&["PowerOn"]);
    let driver = PowerStateDriver::register(&hub, source, INTERVAL);
    let (a, _ra) = registered(&hub);
    hub.subscribe(&a, TOPIC_NAME);
    tokio::time::sleep(Duration::from_millis(10)).await;

    drop(a);
    drop(hub);
    tokio::time::sleep(INTERVAL * 3).await;
    let after_drop = queries.load(Ordering::SeqCst);
    tokio::time::sleep(INTERVAL * 3).await;

    assert_eq!(queries.load(Ordering::SeqCst), after_drop);
    assert!(driver.poller_started());
}

#[tokio::test]
async fn test_unconfigured_source_reports_offline() {
    assert_eq!(Unconfigured.query_state().await, POWER_OFFLINE);
}
