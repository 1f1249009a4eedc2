use super::{AcceptStrategy, NetDebug, StreamConfig};
use crate::common::{ListenerCapabilities, SharedSink, Stream};
use crate::memory::{MemoryConnector, MemoryListener};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

fn started(config: StreamConfig) -> (NetDebug<MemoryListener>, MemoryConnector) {
    let listener = MemoryListener::new();
    let connector = listener.connector();
    let mut debug = NetDebug::with_config(listener, config);
    debug.begin().unwrap();
    (debug, connector)
}

fn console() -> (Rc<RefCell<Vec<u8>>>, SharedSink) {
    let console = Rc::new(RefCell::new(Vec::new()));
    let shared: SharedSink = console.clone();
    (console, shared)
}

#[test]
fn test_new_adapter_defaults() {
    let (debug, _connector) = started(StreamConfig::default());
    assert!(!debug.is_echo());
    assert!(!debug.is_cr_before_lf());
    assert!(!debug.has_client());
    assert!(!debug.has_mirror());
    assert_eq!(debug.strategy(), AcceptStrategy::PollAndReplace);
}

#[test]
fn test_write_without_client_or_mirror_is_dropped() {
    let (mut debug, _connector) = started(StreamConfig::default());
    for byte in [b'a', b'\n', 0, 0xff] {
        assert_eq!(debug.write(byte), 0);
    }
    assert_eq!(debug.print("lost"), 0);
}

#[test]
fn test_write_goes_to_mirror_without_client() {
    let (mut debug, _connector) = started(StreamConfig::default());
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));

    assert_eq!(debug.print("boot"), 4);
    assert_eq!(&console.borrow()[..], b"boot");
}

#[test]
fn test_client_is_greeted_on_adoption() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();

    assert_eq!(debug.available(), 0);
    assert!(debug.has_client());
    assert_eq!(client.take_received(), b"Hi!\r\n");
}

#[test]
fn test_custom_and_empty_greeting() {
    let (mut debug, connector) = started(StreamConfig::default().with_greeting("hello\n"));
    let client = connector.connect().unwrap();
    debug.available();
    assert_eq!(client.take_received(), b"hello\n");

    let (mut debug, connector) = started(StreamConfig::default().with_greeting(""));
    let client = connector.connect().unwrap();
    debug.available();
    assert!(client.received().is_empty());
    assert!(debug.has_client());
}

#[test]
fn test_new_client_replaces_old_one() {
    let (mut debug, connector) = started(StreamConfig::default());
    let first = connector.connect().unwrap();
    debug.available();

    let second = connector.connect().unwrap();
    debug.available();
    assert!(first.is_closed_by_server());
    assert!(!second.is_closed_by_server());

    debug.print("x");
    assert_eq!(first.received(), b"Hi!\r\n");
    assert_eq!(second.received(), b"Hi!\r\nx");
}

#[test]
fn test_only_available_adopts_clients() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    client.send(b"q");

    assert_eq!(debug.read(), None);
    assert_eq!(debug.peek(), None);
    assert_eq!(debug.write(b'a'), 0);
    assert!(!debug.has_client());

    assert_eq!(debug.available(), 1);
    assert_eq!(debug.read(), Some(b'q'));
}

#[test]
fn test_take_if_waiting_adopts_without_greeting() {
    let listener = MemoryListener::with_capabilities(ListenerCapabilities {
        can_query_pending: false,
        can_close: true,
    });
    let connector = listener.connector();
    let mut debug = NetDebug::new(listener);
    debug.begin().unwrap();
    assert_eq!(debug.strategy(), AcceptStrategy::TakeIfWaiting);

    let first = connector.connect().unwrap();
    debug.available();
    let second = connector.connect().unwrap();
    debug.available();

    assert!(first.is_closed_by_server());
    assert!(first.received().is_empty());
    debug.print("ok");
    assert_eq!(second.received(), b"ok");
}

#[test]
fn test_forced_take_if_waiting_on_capable_listener() {
    let (mut debug, connector) =
        started(StreamConfig::default().with_strategy(AcceptStrategy::TakeIfWaiting));
    let client = connector.connect().unwrap();
    debug.available();
    assert!(debug.has_client());
    assert!(client.received().is_empty());
}

#[test]
fn test_cr_before_lf_reaches_client_and_mirror() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();
    client.take_received();

    let (console, mirror) = console();
    debug.mirror(Some(&mirror));
    debug.cr_before_lf(true);

    assert_eq!(debug.write(b'\n'), 1);
    assert_eq!(client.take_received(), b"\r\n");
    assert_eq!(&console.borrow()[..], b"\r\n");
}

#[test]
fn test_cr_before_lf_off_leaves_bytes_alone() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();
    client.take_received();

    debug.print("a\nb\r\n");
    assert_eq!(client.take_received(), b"a\nb\r\n");
}

#[test]
fn test_cr_before_lf_applies_to_mirror_alone() {
    let (mut debug, _connector) = started(StreamConfig::default().with_cr_before_lf(true));
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));

    assert_eq!(debug.print("a\nb"), 3);
    assert_eq!(&console.borrow()[..], b"a\r\nb");
}

#[test]
fn test_echo_consumes_input() {
    let (mut debug, connector) = started(StreamConfig::default());
    debug.echo(true);
    let client = connector.connect().unwrap();
    client.send(&[0x41, 0x42]);

    assert_eq!(debug.available(), 0);
    assert_eq!(client.take_received(), b"Hi!\r\nAB");
    assert_eq!(debug.read(), None);
}

#[test]
fn test_echo_is_raw_and_not_mirrored() {
    let (mut debug, connector) =
        started(StreamConfig::default().with_echo(true).with_cr_before_lf(true));
    let client = connector.connect().unwrap();
    debug.available();
    client.take_received();

    let (console, mirror) = console();
    debug.mirror(Some(&mirror));
    client.send(b"x\n");
    assert_eq!(debug.available(), 0);
    assert_eq!(client.take_received(), b"x\n");
    assert!(console.borrow().is_empty());
}

#[test]
fn test_available_reports_presence_not_count() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    client.send(&[1, 2, 3]);

    assert_eq!(debug.available(), 1);
    assert_eq!(debug.peek(), Some(1));
    assert_eq!(debug.read(), Some(1));
    assert_eq!(debug.read(), Some(2));
    assert_eq!(debug.read(), Some(3));
    assert_eq!(debug.read(), None);
    assert_eq!(debug.available(), 0);
}

#[test]
fn test_end_is_idempotent() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();

    debug.end();
    assert!(!debug.has_client());
    assert!(client.is_closed_by_server());
    assert!(connector.connect().is_err());

    debug.end();
    assert!(!debug.has_client());
    assert_eq!(debug.write(b'a'), 0);
}

#[test]
fn test_end_keeps_listener_without_close_capability() {
    let listener = MemoryListener::with_capabilities(ListenerCapabilities {
        can_query_pending: true,
        can_close: false,
    });
    let connector = listener.connector();
    let mut debug = NetDebug::new(listener);
    debug.begin().unwrap();

    debug.end();
    let client = connector.connect().unwrap();
    debug.available();
    assert!(debug.has_client());
    assert_eq!(client.received(), b"Hi!\r\n");
}

#[test]
fn test_begin_after_end_listens_again() {
    let (mut debug, connector) = started(StreamConfig::default());
    debug.end();
    debug.begin_serial(115_200_u32).unwrap();
    assert!(connector.connect().is_ok());
}

#[test]
fn test_disconnected_client_falls_back_to_mirror() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));

    client.disconnect();
    assert!(!debug.is_connected());
    assert_eq!(debug.write(b'z'), 1);
    assert_eq!(&console.borrow()[..], b"z");
    assert_eq!(client.received(), b"Hi!\r\n");
}

#[test]
fn test_transport_failure_looks_like_no_client() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));

    client.fail_writes(true);
    assert_eq!(debug.write(b'k'), 0);
    // The mirror still received the byte
    assert_eq!(&console.borrow()[..], b"k");
}

#[test]
fn test_dropped_mirror_is_ignored() {
    let (mut debug, _connector) = started(StreamConfig::default());
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));
    assert!(debug.has_mirror());

    drop(mirror);
    drop(console);
    assert!(!debug.has_mirror());
    assert_eq!(debug.write(b'a'), 0);
}

#[test]
fn test_mirror_can_be_cleared() {
    let (mut debug, _connector) = started(StreamConfig::default());
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));
    debug.mirror(None);

    assert_eq!(debug.write(b'a'), 0);
    assert!(console.borrow().is_empty());
}

#[test]
fn test_busy_mirror_counts_as_failed_write() {
    let (mut debug, _connector) = started(StreamConfig::default());
    let (console, mirror) = console();
    debug.mirror(Some(&mirror));

    let _held = console.borrow_mut();
    assert_eq!(debug.write(b'a'), 0);
}

#[test]
fn test_numeric_and_formatted_writes() {
    let (mut debug, connector) = started(StreamConfig::default().with_greeting(""));
    let client = connector.connect().unwrap();
    debug.available();

    assert_eq!(debug.write_value(0x141_u32), 1);
    assert_eq!(debug.write_value(66_i64), 1);
    write!(debug, "{}-{}", 7, "x").unwrap();
    assert_eq!(client.take_received(), b"AB7-x");
}

#[test]
fn test_io_write_reports_partial_progress() {
    let (mut debug, _connector) = started(StreamConfig::default());
    assert_eq!(std::io::Write::write(&mut debug, b"abc").unwrap(), 0);
    assert!(std::io::Write::write_all(&mut debug, b"abc").is_err());
}

#[test]
fn test_usable_through_stream_trait() {
    fn drain<S: Stream>(stream: &mut S) -> Vec<u8> {
        let mut out = Vec::new();
        while stream.available() > 0 {
            while let Some(byte) = stream.read() {
                out.push(byte);
            }
        }
        stream.flush();
        out
    }

    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    client.send(b"cmd");
    assert_eq!(drain(&mut debug), b"cmd");
}

#[test]
fn test_set_debug_output_changes_nothing() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    debug.available();
    debug.set_debug_output(true);
    debug.set_debug_output(false);
    debug.print("s");
    assert_eq!(client.received(), b"Hi!\r\ns");
}

#[test]
fn test_connect_write_disconnect_scenario() {
    let (mut debug, connector) = started(StreamConfig::default());
    let client = connector.connect().unwrap();
    client.send(b"?");

    assert_eq!(debug.available(), 1);
    // The greeting went to the client, not into the application's input
    assert_eq!(debug.read(), Some(b'?'));

    debug.cr_before_lf(true);
    assert_eq!(debug.write(b'A'), 1);
    assert_eq!(debug.write(b'\n'), 1);
    assert_eq!(client.take_received(), b"Hi!\r\nA\r\n");

    client.disconnect();
    assert_eq!(debug.write(b'B'), 0);
}
