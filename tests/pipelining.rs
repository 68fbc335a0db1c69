mod support;

use redisync::ConnectionBuilder;
use support::MockServer;

#[test]
fn forcing_a_later_handle_first_still_drains_in_wire_order() {
    let server = MockServer::start(vec![b"+OK\r\n", b"+OK\r\n", b"$1\r\n1\r\n", b"$1\r\n2\r\n"]);

    let conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let a = conn.set("a", "1");
    let b = conn.set("b", "2");
    let get_a = conn.get("a");
    let get_b = conn.get("b");

    assert_eq!(&get_b.result().unwrap()[..], b"2");
    assert_eq!(&get_a.result().unwrap()[..], b"1");
    b.result().unwrap();
    a.result().unwrap();
}

#[test]
fn dropping_an_unread_handle_does_not_desync_the_connection() {
    let server = MockServer::start(vec![b"+OK\r\n", b":42\r\n"]);

    let conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    {
        let _forgotten = conn.set("k", "v");
    }
    let incr = conn.incrby("counter", 42);
    assert_eq!(incr.result().unwrap(), 42);
}

#[test]
fn null_bulk_reply_is_reported_as_null_reply_error() {
    let server = MockServer::start(vec![b"$-1\r\n"]);

    let conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let missing = conn.get("nope");
    let err = missing.result().unwrap_err();
    assert!(matches!(err, redisync::Error::NullReply));
}

#[test]
fn multi_bulk_reply_decodes_full_array() {
    let server = MockServer::start(vec![b"*3\r\n$1\r\na\r\n$1\r\nb\r\n$-1\r\n"]);

    let conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let values = conn.lrange("list", 0, -1).result().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].as_deref(), Some(&b"a"[..]));
    assert_eq!(values[1].as_deref(), Some(&b"b"[..]));
    assert_eq!(values[2], None);
}

#[test]
fn multi_bulk_reply_supports_partial_lazy_draining() {
    let server = MockServer::start(vec![b"*2\r\n$1\r\nx\r\n$1\r\ny\r\n", b"+OK\r\n"]);

    let conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let mut reply = conn.smembers("set");
    assert_eq!(
        reply.next_element().unwrap().flatten().as_deref(),
        Some(&b"x"[..])
    );
    // Remaining element ("y") is auto-drained on drop without blocking the
    // next command on the same connection.
    drop(reply);
    conn.ping().result().unwrap();
}
