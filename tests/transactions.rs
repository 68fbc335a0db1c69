mod support;

use redisync::ConnectionBuilder;
use support::MockServer;

#[test]
fn commit_resolves_queued_commands_from_the_exec_array() {
    let server = MockServer::start(vec![
        b"+OK\r\n",      // MULTI
        b"+QUEUED\r\n",  // INCR
        b"+QUEUED\r\n",  // SET
        b"*2\r\n:1\r\n+OK\r\n", // EXEC
    ]);

    let mut conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let mut tx = conn.multi().unwrap();
    let incremented = tx.incr("counter");
    let stored = tx.set("flag", "1");
    tx.commit().unwrap();

    assert_eq!(incremented.result().unwrap(), 1);
    stored.result().unwrap();
}

#[test]
fn abort_detaches_every_queued_handle_instead_of_reading_stray_bytes() {
    let server = MockServer::start(vec![
        b"+OK\r\n",     // MULTI
        b"+QUEUED\r\n", // SET
        b"+OK\r\n",     // DISCARD
    ]);

    let mut conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let mut tx = conn.multi().unwrap();
    let stored = tx.set("flag", "1");
    tx.abort().unwrap();

    let err = stored.result().unwrap_err();
    assert!(matches!(err, redisync::Error::TransactionMisuse(_)));
}

#[test]
fn commit_rejects_an_exec_array_whose_length_disagrees_with_the_queued_count() {
    let server = MockServer::start(vec![
        b"+OK\r\n",     // MULTI
        b"+QUEUED\r\n", // INCR
        b"+QUEUED\r\n", // SET
        b"*1\r\n:1\r\n", // EXEC -- only one reply for two queued commands
    ]);

    let mut conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    let mut tx = conn.multi().unwrap();
    let incremented = tx.incr("counter");
    let stored = tx.set("flag", "1");
    let err = tx.commit().unwrap_err();
    assert!(matches!(err, redisync::Error::Protocol(_)));

    // The mismatch still leaves the connection's bookkeeping consistent:
    // queued handles report the transaction outcome rather than hanging.
    assert!(incremented.result().is_err());
    assert!(stored.result().is_err());
}

#[test]
fn a_second_transaction_can_open_once_the_first_has_closed() {
    // `Transaction::commit`/`abort` consume `self`, which is what lets a new
    // `multi()` call borrow `conn` again -- the borrow checker rejects two
    // live `Transaction`s on one connection at compile time, so there's
    // nothing left to assert about nesting at runtime here.
    let server = MockServer::start(vec![
        b"+OK\r\n", // MULTI (first transaction)
        b"*0\r\n",  // EXEC, no commands queued
        b"+OK\r\n", // MULTI (second transaction)
        b"+OK\r\n", // DISCARD
    ]);

    let mut conn = ConnectionBuilder::new().with_unix(&server.socket_path).build().unwrap();
    conn.multi().unwrap().commit().unwrap();
    conn.multi().unwrap().abort().unwrap();
}
