//! A synchronous, pipelining client for the Redis key-value server.
//!
//! `redisync` speaks RESP (the REdis Serialization Protocol) over a single TCP or
//! UNIX-domain stream. Every command method returns a *reply handle* immediately,
//! without waiting for the server: the handle represents a reply that has been
//! promised but not necessarily read yet. Handles may be dropped, reassigned, or
//! forced out of order; the [`Connection`] guarantees that forcing any handle
//! drains every earlier handle first, so the wire stays in lockstep with the
//! server's reply order no matter what order the caller reads results in.
//!
//! ```no_run
//! use redisync::ConnectionBuilder;
//!
//! # fn example() -> redisync::Result<()> {
//! let conn = ConnectionBuilder::new().with_tcp("127.0.0.1:6379")?.build()?;
//! conn.set("hello", "world").result()?;
//! let value = conn.get("hello").result()?;
//! assert_eq!(&value[..], b"world");
//! # Ok(())
//! # }
//! ```
//!
//! Pipelining looks the same as issuing commands one at a time -- the difference is
//! purely in when you choose to read the handles back:
//!
//! ```no_run
//! # use redisync::ConnectionBuilder;
//! # fn example() -> redisync::Result<()> {
//! let conn = ConnectionBuilder::new().with_tcp("127.0.0.1:6379")?.build()?;
//! let a = conn.set("a", "1");
//! let b = conn.set("b", "2");
//! let get_a = conn.get("a");
//! let get_b = conn.get("b");
//! // Read in whatever order is convenient; the wire was already in the right order.
//! assert_eq!(&get_b.result()?[..], b"2");
//! assert_eq!(&get_a.result()?[..], b"1");
//! b.result()?;
//! a.result()?;
//! # Ok(())
//! # }
//! ```
//!
//! `MULTI`/`EXEC` transactions queue commands against the connection itself
//! and resolve once the block commits:
//!
//! ```no_run
//! # use redisync::ConnectionBuilder;
//! # fn example() -> redisync::Result<()> {
//! let mut conn = ConnectionBuilder::new().with_tcp("127.0.0.1:6379")?.build()?;
//! let mut tx = conn.multi()?;
//! let incremented = tx.incr("counter");
//! let stored = tx.set("flag", "1");
//! tx.commit()?;
//! assert_eq!(incremented.result()?, 1);
//! stored.result()?;
//! # Ok(())
//! # }
//! ```

use std::num::ParseIntError;
use std::str::Utf8Error;

use thiserror::Error;

pub mod builder;
mod commands;
pub mod config;
pub mod connection;
pub mod framer;
pub(crate) mod queue;
pub mod reply;
pub mod transaction;
pub(crate) mod transport;

pub use builder::ConnectionBuilder;
pub use config::RedisType;
pub use connection::Connection;
pub use reply::{BoolReply, BulkReply, IntegerReply, MultiBulkReply, TypeReply, VoidReply};
pub use transaction::Transaction;

/// Errors surfaced by the client.
///
/// `Io` and `Protocol` are terminal for the [`Connection`] they occur on: once the
/// wire is out of frame or the socket is broken, every subsequent call will keep
/// failing. `Server`, `NullReply`, `TransactionMisuse`, and `Config` are
/// recoverable -- the connection and its stream framing remain intact.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying socket failed to read, write, or close cleanly.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A reply did not match the shape the Framer expected: wrong leading byte, a
    /// malformed length field, or a transaction count mismatch. The stream is
    /// desynchronized and the connection should be discarded.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server returned a RESP `-` error reply.
    #[error("server error: {0}")]
    Server(String),
    /// A `$-1` or `*-1` reply was coerced into a non-optional accessor.
    #[error("unexpected null reply")]
    NullReply,
    /// A per-call handle created during an open transaction was forced before
    /// `commit`/`abort` resolved it, or a second transaction was opened while one
    /// was already attached.
    #[error("{0}")]
    TransactionMisuse(String),
    /// A [`ConnectionBuilder`] was asked to `build()` with invalid or
    /// insufficient configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
}

/// Convenience alias for `Result<T, redisync::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
