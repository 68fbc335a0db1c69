//! The connection core: owns the transport, the write buffer, and the reply
//! queue, and exposes the command surface in `crate::commands`.
//!
//! Writes are buffered eagerly but flushed lazily -- a command only forces a
//! socket write when some handle (its own or a successor's) is materialized.
//! This lets a caller batch several commands before paying for a single
//! flush, which is the whole point of pipelining.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};

use crate::framer::{self, Cmd, RespValue};
use crate::queue::{ReplyQueue, SlotId};
use crate::reply::{BoolReply, BulkReply, IntegerReply, MultiBulkReply, TypeReply, VoidReply};
use crate::transaction::Transaction;
use crate::transport::{Stream, Transport};
use crate::{Error, Result};

/// Shared mutable state behind a [`Connection`] and every reply handle it
/// has issued. Reply handles hold a clone of the `Rc` so they can keep
/// draining the wire even after the `Connection` itself has moved on to
/// issue more commands.
pub(crate) struct Core {
    transport: Transport,
    write_buf: BytesMut,
    pub(crate) queue: ReplyQueue,
    in_transaction: bool,
}

impl Core {
    /// Encodes `cmd` into the write buffer and reserves its reply slot.
    pub(crate) fn enqueue(&mut self, cmd: &Cmd) -> SlotId {
        framer::encode_request(cmd, &mut self.write_buf);
        self.queue.push()
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        if !self.write_buf.is_empty() {
            self.transport.write_all(&self.write_buf)?;
            self.transport.flush()?;
            self.write_buf.clear();
        }
        Ok(())
    }

    pub(crate) fn read_status(&mut self) -> Result<String> {
        framer::read_status(self.transport.reader())
    }

    pub(crate) fn read_integer(&mut self) -> Result<i64> {
        framer::read_integer(self.transport.reader())
    }

    pub(crate) fn read_bulk(&mut self) -> Result<Option<Bytes>> {
        framer::read_bulk(self.transport.reader())
    }

    pub(crate) fn read_multibulk_header(&mut self) -> Result<Option<i64>> {
        framer::read_multibulk_header(self.transport.reader())
    }

    pub(crate) fn read_value(&mut self) -> Result<RespValue> {
        framer::read_value(self.transport.reader())
    }

    pub(crate) fn skip_one_reply(&mut self) -> Result<()> {
        framer::skip_reply(self.transport.reader())
    }
}

/// A synchronous connection to a Redis server.
///
/// Every command method returns a reply handle (e.g. [`VoidReply`],
/// [`IntegerReply`]) instead of blocking for the server's answer. Call
/// `.result()` on the handle when you actually need the value -- doing so
/// for the first handle in a batch transparently flushes and drains
/// everything queued before it.
pub struct Connection {
    core: Rc<RefCell<Core>>,
}

impl Connection {
    pub(crate) fn with_write_buffer_size(stream: Stream, write_buffer_size: usize) -> Result<Self> {
        let transport = Transport::new(stream)?;
        let core = Core {
            transport,
            write_buf: BytesMut::with_capacity(write_buffer_size),
            queue: ReplyQueue::new(),
            in_transaction: false,
        };
        Ok(Self {
            core: Rc::new(RefCell::new(core)),
        })
    }

    pub(crate) fn enqueue(&self, cmd: Cmd) -> SlotId {
        self.core.borrow_mut().enqueue(&cmd)
    }

    pub(crate) fn send_void(&self, cmd: Cmd) -> VoidReply {
        let slot = self.enqueue(cmd);
        VoidReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn send_bool(&self, cmd: Cmd) -> BoolReply {
        let slot = self.enqueue(cmd);
        BoolReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn send_integer(&self, cmd: Cmd) -> IntegerReply {
        let slot = self.enqueue(cmd);
        IntegerReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn send_bulk(&self, cmd: Cmd) -> BulkReply {
        let slot = self.enqueue(cmd);
        BulkReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn send_multi(&self, cmd: Cmd) -> MultiBulkReply {
        let slot = self.enqueue(cmd);
        MultiBulkReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn send_type(&self, cmd: Cmd) -> TypeReply {
        let slot = self.enqueue(cmd);
        TypeReply::pending(Rc::clone(&self.core), slot)
    }

    pub(crate) fn core(&self) -> Rc<RefCell<Core>> {
        Rc::clone(&self.core)
    }

    fn set_in_transaction(&self, open: bool) {
        self.core.borrow_mut().in_transaction = open;
    }

    fn is_in_transaction(&self) -> bool {
        self.core.borrow().in_transaction
    }

    /// Authenticates the connection. Must be called (if the server requires
    /// a password) before any other command; [`crate::builder::ConnectionBuilder`]
    /// does this automatically when a password was configured.
    pub fn auth(&self, password: impl AsRef<str>) -> VoidReply {
        self.send_void(Cmd::new("AUTH").arg(password.as_ref()))
    }

    /// Switches the logical database the connection operates against.
    pub fn select(&self, index: i64) -> VoidReply {
        self.send_void(Cmd::new("SELECT").arg(index))
    }

    /// Round-trips a `PING`. The server's `+PONG` status is discarded; a
    /// successful `.result()` is itself the confirmation the round-trip
    /// completed.
    pub fn ping(&self) -> VoidReply {
        self.send_void(Cmd::new("PING"))
    }

    /// Closes the logical session. The [`Connection`] itself still owns the
    /// socket and may be dropped normally afterwards.
    pub fn quit(&self) -> VoidReply {
        self.send_void(Cmd::new("QUIT"))
    }

    /// Opens a `MULTI` transaction. Borrowing `&mut self` for the
    /// transaction's lifetime is what keeps ordinary command calls from
    /// interleaving with queued ones -- the compiler won't let `conn.get(..)`
    /// run while a `Transaction` borrowed from the same connection is still
    /// in scope.
    pub fn multi(&mut self) -> Result<Transaction<'_>> {
        if self.is_in_transaction() {
            return Err(Error::TransactionMisuse(
                "a transaction is already open on this connection".into(),
            ));
        }
        self.set_in_transaction(true);
        Transaction::begin(self)
    }

    pub(crate) fn mark_transaction_closed(&self) {
        self.set_in_transaction(false);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}
