//! `MULTI`/`EXEC`/`DISCARD` transactions.
//!
//! A transaction absorbs three kinds of reply that never reach the caller
//! directly: `MULTI`'s `+OK`, each queued command's `+QUEUED`, and finally
//! either `EXEC`'s reply array or `DISCARD`'s `+OK`. Everything queued while
//! the transaction is open returns a [`QueuedCommand`] handle whose value
//! only exists once `commit()` has read the `EXEC` array back -- indexing
//! into that array is how a queued command's real reply is recovered, since
//! the wire never sends per-command replies while `MULTI` is active.
//!
//! Aborting positively detaches every outstanding [`QueuedCommand`]: forcing
//! one after `abort()` returns [`crate::Error::TransactionMisuse`] rather
//! than silently blocking on bytes the server is never going to send. The
//! implementation this design traces back to left exactly this case as an
//! open `//TODO`.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use bytes::Bytes;

use crate::connection::{Connection, Core};
use crate::framer::{Cmd, RespValue};
use crate::queue::SlotId;
use crate::{Error, Result};

enum ExecOutcome {
    Committed(Vec<RespValue>),
    Aborted,
}

enum TxState {
    Blank,
    Dirty,
    Done,
}

/// A `MULTI` block in progress on a [`Connection`].
pub struct Transaction<'c> {
    conn: &'c Connection,
    core: Rc<RefCell<Core>>,
    state: TxState,
    /// Slots for MULTI's `+OK` and each command's `+QUEUED`, drained
    /// generically (without decoding) when the block closes.
    pending_acks: Vec<SlotId>,
    outcome: Rc<RefCell<Option<ExecOutcome>>>,
    next_index: usize,
}

impl<'c> Transaction<'c> {
    pub(crate) fn begin(conn: &'c Connection) -> Result<Self> {
        let core = conn.core();
        let multi_slot = {
            core.borrow_mut().enqueue(&Cmd::new("MULTI"))
        };
        Ok(Self {
            conn,
            core,
            state: TxState::Blank,
            pending_acks: vec![multi_slot],
            outcome: Rc::new(RefCell::new(None)),
            next_index: 0,
        })
    }

    /// Queues an arbitrary command, returning a handle over its eventual
    /// position in the `EXEC` array. Used by the typed convenience methods
    /// below; exposed so callers can queue commands this module doesn't
    /// wrap directly.
    pub fn queue<T: FromValue>(&mut self, cmd: Cmd) -> QueuedCommand<T> {
        self.state = TxState::Dirty;
        let slot = self.core.borrow_mut().enqueue(&cmd);
        self.pending_acks.push(slot);
        let index = self.next_index;
        self.next_index += 1;
        QueuedCommand {
            outcome: Rc::clone(&self.outcome),
            index,
            _marker: PhantomData,
        }
    }

    pub fn get(&mut self, key: impl AsRef<str>) -> QueuedCommand<Option<Bytes>> {
        self.queue(Cmd::new("GET").arg(key.as_ref()))
    }

    pub fn set(&mut self, key: impl AsRef<str>, value: impl AsRef<[u8]>) -> QueuedCommand<()> {
        self.queue(Cmd::new("SET").arg(key.as_ref()).arg(value.as_ref()))
    }

    pub fn incr(&mut self, key: impl AsRef<str>) -> QueuedCommand<i64> {
        self.queue(Cmd::new("INCR").arg(key.as_ref()))
    }

    pub fn del(&mut self, key: impl AsRef<str>) -> QueuedCommand<i64> {
        self.queue(Cmd::new("DEL").arg(key.as_ref()))
    }

    /// Sends `EXEC`, drains every queued acknowledgement, and reads the
    /// reply array back so outstanding [`QueuedCommand`] handles can resolve.
    pub fn commit(self) -> Result<()> {
        let core = Rc::clone(&self.core);
        let exec_slot = core.borrow_mut().enqueue(&Cmd::new("EXEC"));
        core.borrow_mut().flush()?;
        for slot in &self.pending_acks {
            let mut guard = core.borrow_mut();
            guard.skip_one_reply()?;
            guard.queue.mark_drained(*slot);
        }
        let values = {
            let mut guard = core.borrow_mut();
            let header = guard.read_multibulk_header()?;
            match header {
                None => Vec::new(),
                Some(n) => {
                    let mut values = Vec::with_capacity(n.max(0) as usize);
                    for _ in 0..n {
                        values.push(guard.read_value()?);
                    }
                    values
                }
            }
        };
        core.borrow_mut().queue.mark_drained(exec_slot);
        self.conn.mark_transaction_closed();
        if values.len() != self.next_index {
            *self.outcome.borrow_mut() = Some(ExecOutcome::Aborted);
            return Err(Error::Protocol(format!(
                "EXEC array has {} replies but {} commands were queued",
                values.len(),
                self.next_index
            )));
        }
        *self.outcome.borrow_mut() = Some(ExecOutcome::Committed(values));
        Ok(())
    }

    /// Sends `DISCARD`, drains every queued acknowledgement, and positively
    /// detaches every outstanding [`QueuedCommand`] handle.
    pub fn abort(self) -> Result<()> {
        let core = Rc::clone(&self.core);
        let discard_slot = core.borrow_mut().enqueue(&Cmd::new("DISCARD"));
        core.borrow_mut().flush()?;
        for slot in &self.pending_acks {
            let mut guard = core.borrow_mut();
            guard.skip_one_reply()?;
            guard.queue.mark_drained(*slot);
        }
        {
            let mut guard = core.borrow_mut();
            guard.read_status()?;
            guard.queue.mark_drained(discard_slot);
        }
        *self.outcome.borrow_mut() = Some(ExecOutcome::Aborted);
        self.conn.mark_transaction_closed();
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if matches!(self.state, TxState::Blank | TxState::Dirty)
            && self.outcome.borrow().is_none()
        {
            log::warn!("transaction dropped without commit() or abort(); auto-aborting");
            let core = Rc::clone(&self.core);
            let discard_slot = core.borrow_mut().enqueue(&Cmd::new("DISCARD"));
            if let Err(e) = (|| -> Result<()> {
                let mut guard = core.borrow_mut();
                guard.flush()?;
                drop(guard);
                for slot in &self.pending_acks {
                    let mut guard = core.borrow_mut();
                    guard.skip_one_reply()?;
                    guard.queue.mark_drained(*slot);
                }
                let mut guard = core.borrow_mut();
                guard.read_status()?;
                guard.queue.mark_drained(discard_slot);
                Ok(())
            })() {
                log::warn!("auto-abort of dropped transaction failed: {e}");
            }
            *self.outcome.borrow_mut() = Some(ExecOutcome::Aborted);
            self.conn.mark_transaction_closed();
        }
    }
}

/// A reply decode target reachable from one element of an `EXEC` array.
pub trait FromValue: Sized {
    fn from_value(value: RespValue) -> Result<Self>;
}

impl FromValue for () {
    fn from_value(_value: RespValue) -> Result<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Integer(n) => Ok(n != 0),
            other => Err(Error::Protocol(format!("expected integer, got {other:?}"))),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Integer(n) => Ok(n),
            other => Err(Error::Protocol(format!("expected integer, got {other:?}"))),
        }
    }
}

impl FromValue for Option<Bytes> {
    fn from_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Bulk(b) => Ok(b),
            other => Err(Error::Protocol(format!("expected bulk string, got {other:?}"))),
        }
    }
}

impl FromValue for Vec<Option<Bytes>> {
    fn from_value(value: RespValue) -> Result<Self> {
        crate::framer::value_into_bulk_array(value)
    }
}

/// A queued command's reply, readable only after the transaction commits or
/// aborts.
pub struct QueuedCommand<T> {
    outcome: Rc<RefCell<Option<ExecOutcome>>>,
    index: usize,
    _marker: PhantomData<T>,
}

impl<T: FromValue> QueuedCommand<T> {
    pub fn result(self) -> Result<T> {
        match self.outcome.borrow().as_ref() {
            None => Err(Error::TransactionMisuse(
                "transaction has not been committed or aborted yet".into(),
            )),
            Some(ExecOutcome::Aborted) => Err(Error::TransactionMisuse(
                "transaction was aborted".into(),
            )),
            Some(ExecOutcome::Committed(values)) => {
                let value = values.get(self.index).cloned().ok_or_else(|| {
                    Error::Protocol("EXEC array shorter than queued command count".into())
                })?;
                T::from_value(value)
            }
        }
    }
}
