//! Reply handles: futures-shaped values returned immediately when a command
//! is issued, whose wire bytes may not have been read yet.
//!
//! A handle starts `Pending` on a [`crate::queue::SlotId`]. Calling
//! `.result()` materializes it: flush anything still sitting in the write
//! buffer, drain every predecessor slot still outstanding (so the wire is
//! consumed in the order the server wrote it), then decode this handle's own
//! reply and cache it. A handle that is dropped without ever being read
//! materializes itself the same way in `Drop`, so one forgotten handle can
//! never desynchronize the stream for everyone after it -- this is the
//! `unlink()`-on-destruction behavior the original intrusive-list reply
//! objects provided, done here without a manual back-pointer.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use crate::connection::Core;
use crate::framer::{self, RespValue};
use crate::queue::SlotId;
use crate::{Error, Result};

/// Implemented by every concrete reply decode target. `decode` is called
/// only once this handle's own turn has come up in the queue and nobody has
/// touched its reply yet. `from_resp_value` decodes the same shape from an
/// already-read [`RespValue`] -- used when a *later* handle's predecessor
/// walk read this slot's bytes first, so the owner decodes the cached value
/// instead of reading the wire a second time.
pub(crate) trait Decode: Sized {
    fn decode(core: &mut Core) -> Result<Self>;
    fn from_resp_value(value: RespValue) -> Result<Self>;
}

enum State<T> {
    Pending { core: Rc<RefCell<Core>>, slot: SlotId },
    Resolved(Result<T>),
    Detached,
}

/// Shared machinery behind every concrete reply type in this module.
struct Handle<T> {
    state: State<T>,
}

impl<T: Decode> Handle<T> {
    fn new(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self {
            state: State::Pending { core, slot },
        }
    }

    fn materialize(&mut self) {
        if let State::Pending { core, slot } = &self.state {
            let core = Rc::clone(core);
            let slot = *slot;
            let outcome = resolve::<T>(&core, slot);
            self.state = State::Resolved(outcome);
        }
    }

    fn result(mut self) -> Result<T> {
        self.materialize();
        match std::mem::replace(&mut self.state, State::Detached) {
            State::Resolved(r) => r,
            State::Detached => Err(Error::TransactionMisuse(
                "reply handle was already consumed".into(),
            )),
            State::Pending { .. } => unreachable!("materialize always resolves"),
        }
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        if let State::Pending { core, slot } = &self.state {
            let core = Rc::clone(core);
            let slot = *slot;
            if let Err(e) = drain_predecessors_and_skip(&core, slot) {
                log::warn!("reply handle dropped without being read, and draining it failed: {e}");
            }
        }
    }
}

/// Resolves `slot` to a `T`: if a later handle's predecessor walk already
/// read this slot's bytes off the wire on our behalf, decode the value it
/// stashed away instead of touching the wire again.
fn resolve<T: Decode>(core: &Rc<RefCell<Core>>, slot: SlotId) -> Result<T> {
    if let Some(value) = core.borrow_mut().queue.take_resolved(slot) {
        return T::from_resp_value(value);
    }
    drain_through(core, slot)
}

/// Flushes, drains every outstanding predecessor generically, then decodes
/// this slot's own reply into `T`.
fn drain_through<T: Decode>(core: &Rc<RefCell<Core>>, slot: SlotId) -> Result<T> {
    core.borrow_mut().flush()?;
    drain_predecessor_slots(core, slot)?;
    let mut guard = core.borrow_mut();
    let value = T::decode(&mut guard)?;
    guard.queue.mark_drained(slot);
    Ok(value)
}

/// Same predecessor drain, but the handle's own reply is skipped rather than
/// decoded -- used when a handle is dropped unread.
fn drain_predecessors_and_skip(core: &Rc<RefCell<Core>>, slot: SlotId) -> Result<()> {
    if core.borrow_mut().queue.take_resolved(slot).is_some() {
        return Ok(());
    }
    core.borrow_mut().flush()?;
    drain_predecessor_slots(core, slot)?;
    let mut guard = core.borrow_mut();
    guard.skip_one_reply()?;
    guard.queue.mark_drained(slot);
    Ok(())
}

/// Drains every slot still outstanding ahead of `slot`, decoding each one
/// generically and stashing the value in the queue for its own owner to
/// claim later, rather than discarding bytes that handle still needs.
fn drain_predecessor_slots(core: &Rc<RefCell<Core>>, slot: SlotId) -> Result<()> {
    loop {
        let preds = core.borrow().queue.predecessors_of(slot);
        if preds.is_empty() {
            break;
        }
        for pred in preds {
            let mut guard = core.borrow_mut();
            let value = guard.read_value()?;
            guard.queue.store_resolved(pred, value);
            guard.queue.mark_drained(pred);
        }
    }
    Ok(())
}

impl Decode for () {
    fn decode(core: &mut Core) -> Result<Self> {
        core.read_status()?;
        Ok(())
    }

    fn from_resp_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Status(_) => Ok(()),
            other => Err(Error::Protocol(format!("expected status reply, got {other:?}"))),
        }
    }
}

/// A reply whose only meaningful outcome is success or failure, e.g. `SET`.
pub struct VoidReply(Handle<()>);

impl VoidReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self(Handle::new(core, slot))
    }

    pub fn result(self) -> Result<()> {
        self.0.result()
    }
}

impl Decode for bool {
    fn decode(core: &mut Core) -> Result<Self> {
        Ok(core.read_integer()? != 0)
    }

    fn from_resp_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Integer(n) => Ok(n != 0),
            other => Err(Error::Protocol(format!("expected integer reply, got {other:?}"))),
        }
    }
}

/// A reply decoded as a boolean via Redis's `:0` / `:1` integer convention,
/// e.g. `SISMEMBER`, `EXPIRE`.
pub struct BoolReply(Handle<bool>);

impl BoolReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self(Handle::new(core, slot))
    }

    pub fn result(self) -> Result<bool> {
        self.0.result()
    }
}

impl Decode for i64 {
    fn decode(core: &mut Core) -> Result<Self> {
        core.read_integer()
    }

    fn from_resp_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Integer(n) => Ok(n),
            other => Err(Error::Protocol(format!("expected integer reply, got {other:?}"))),
        }
    }
}

/// A reply decoded as a `:` integer, e.g. `INCR`, `LLEN`, `DEL`.
pub struct IntegerReply(Handle<i64>);

impl IntegerReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self(Handle::new(core, slot))
    }

    pub fn result(self) -> Result<i64> {
        self.0.result()
    }
}

impl Decode for crate::config::RedisType {
    fn decode(core: &mut Core) -> Result<Self> {
        let status = core.read_status()?;
        Ok(status.parse().unwrap_or(crate::config::RedisType::None))
    }

    fn from_resp_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Status(s) => Ok(s.parse().unwrap_or(crate::config::RedisType::None)),
            other => Err(Error::Protocol(format!("expected status reply, got {other:?}"))),
        }
    }
}

/// A reply decoded from `TYPE`'s status line into a [`crate::config::RedisType`].
pub struct TypeReply(Handle<crate::config::RedisType>);

impl TypeReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self(Handle::new(core, slot))
    }

    pub fn result(self) -> Result<crate::config::RedisType> {
        self.0.result()
    }
}

impl Decode for Option<Bytes> {
    fn decode(core: &mut Core) -> Result<Self> {
        core.read_bulk()
    }

    fn from_resp_value(value: RespValue) -> Result<Self> {
        match value {
            RespValue::Bulk(b) => Ok(b),
            other => Err(Error::Protocol(format!("expected bulk reply, got {other:?}"))),
        }
    }
}

/// A reply decoded as a `$` bulk string, e.g. `GET`. `None` is the null bulk
/// reply (`$-1`), meaning the key did not exist.
pub struct BulkReply(Handle<Option<Bytes>>);

impl BulkReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self(Handle::new(core, slot))
    }

    /// Returns `Ok(bytes)`, treating a null bulk reply as [`Error::NullReply`].
    pub fn result(self) -> Result<Bytes> {
        self.0.result()?.ok_or(Error::NullReply)
    }

    /// Returns the reply as-is, `None` meaning the key did not exist.
    pub fn result_opt(self) -> Result<Option<Bytes>> {
        self.0.result()
    }
}

/// A reply decoded as a `*` multi-bulk array, e.g. `LRANGE`, `KEYS`, `EXEC`.
///
/// Unlike the other reply types, elements can be pulled out one at a time
/// with [`MultiBulkReply::next_element`] without paying for the rest of the
/// array up front. Whatever was not explicitly drained this way is fully
/// consumed and memoized the moment the handle is forced (via
/// [`MultiBulkReply::result`]) or dropped, so a partially-read array never
/// leaves stray elements on the wire for the next handle to trip over.
pub struct MultiBulkReply {
    state: State<Vec<Option<Bytes>>>,
    /// Elements already pulled out of the wire via `next_element`, before
    /// the handle was ever fully materialized.
    drained_prefix: Vec<Option<Bytes>>,
    /// Set once the header has been read and the remaining element count is
    /// known, even if full materialization hasn't happened yet.
    remaining: Option<i64>,
}

impl MultiBulkReply {
    pub(crate) fn pending(core: Rc<RefCell<Core>>, slot: SlotId) -> Self {
        Self {
            state: State::Pending { core, slot },
            drained_prefix: Vec::new(),
            remaining: None,
        }
    }

    /// Pulls the next element out of the array without decoding the rest,
    /// returning `None` once every element (or a null array) has been
    /// consumed.
    pub fn next_element(&mut self) -> Result<Option<Option<Bytes>>> {
        if let State::Pending { core, slot } = &self.state {
            let core = Rc::clone(core);
            let slot = *slot;
            if self.remaining.is_none() {
                if let Some(value) = core.borrow_mut().queue.take_resolved(slot) {
                    self.state = State::Resolved(framer::value_into_bulk_array(value));
                    return Ok(None);
                }
                core.borrow_mut().flush()?;
                drain_predecessor_slots(&core, slot)?;
                let header = core.borrow_mut().read_multibulk_header()?;
                self.remaining = Some(header.unwrap_or(0));
                if header.is_none() {
                    core.borrow_mut().queue.mark_drained(slot);
                    self.state = State::Resolved(Ok(Vec::new()));
                    return Ok(None);
                }
            }
            let left = self.remaining.expect("set above");
            if left == 0 {
                core.borrow_mut().queue.mark_drained(slot);
                let values = std::mem::take(&mut self.drained_prefix);
                self.state = State::Resolved(Ok(values.clone()));
                self.drained_prefix = values;
                return Ok(None);
            }
            let element = core.borrow_mut().read_bulk()?;
            self.remaining = Some(left - 1);
            self.drained_prefix.push(element.clone());
            return Ok(Some(element));
        }
        Ok(None)
    }

    /// Drains every remaining element, memoizing the full array.
    fn materialize(&mut self) {
        if matches!(self.state, State::Pending { .. }) {
            while let State::Pending { .. } = &self.state {
                match self.next_element() {
                    Ok(Some(_)) => continue,
                    Ok(None) => break,
                    Err(e) => {
                        self.state = State::Resolved(Err(e));
                        break;
                    }
                }
            }
        }
    }

    pub fn result(mut self) -> Result<Vec<Option<Bytes>>> {
        self.materialize();
        match std::mem::replace(&mut self.state, State::Detached) {
            State::Resolved(r) => r,
            State::Detached => Err(Error::TransactionMisuse(
                "reply handle was already consumed".into(),
            )),
            State::Pending { .. } => unreachable!("materialize always resolves"),
        }
    }
}

impl Drop for MultiBulkReply {
    fn drop(&mut self) {
        self.materialize();
    }
}
