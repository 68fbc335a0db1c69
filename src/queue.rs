//! FIFO bookkeeping for replies that are owed on the wire but not yet read.
//!
//! Every command sent advances the queue by one slot; every slot read removes
//! entries from the front. A generation counter on each id lets a
//! [`crate::reply`] handle detect "my slot was already drained by someone
//! else" without needing a back-pointer into a linked list, which is the
//! trick the original intrusive-list design relied on and `unsafe` raw
//! pointers are the only way to reproduce directly in Rust. The `resolved`
//! map is the other half of that trick: when a later handle's predecessor
//! walk reads a slot it doesn't own, the decoded value is parked here so the
//! slot's actual owner can pick it up instead of touching the wire again.

use std::collections::{HashMap, VecDeque};

use crate::framer::RespValue;

/// Identifies one outstanding reply slot. Opaque outside this module; a
/// handle only ever compares an id against what the queue currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotId {
    generation: u64,
}

/// Whether a slot's reply has been consumed off the wire yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    /// Still ahead of us in the queue; reading it requires draining
    /// everything queued before it first.
    Outstanding,
    /// Already drained (by this handle or a later one jumping the queue).
    Drained,
}

struct Slot {
    id: SlotId,
    state: SlotState,
}

/// FIFO of reply slots awaiting materialization, in wire order.
#[derive(Default)]
pub(crate) struct ReplyQueue {
    slots: VecDeque<Slot>,
    next_generation: u64,
    /// Values decoded on a slot's behalf by a *later* handle's predecessor
    /// walk, keyed by generation, waiting for that slot's own owner to claim
    /// them. Without this, an owner forced after being jumped over would
    /// have no way to learn its reply was already read off the wire, and
    /// would try to read it again.
    resolved: HashMap<u64, RespValue>,
}

impl ReplyQueue {
    pub(crate) fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            next_generation: 0,
            resolved: HashMap::new(),
        }
    }

    /// Records the decoded value for `id`, to be claimed later by its own
    /// owner instead of re-reading the wire.
    pub(crate) fn store_resolved(&mut self, id: SlotId, value: RespValue) {
        self.resolved.insert(id.generation, value);
    }

    /// Takes back a value stashed by `store_resolved`, if someone already
    /// drained `id` on our behalf.
    pub(crate) fn take_resolved(&mut self, id: SlotId) -> Option<RespValue> {
        self.resolved.remove(&id.generation)
    }

    /// Reserves a new slot for a command that was just written to the wire,
    /// returning its id. The slot is appended to the back, preserving wire
    /// order.
    pub(crate) fn push(&mut self) -> SlotId {
        let id = SlotId {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.slots.push_back(Slot {
            id,
            state: SlotState::Outstanding,
        });
        id
    }

    /// Current state of `id`. A slot no longer present in the queue (already
    /// popped off the front) is also considered drained.
    pub(crate) fn state(&self, id: SlotId) -> SlotState {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.state)
            .unwrap_or(SlotState::Drained)
    }

    /// Every slot still ahead of `id`, oldest first. Draining these in order
    /// before reading `id`'s own reply is what keeps wire consumption in
    /// lockstep with the server regardless of the order handles are forced
    /// in.
    pub(crate) fn predecessors_of(&self, id: SlotId) -> Vec<SlotId> {
        let mut out = Vec::new();
        for slot in &self.slots {
            if slot.id == id {
                break;
            }
            if slot.state == SlotState::Outstanding {
                out.push(slot.id);
            }
        }
        out
    }

    /// Marks `id` drained and pops it (and any already-drained slots now at
    /// the front) off the queue.
    pub(crate) fn mark_drained(&mut self, id: SlotId) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.state = SlotState::Drained;
        }
        while matches!(self.slots.front(), Some(s) if s.state == SlotState::Drained) {
            self.slots.pop_front();
        }
    }

    #[cfg(test)]
    fn outstanding_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Outstanding)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_distinct_ids_in_order() {
        let mut q = ReplyQueue::new();
        let a = q.push();
        let b = q.push();
        assert_ne!(a, b);
        assert_eq!(q.predecessors_of(b), vec![a]);
        assert!(q.predecessors_of(a).is_empty());
    }

    #[test]
    fn draining_front_to_back_empties_queue() {
        let mut q = ReplyQueue::new();
        let a = q.push();
        let b = q.push();
        let c = q.push();

        assert_eq!(q.predecessors_of(c), vec![a, b]);
        q.mark_drained(a);
        assert_eq!(q.state(a), SlotState::Drained);
        assert_eq!(q.predecessors_of(c), vec![b]);
        q.mark_drained(b);
        q.mark_drained(c);
        assert_eq!(q.outstanding_count(), 0);
    }

    #[test]
    fn forcing_a_later_slot_first_reports_earlier_predecessors() {
        let mut q = ReplyQueue::new();
        let a = q.push();
        let b = q.push();
        // Forcing b requires draining a first; a caller does so by draining
        // predecessors_of(b), then marking b itself drained.
        for pred in q.predecessors_of(b) {
            q.mark_drained(pred);
        }
        q.mark_drained(b);
        assert_eq!(q.state(a), SlotState::Drained);
        assert_eq!(q.state(b), SlotState::Drained);
    }

    #[test]
    fn slot_popped_off_front_reports_drained_even_if_never_marked_directly() {
        let mut q = ReplyQueue::new();
        let a = q.push();
        let b = q.push();
        q.mark_drained(a);
        q.mark_drained(b);
        // both popped now; re-querying a stale id still reports Drained.
        assert_eq!(q.state(a), SlotState::Drained);
        assert_eq!(q.state(b), SlotState::Drained);
    }
}
