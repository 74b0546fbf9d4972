// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An arena of batches threaded by two index-based doubly linked lists.
//!
//! The global list is the replay order. Each program additionally has its own
//! list of the batches drawing with it, so merge candidates of a program can
//! be found without walking unrelated batches. Batches never move in memory:
//! reordering only rewrites links, and released slots are recycled through a
//! free list.

use super::{Batch, BatchKind, Link};
use quill_core::renderer::ProgramId;

/// A stable handle to a batch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(u32);

impl BatchId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Ends {
    head: Option<BatchId>,
    tail: Option<BatchId>,
}

/// The batches of one frame.
#[derive(Debug, Default)]
pub struct BatchList {
    slots: Vec<Batch>,
    free: Vec<BatchId>,
    order: Ends,
    programs: Vec<Ends>,
    len: usize,
    next_seq: u64,
}

impl BatchList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new batch at the end of the replay order and, for a nonzero
    /// program, at the end of that program's list.
    pub fn push_back(&mut self, kind: BatchKind, program: ProgramId) -> BatchId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(Batch::default());
                BatchId((self.slots.len() - 1) as u32)
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let tail = self.order.tail;
        {
            let batch = &mut self.slots[id.index()];
            batch.kind = kind;
            batch.program = program;
            batch.seq = seq;
            batch.order = Link {
                prev: tail,
                next: None,
            };
        }
        match tail {
            Some(tail) => self.slots[tail.index()].order.next = Some(id),
            None => self.order.head = Some(id),
        }
        self.order.tail = Some(id);
        self.len += 1;

        self.link_program(id);
        id
    }

    /// Moves the *last* batch of the chain to another program's list.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not the tail of the replay order, since appending it
    /// to the new program's list would otherwise break that list's ordering.
    pub fn set_program(&mut self, id: BatchId, program: ProgramId) {
        assert_eq!(
            self.order.tail,
            Some(id),
            "only the last batch can change program"
        );
        self.unlink_program(id);
        self.slots[id.index()].program = program;
        self.link_program(id);
    }

    /// Unlinks a batch from both lists and recycles its slot.
    pub fn remove(&mut self, id: BatchId) {
        self.unlink_program(id);

        let link = self.slots[id.index()].order;
        match link.prev {
            Some(prev) => self.slots[prev.index()].order.next = link.next,
            None => self.order.head = link.next,
        }
        match link.next {
            Some(next) => self.slots[next.index()].order.prev = link.prev,
            None => self.order.tail = link.prev,
        }

        self.slots[id.index()].reset();
        self.free.push(id);
        self.len -= 1;
    }

    /// Recycles every batch.
    pub fn clear(&mut self) {
        let mut cursor = self.order.head;
        while let Some(id) = cursor {
            let batch = &mut self.slots[id.index()];
            cursor = batch.order.next;
            batch.reset();
            self.free.push(id);
        }
        self.order = Ends::default();
        self.programs.clear();
        self.len = 0;
    }

    fn link_program(&mut self, id: BatchId) {
        let program = self.slots[id.index()].program;
        if program.is_none() {
            return;
        }

        let index = program.index();
        if self.programs.len() <= index {
            self.programs.resize(index + 1, Ends::default());
        }
        let ends = &mut self.programs[index];
        let tail = ends.tail;
        ends.tail = Some(id);
        if ends.head.is_none() {
            ends.head = Some(id);
        }

        if let Some(tail) = tail {
            if let Some(link) = self.slots[tail.index()].program_link.as_mut() {
                link.next = Some(id);
            }
        }
        self.slots[id.index()].program_link = Some(Link {
            prev: tail,
            next: None,
        });
    }

    fn unlink_program(&mut self, id: BatchId) {
        let Some(link) = self.slots[id.index()].program_link.take() else {
            return;
        };
        let program = self.slots[id.index()].program;

        match link.prev {
            Some(prev) => {
                if let Some(prev_link) = self.slots[prev.index()].program_link.as_mut() {
                    prev_link.next = link.next;
                }
            }
            None => self.programs[program.index()].head = link.next,
        }
        match link.next {
            Some(next) => {
                if let Some(next_link) = self.slots[next.index()].program_link.as_mut() {
                    next_link.prev = link.prev;
                }
            }
            None => self.programs[program.index()].tail = link.prev,
        }
    }

    /// The batch behind `id`.
    pub fn get(&self, id: BatchId) -> &Batch {
        &self.slots[id.index()]
    }

    /// The batch behind `id`, mutably.
    pub fn get_mut(&mut self, id: BatchId) -> &mut Batch {
        &mut self.slots[id.index()]
    }

    /// Two distinct batches, both mutably.
    ///
    /// # Panics
    ///
    /// Panics if `a == b`.
    pub fn pair_mut(&mut self, a: BatchId, b: BatchId) -> (&mut Batch, &mut Batch) {
        assert_ne!(a, b, "pair_mut needs two distinct batches");
        if a.index() < b.index() {
            let (low, high) = self.slots.split_at_mut(b.index());
            (&mut low[a.index()], &mut high[0])
        } else {
            let (low, high) = self.slots.split_at_mut(a.index());
            (&mut high[0], &mut low[b.index()])
        }
    }

    /// The first batch in replay order.
    pub fn head(&self) -> Option<BatchId> {
        self.order.head
    }

    /// The last batch in replay order.
    pub fn tail(&self) -> Option<BatchId> {
        self.order.tail
    }

    /// The batch replayed right before `id`.
    pub fn prev(&self, id: BatchId) -> Option<BatchId> {
        self.slots[id.index()].order.prev
    }

    /// The batch replayed right after `id`.
    pub fn next(&self, id: BatchId) -> Option<BatchId> {
        self.slots[id.index()].order.next
    }

    /// The previous batch drawing with the same program as `id`.
    pub fn program_prev(&self, id: BatchId) -> Option<BatchId> {
        self.slots[id.index()].program_link.and_then(|link| link.prev)
    }

    /// The batches of `program`, in replay order.
    pub fn program_batches(&self, program: ProgramId) -> Vec<BatchId> {
        let mut ids = Vec::new();
        let mut cursor = self
            .programs
            .get(program.index())
            .and_then(|ends| ends.head);
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.slots[id.index()].program_link.and_then(|link| link.next);
        }
        ids
    }

    /// Number of batches in the chain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots allocated so far, recycled ones included.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over the chain in replay order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.order.head,
        }
    }
}

/// Iterator over a [`BatchList`] in replay order.
pub struct Iter<'a> {
    list: &'a BatchList,
    cursor: Option<BatchId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (BatchId, &'a Batch);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let batch = self.list.get(id);
        self.cursor = batch.order.next;
        Some((id, batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::renderer::ClearFlags;

    fn programs(list: &BatchList) -> Vec<u32> {
        list.iter().map(|(_, batch)| batch.program.0).collect()
    }

    /// Checks both link directions and the program-index invariant.
    fn assert_consistent(list: &BatchList) {
        let ids: Vec<_> = list.iter().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), list.len());
        for pair in ids.windows(2) {
            assert_eq!(list.next(pair[0]), Some(pair[1]));
            assert_eq!(list.prev(pair[1]), Some(pair[0]));
            assert!(list.get(pair[0]).sequence() < list.get(pair[1]).sequence());
        }
        for (_, batch) in list.iter() {
            assert_eq!(batch.program_link.is_some(), !batch.program.is_none());
        }
    }

    #[test]
    fn test_push_links_both_lists() {
        let mut list = BatchList::new();
        let a = list.push_back(BatchKind::Draw, ProgramId(1));
        list.push_back(BatchKind::Clear(ClearFlags::ALL), ProgramId::NONE);
        let c = list.push_back(BatchKind::Draw, ProgramId(2));
        let d = list.push_back(BatchKind::Draw, ProgramId(1));

        assert_eq!(programs(&list), vec![1, 0, 2, 1]);
        assert_eq!(list.program_batches(ProgramId(1)), vec![a, d]);
        assert_eq!(list.program_prev(d), Some(a));
        assert_eq!(list.program_prev(c), None);
        assert!(list.program_batches(ProgramId::NONE).is_empty());
        assert_consistent(&list);
    }

    #[test]
    fn test_remove_relinks_neighbours() {
        let mut list = BatchList::new();
        let a = list.push_back(BatchKind::Draw, ProgramId(1));
        let b = list.push_back(BatchKind::Draw, ProgramId(1));
        let c = list.push_back(BatchKind::Draw, ProgramId(1));

        list.remove(b);
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.program_prev(c), Some(a));
        assert_eq!(list.program_batches(ProgramId(1)), vec![a, c]);

        list.remove(c);
        assert_eq!(list.tail(), Some(a));
        assert_eq!(list.program_batches(ProgramId(1)), vec![a]);
        assert_consistent(&list);
    }

    #[test]
    fn test_set_program_moves_tail_between_indexes() {
        let mut list = BatchList::new();
        list.push_back(BatchKind::Draw, ProgramId(1));
        let b = list.push_back(BatchKind::Draw, ProgramId(1));

        list.set_program(b, ProgramId(4));
        assert_eq!(list.program_batches(ProgramId(1)).len(), 1);
        assert_eq!(list.program_batches(ProgramId(4)), vec![b]);

        list.set_program(b, ProgramId::NONE);
        assert!(list.program_batches(ProgramId(4)).is_empty());
        assert_consistent(&list);
    }

    #[test]
    fn test_clear_recycles_slots() {
        let mut list = BatchList::new();
        for program in 1..=3 {
            list.push_back(BatchKind::Draw, ProgramId(program));
        }
        list.get_mut(list.head().unwrap()).push_span(0, 6);

        list.clear();
        assert!(list.is_empty());
        assert!(list.program_batches(ProgramId(2)).is_empty());

        for _ in 0..3 {
            let id = list.push_back(BatchKind::Draw, ProgramId(5));
            assert!(list.get(id).spans.is_empty());
        }
        assert_eq!(list.capacity(), 3);
        assert_consistent(&list);
    }

    #[test]
    fn test_pair_mut_in_either_order() {
        let mut list = BatchList::new();
        let a = list.push_back(BatchKind::Draw, ProgramId(1));
        let b = list.push_back(BatchKind::Draw, ProgramId(2));

        let (first, second) = list.pair_mut(b, a);
        assert_eq!((first.program.0, second.program.0), (2, 1));
    }
}
