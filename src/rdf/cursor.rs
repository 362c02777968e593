//! Pattern cursors returned by [`TripleStore::find`](super::TripleStore::find)

use super::store::{Indexes, Key, StoreError, StoreResult, TermId};
use super::types::{Term, Triple};
use std::ops::Bound;
use std::sync::RwLockReadGuard;

/// Index permutation a scan runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexOrder {
    Spo,
    Pos,
    Osp,
}

impl IndexOrder {
    /// Reorder an index key back to subject, predicate, object
    fn to_spo(self, key: Key) -> Key {
        match self {
            IndexOrder::Spo => key,
            IndexOrder::Pos => [key[2], key[0], key[1]],
            IndexOrder::Osp => [key[1], key[2], key[0]],
        }
    }
}

/// Range scan over one index, resumed after the last key it returned
struct Scan<'a> {
    indexes: RwLockReadGuard<'a, Indexes>,
    order: IndexOrder,
    from: Bound<Key>,
    upper: Key,
}

impl Scan<'_> {
    fn step(&mut self) -> Option<Triple> {
        loop {
            let key = *self
                .indexes
                .index(self.order)
                .range((self.from, Bound::Included(self.upper)))
                .next()?;
            self.from = Bound::Excluded(key);
            if let Some(triple) = self.indexes.resolve(self.order.to_spo(key)) {
                return Some(triple);
            }
        }
    }
}

enum CursorState<'a> {
    Open(Scan<'a>),
    Exhausted,
    Closed,
}

/// Lazy, single-pass sequence of the triples matching one pattern.
///
/// The cursor keeps the store's shared lock until it is exhausted, closed
/// or dropped, so the store cannot change under it. Each step is a fresh
/// range seek past the previously returned key, which keeps the order
/// stable and never repeats or skips a triple.
pub struct PatternCursor<'a> {
    state: CursorState<'a>,
}

impl<'a> PatternCursor<'a> {
    pub(crate) fn open(
        indexes: RwLockReadGuard<'a, Indexes>,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Self {
        let lookup = |term: Option<&Term>| match term {
            Some(term) => indexes.id_of(term).map(Some),
            None => Some(None),
        };
        // A bound term the store has never seen cannot match anything.
        let (Some(s), Some(p), Some(o)) = (lookup(subject), lookup(predicate), lookup(object))
        else {
            return Self::exhausted();
        };

        let (order, prefix, len): (IndexOrder, Key, usize) = match (s, p, o) {
            (Some(s), Some(p), Some(o)) => (IndexOrder::Spo, [s, p, o], 3),
            (Some(s), Some(p), None) => (IndexOrder::Spo, [s, p, 0], 2),
            (Some(s), None, None) => (IndexOrder::Spo, [s, 0, 0], 1),
            (None, Some(p), Some(o)) => (IndexOrder::Pos, [p, o, 0], 2),
            (None, Some(p), None) => (IndexOrder::Pos, [p, 0, 0], 1),
            (Some(s), None, Some(o)) => (IndexOrder::Osp, [o, s, 0], 2),
            (None, None, Some(o)) => (IndexOrder::Osp, [o, 0, 0], 1),
            (None, None, None) => (IndexOrder::Spo, [0, 0, 0], 0),
        };

        let mut lower = [TermId::MIN; 3];
        let mut upper = [TermId::MAX; 3];
        lower[..len].copy_from_slice(&prefix[..len]);
        upper[..len].copy_from_slice(&prefix[..len]);

        Self {
            state: CursorState::Open(Scan {
                indexes,
                order,
                from: Bound::Included(lower),
                upper,
            }),
        }
    }

    fn exhausted() -> Self {
        Self {
            state: CursorState::Exhausted,
        }
    }

    /// Next matching triple, or `None` once the cursor is exhausted.
    ///
    /// Exhaustion is terminal and releases the store lock; later calls keep
    /// returning `None`. Calling this after [`close`](Self::close) is a
    /// contract violation and fails with [`StoreError::CursorClosed`].
    pub fn next_triple(&mut self) -> StoreResult<Option<Triple>> {
        let step = match &mut self.state {
            CursorState::Closed => return Err(StoreError::CursorClosed),
            CursorState::Exhausted => return Ok(None),
            CursorState::Open(scan) => scan.step(),
        };
        if step.is_none() {
            self.state = CursorState::Exhausted;
        }
        Ok(step)
    }

    /// Release the store lock. Idempotent.
    pub fn close(&mut self) {
        self.state = CursorState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, CursorState::Closed)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }

    /// Drain the remaining triples and close the cursor
    pub fn collect_triples(mut self) -> Vec<Triple> {
        let mut triples = Vec::new();
        while let Ok(Some(triple)) = self.next_triple() {
            triples.push(triple);
        }
        self.close();
        triples
    }

    /// Subjects of the remaining triples, in cursor order
    pub fn subjects(self) -> Vec<Term> {
        self.collect_triples()
            .into_iter()
            .map(|t| t.subject.into())
            .collect()
    }

    /// Objects of the remaining triples, in cursor order
    pub fn objects(self) -> Vec<Term> {
        self.collect_triples()
            .into_iter()
            .map(|t| t.object)
            .collect()
    }
}

impl std::fmt::Debug for PatternCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            CursorState::Open(scan) => format!("Open({:?})", scan.order),
            CursorState::Exhausted => "Exhausted".to_string(),
            CursorState::Closed => "Closed".to_string(),
        };
        f.debug_struct("PatternCursor").field("state", &state).finish()
    }
}
