//! RDF triple store implementation
//!
//! This module provides an in-memory triple store with ordered indices over
//! interned term ids.

use super::cursor::{IndexOrder, PatternCursor};
use super::types::{Term, Triple};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard, TryLockError};
use thiserror::Error;
use tracing::{debug, warn};

/// RDF store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Mutation attempted while readers hold the store
    #[error("Store mutation conflicts with open cursors")]
    MutationConflict,

    /// `next` called on a closed cursor
    #[error("Cursor used after close")]
    CursorClosed,

    /// Triple not found
    #[error("Triple not found")]
    TripleNotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Dense id of an interned term
pub(crate) type TermId = u32;

/// Id triple, stored in the permutation of its index
pub(crate) type Key = [TermId; 3];

/// Term dictionary and the three index permutations
#[derive(Debug, Default)]
pub(crate) struct Indexes {
    /// Interned terms, addressed by id. Append-only.
    terms: Vec<Term>,
    /// Term → id lookup
    ids: FxHashMap<Term, TermId>,
    /// SPO index (Subject-Predicate-Object)
    pub(crate) spo: BTreeSet<Key>,
    /// POS index (Predicate-Object-Subject)
    pub(crate) pos: BTreeSet<Key>,
    /// OSP index (Object-Subject-Predicate)
    pub(crate) osp: BTreeSet<Key>,
}

impl Indexes {
    pub(crate) fn id_of(&self, term: &Term) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub(crate) fn term(&self, id: TermId) -> &Term {
        &self.terms[id as usize]
    }

    fn intern(&mut self, term: &Term) -> TermId {
        if let Some(id) = self.ids.get(term) {
            return *id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.clone());
        self.ids.insert(term.clone(), id);
        id
    }

    fn key_of(&self, triple: &Triple) -> Option<Key> {
        Some([
            self.id_of(&triple.subject.clone().into())?,
            self.id_of(&triple.predicate.clone().into())?,
            self.id_of(&triple.object)?,
        ])
    }

    fn insert(&mut self, triple: &Triple) -> bool {
        let s = self.intern(&triple.subject.clone().into());
        let p = self.intern(&triple.predicate.clone().into());
        let o = self.intern(&triple.object);

        if !self.spo.insert([s, p, o]) {
            return false;
        }
        self.pos.insert([p, o, s]);
        self.osp.insert([o, s, p]);
        true
    }

    fn remove(&mut self, [s, p, o]: Key) -> bool {
        if !self.spo.remove(&[s, p, o]) {
            return false;
        }
        self.pos.remove(&[p, o, s]);
        self.osp.remove(&[o, s, p]);
        true
    }

    pub(crate) fn index(&self, order: IndexOrder) -> &BTreeSet<Key> {
        match order {
            IndexOrder::Spo => &self.spo,
            IndexOrder::Pos => &self.pos,
            IndexOrder::Osp => &self.osp,
        }
    }

    pub(crate) fn resolve(&self, [s, p, o]: Key) -> Option<Triple> {
        Triple::from_terms(self.term(s).clone(), self.term(p).clone(), self.term(o).clone()).ok()
    }
}

/// RDF triple store with multiple indices for efficient pattern queries
///
/// Implements:
/// - SPO index (Subject-Predicate-Object)
/// - POS index (Predicate-Object-Subject)
/// - OSP index (Object-Subject-Predicate)
///
/// Every pattern with at least one bound position is answered by a range
/// scan over one of the indices. Terms are interned to dense ids. The term
/// dictionary only grows: `remove` drops index entries but keeps the terms
/// they referenced.
///
/// Concurrency: any number of cursors may be open at once, each holding a
/// shared lock for its lifetime. Mutations take the exclusive lock without
/// waiting and fail with [`StoreError::MutationConflict`] while cursors are
/// open, leaving the store untouched.
#[derive(Debug, Default)]
pub struct TripleStore {
    indexes: RwLock<Indexes>,
}

impl TripleStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a sequence of triples
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut indexes = Indexes::default();
        for triple in triples {
            indexes.insert(&triple);
        }
        Self {
            indexes: RwLock::new(indexes),
        }
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&self, triple: Triple) -> StoreResult<bool> {
        let mut indexes = self.write()?;
        Ok(indexes.insert(&triple))
    }

    /// Insert all triples under one write lock.
    ///
    /// Either every triple is applied or, on conflict, none is. Returns the
    /// number of triples that were new.
    pub fn insert_all<'a>(&self, triples: impl IntoIterator<Item = &'a Triple>) -> StoreResult<usize> {
        let mut indexes = self.write()?;
        let added = triples
            .into_iter()
            .filter(|triple| indexes.insert(triple))
            .count();
        debug!("Materialized {} new triples", added);
        Ok(added)
    }

    /// Remove a triple from the store
    pub fn remove(&self, triple: &Triple) -> StoreResult<()> {
        let mut indexes = self.write()?;
        let key = indexes.key_of(triple).ok_or(StoreError::TripleNotFound)?;
        if indexes.remove(key) {
            Ok(())
        } else {
            Err(StoreError::TripleNotFound)
        }
    }

    /// Check if a triple exists in the store
    pub fn contains(&self, triple: &Triple) -> bool {
        let indexes = self.read();
        indexes
            .key_of(triple)
            .is_some_and(|key| indexes.spo.contains(&key))
    }

    /// Get the total number of triples
    pub fn len(&self) -> usize {
        self.read().spo.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().spo.is_empty()
    }

    /// Open a cursor over every triple matching the pattern.
    ///
    /// `None` positions are wildcards. Bound positions match by term
    /// equality. The cursor holds a shared lock until it is closed,
    /// exhausted or dropped.
    pub fn find(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> PatternCursor<'_> {
        PatternCursor::open(self.read(), subject, predicate, object)
    }

    /// Every triple matching the pattern, collected eagerly
    pub fn matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Vec<Triple> {
        self.find(subject, predicate, object).collect_triples()
    }

    /// Every triple in SPO order
    pub fn triples(&self) -> Vec<Triple> {
        self.matching(None, None, None)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Indexes> {
        // Read guards never poison; a poisoned lock only means a writer
        // panicked between index updates of a single triple.
        self.indexes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Indexes>> {
        match self.indexes.try_write() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                warn!("Rejected store mutation while cursors are open");
                Err(StoreError::MutationConflict)
            }
        }
    }
}

impl FromIterator<Triple> for TripleStore {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self::from_triples(iter)
    }
}
