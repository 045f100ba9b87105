//! In-memory candidate store. Lost on restart.
//!
//! Every operation takes the single mutex for its whole duration, so concurrent
//! add/delete requests are serialized. Ranking reads a cloned snapshot and
//! never holds the lock across an await point.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{Candidate, CandidateInfo};

#[derive(Clone, Default)]
pub struct CandidateStore {
    candidates: Arc<Mutex<Vec<Candidate>>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends candidates in order. A candidate whose id is already stored
    /// replaces the stored record in place. Returns how many were accepted.
    pub fn add_many(&self, incoming: Vec<Candidate>) -> usize {
        let mut candidates = self.candidates.lock();
        let added = incoming.len();
        for candidate in incoming {
            match candidates.iter_mut().find(|c| c.id == candidate.id) {
                Some(existing) => *existing = candidate,
                None => candidates.push(candidate),
            }
        }
        added
    }

    /// Point-in-time copy of every stored candidate.
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.candidates.lock().clone()
    }

    pub fn list_info(&self) -> Vec<CandidateInfo> {
        self.candidates.lock().iter().map(Candidate::info).collect()
    }

    pub fn get(&self, id: &str) -> Option<Candidate> {
        self.candidates.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Removes and returns the candidate, or `None` when the id is unknown
    /// (in which case nothing changes).
    pub fn delete(&self, id: &str) -> Option<Candidate> {
        let mut candidates = self.candidates.lock();
        let idx = candidates.iter().position(|c| c.id == id)?;
        Some(candidates.remove(idx))
    }

    /// Removes everything and returns how many candidates were dropped.
    pub fn clear(&self) -> usize {
        let mut candidates = self.candidates.lock();
        let count = candidates.len();
        candidates.clear();
        count
    }

    pub fn count(&self) -> usize {
        self.candidates.lock().len()
    }
}
