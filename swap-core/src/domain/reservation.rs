//! Reservation pools over funding cells.
//!
//! Every outpoint lives in at most one of LIVE, LOCKED or COMMITTING. A LOCKED or COMMITTING
//! entry is scored by its expiry and stops counting as reserved once the score is below the
//! current time. LIVE scores record when the cell was first observed.

use crate::domain::ledger::OutPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellPool {
    Live,
    Locked,
    Committing,
}

impl CellPool {
    pub fn as_str(self) -> &'static str {
        match self {
            CellPool::Live => "live",
            CellPool::Locked => "locked",
            CellPool::Committing => "committing",
        }
    }
}

pub fn is_expired(score: u64, now: u64) -> bool {
    score < now
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub out_point: OutPoint,
    pub score: u64,
}

/// Point-in-time copy of pool membership for observability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub live: Vec<PoolEntry>,
    pub locked: Vec<PoolEntry>,
    pub committing: Vec<PoolEntry>,
}

impl PoolSnapshot {
    pub fn pool_of(&self, out_point: &OutPoint) -> Option<CellPool> {
        let contains = |entries: &[PoolEntry]| entries.iter().any(|entry| &entry.out_point == out_point);
        if contains(&self.live) {
            Some(CellPool::Live)
        } else if contains(&self.locked) {
            Some(CellPool::Locked)
        } else if contains(&self.committing) {
            Some(CellPool::Committing)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub live: usize,
    pub added: usize,
    pub expired_locked: usize,
    pub expired_committing: usize,
}

/// In-process pool state; callers provide the mutual exclusion.
#[derive(Clone, Debug, Default)]
pub struct ReservationPools {
    live: BTreeMap<OutPoint, u64>,
    locked: BTreeMap<OutPoint, u64>,
    committing: BTreeMap<OutPoint, u64>,
}

impl ReservationPools {
    fn is_reserved(&self, out_point: &OutPoint, now: u64) -> bool {
        let held = |pool: &BTreeMap<OutPoint, u64>| pool.get(out_point).is_some_and(|score| !is_expired(*score, now));
        held(&self.locked) || held(&self.committing)
    }

    /// Moves the earliest eligible LIVE entry into LOCKED, scored by `expires_at`.
    pub fn lock_cell(&mut self, now: u64, expires_at: u64) -> Option<OutPoint> {
        let candidate = self
            .live
            .iter()
            .filter(|(out_point, _)| !self.is_reserved(out_point, now))
            .min_by_key(|(out_point, score)| (**score, **out_point))
            .map(|(out_point, _)| *out_point)?;
        self.live.remove(&candidate);
        self.committing.remove(&candidate);
        self.locked.insert(candidate, expires_at);
        Some(candidate)
    }

    /// Moves an unexpired LOCKED entry into COMMITTING; no change otherwise.
    pub fn commit_cell(&mut self, out_point: &OutPoint, now: u64, expires_at: u64) -> bool {
        match self.locked.get(out_point) {
            Some(score) if !is_expired(*score, now) => {
                self.locked.remove(out_point);
                self.committing.insert(*out_point, expires_at);
                true
            }
            _ => false,
        }
    }

    pub fn cancel_locked(&mut self, out_point: &OutPoint) -> bool {
        self.locked.remove(out_point).is_some()
    }

    pub fn cancel_committing(&mut self, out_point: &OutPoint) -> bool {
        self.committing.remove(out_point).is_some()
    }

    /// Drops expired reservations and replaces LIVE with the unreserved candidates.
    pub fn refresh(&mut self, candidates: &[OutPoint], now: u64) -> RefreshOutcome {
        let locked_before = self.locked.len();
        let committing_before = self.committing.len();
        self.locked.retain(|_, score| !is_expired(*score, now));
        self.committing.retain(|_, score| !is_expired(*score, now));

        let mut added = 0;
        let mut live = BTreeMap::new();
        let unique: BTreeSet<OutPoint> = candidates.iter().copied().collect();
        for out_point in unique {
            if self.locked.contains_key(&out_point) || self.committing.contains_key(&out_point) {
                continue;
            }
            let score = match self.live.get(&out_point) {
                Some(score) => *score,
                None => {
                    added += 1;
                    now
                }
            };
            live.insert(out_point, score);
        }
        self.live = live;

        RefreshOutcome {
            live: self.live.len(),
            added,
            expired_locked: locked_before - self.locked.len(),
            expired_committing: committing_before - self.committing.len(),
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let entries =
            |pool: &BTreeMap<OutPoint, u64>| pool.iter().map(|(out_point, score)| PoolEntry { out_point: *out_point, score: *score }).collect();
        PoolSnapshot { live: entries(&self.live), locked: entries(&self.locked), committing: entries(&self.committing) }
    }
}
