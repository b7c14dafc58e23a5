//! # Vote Window
//!
//! Bounded ring of per-height voting slots above a chain's watermark.
//!
//! ```text
//! heights:   watermark | w+1  w+2  ...  w+size
//! ring idx:            | (w+1)%size ...  (w+size)%size
//! ```
//!
//! The active heights are `size` consecutive integers, so their ring
//! indices never collide. A slot is removed when its height is surfaced,
//! which frees the index for the height entering at the top.

use shared_types::{Hash, Signature, ValidatorId};
use std::collections::BTreeMap;

/// Votes gathered for one `(height, hash)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub block_hash: Hash,
    pub power: u128,
    pub signatures: BTreeMap<ValidatorId, Signature>,
}

impl Candidate {
    fn new(block_hash: Hash) -> Self {
        Self {
            block_hash,
            power: 0,
            signatures: BTreeMap::new(),
        }
    }

    pub fn voters(&self) -> usize {
        self.signatures.len()
    }
}

/// Voting state for one height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightSlot {
    pub height: u64,
    pub candidates: BTreeMap<Hash, Candidate>,
    /// Hash each validator voted for at this height.
    pub voters: BTreeMap<ValidatorId, Hash>,
    /// Winning hash once quorum is reached.
    pub approved: Option<Hash>,
    /// Validator-set power the winner was measured against.
    pub approved_total: u128,
}

impl HeightSlot {
    fn new(height: u64) -> Self {
        Self {
            height,
            candidates: BTreeMap::new(),
            voters: BTreeMap::new(),
            approved: None,
            approved_total: 0,
        }
    }

    /// Record a vote and return the candidate's new power.
    ///
    /// Callers have already rejected repeat voters.
    pub fn add_vote(
        &mut self,
        validator: ValidatorId,
        block_hash: Hash,
        weight: u64,
        signature: Signature,
    ) -> u128 {
        self.voters.insert(validator, block_hash);
        let candidate = self
            .candidates
            .entry(block_hash)
            .or_insert_with(|| Candidate::new(block_hash));
        candidate.power += u128::from(weight);
        candidate.signatures.insert(validator, signature);
        candidate.power
    }

    /// Mark `winner` approved and remove every other candidate.
    pub fn approve(&mut self, winner: Hash, total_power: u128) -> Vec<Candidate> {
        self.approved = Some(winner);
        self.approved_total = total_power;
        let losers: Vec<Hash> = self
            .candidates
            .keys()
            .filter(|hash| **hash != winner)
            .copied()
            .collect();
        losers
            .into_iter()
            .filter_map(|hash| self.candidates.remove(&hash))
            .collect()
    }

    pub fn winner(&self) -> Option<&Candidate> {
        self.approved.and_then(|hash| self.candidates.get(&hash))
    }
}

/// Fixed-size ring of height slots.
#[derive(Clone, Debug)]
pub struct VoteWindow {
    slots: Vec<Option<HeightSlot>>,
}

impl VoteWindow {
    /// `size` must be at least one.
    pub fn new(size: u64) -> Self {
        let size = usize::try_from(size.max(1)).unwrap_or(usize::MAX);
        Self {
            slots: vec![None; size],
        }
    }

    pub fn size(&self) -> u64 {
        self.slots.len() as u64
    }

    fn index(&self, height: u64) -> usize {
        (height % self.size()) as usize
    }

    pub fn get(&self, height: u64) -> Option<&HeightSlot> {
        self.slots[self.index(height)]
            .as_ref()
            .filter(|slot| slot.height == height)
    }

    /// Slot for `height`, created empty if absent.
    ///
    /// A slot at the same index for another height is stale and replaced.
    pub fn get_or_insert(&mut self, height: u64) -> &mut HeightSlot {
        let index = self.index(height);
        let entry = &mut self.slots[index];
        if entry.as_ref().map(|slot| slot.height) != Some(height) {
            *entry = Some(HeightSlot::new(height));
        }
        match entry {
            Some(slot) => slot,
            None => unreachable!("slot populated above"),
        }
    }

    pub fn take(&mut self, height: u64) -> Option<HeightSlot> {
        let index = self.index(height);
        match &self.slots[index] {
            Some(slot) if slot.height == height => self.slots[index].take(),
            _ => None,
        }
    }

    /// Occupied slots in height order.
    pub fn occupied(&self) -> Vec<&HeightSlot> {
        let mut slots: Vec<&HeightSlot> = self.slots.iter().flatten().collect();
        slots.sort_by_key(|slot| slot.height);
        slots
    }

    /// Drop every unapproved candidate and its voters, returning
    /// `(height, candidate)` pairs in height then hash order.
    pub fn clear_pending(&mut self) -> Vec<(u64, Candidate)> {
        let mut cleared = Vec::new();
        for entry in self.slots.iter_mut() {
            let Some(slot) = entry else { continue };
            if slot.approved.is_some() {
                continue;
            }
            let height = slot.height;
            cleared.extend(
                std::mem::take(&mut slot.candidates)
                    .into_values()
                    .map(|candidate| (height, candidate)),
            );
            *entry = None;
        }
        cleared.sort_by(|a, b| (a.0, a.1.block_hash).cmp(&(b.0, b.1.block_hash)));
        cleared
    }

    /// Number of heights holding at least one vote.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
