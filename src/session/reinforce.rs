//! Reinforcement selection
//!
//! On every advance, a stale item from the reinforcement pool may interrupt
//! the normal sequence. The cool-down scales with the pool: an item qualifies
//! once it has not been viewed for more minutes than the pool has items.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::ItemId;
use crate::deck::FilterMode;

/// What the session shows after an advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Resume normal cursor movement
    Advance,
    /// Show this pool item out of sequence
    Reinforce(ItemId),
}

pub struct ReinforcementSelector {
    probability: f64,
    rng: StdRng,
}

impl ReinforcementSelector {
    pub fn new(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_entropy())
    }

    pub fn with_seed(probability: f64, seed: u64) -> Self {
        Self::with_rng(probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(probability: f64, rng: StdRng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng,
        }
    }

    /// Decide the next item
    ///
    /// `staleness` returns minutes since an item was last viewed (infinite
    /// when never viewed). Pool items outside `deck` are ignored. The
    /// currently reinforced item is never chosen again.
    pub fn select<S>(
        &mut self,
        filter: &FilterMode,
        pool: &[ItemId],
        staleness: S,
        deck: &[ItemId],
        current: Option<&ItemId>,
    ) -> Selection
    where
        S: Fn(&ItemId) -> f64,
    {
        // The pool already is the deck
        if filter.is_frequency() || pool.is_empty() {
            return Selection::Advance;
        }
        if !self.rng.gen_bool(self.probability) {
            return Selection::Advance;
        }

        let in_deck: HashSet<&ItemId> = deck.iter().collect();
        let cool_down = pool.len() as f64;
        let candidates: Vec<&ItemId> = pool
            .iter()
            .filter(|id| in_deck.contains(*id) && staleness(*id) > cool_down)
            .collect();

        match candidates.choose(&mut self.rng) {
            Some(&id) if Some(id) != current => Selection::Reinforce(id.clone()),
            _ => Selection::Advance,
        }
    }
}
