//! Rank progression graph
//!
//! Ranks are stored in an arena and linked forward by index:
//! - `next` is an index into the same chain (or `None` at the end)
//! - links are validated once at construction (in range, acyclic)
//! - the chain is read-only afterwards

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Index of a rank inside its [`RankChain`]
pub type RankId = usize;

/// How a rank is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Timed segment inside a level
    #[default]
    Normal,
    /// Level-boundary checkpoint (exactly one rank per level)
    HighScore,
}

/// Ammo reward/penalty magnitudes for a rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Difficulty {
    /// Rounds granted to the sentry on a successful breath
    pub ammo_grant_for_hit: u32,
    /// Rounds removed from the sentry on a missed breath
    pub ammo_reduction_for_miss: u32,
}

impl Difficulty {
    pub const fn new(ammo_grant_for_hit: u32, ammo_reduction_for_miss: u32) -> Self {
        Self {
            ammo_grant_for_hit,
            ammo_reduction_for_miss,
        }
    }
}

/// One step of the progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub name: String,
    #[serde(default)]
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    /// Countdown length for this rank
    pub duration_secs: f32,
    /// Following rank (`None` = end of progression)
    #[serde(default)]
    pub next: Option<RankId>,
}

impl Rank {
    pub fn new(
        name: impl Into<String>,
        game_mode: GameMode,
        difficulty: Difficulty,
        duration_secs: f32,
    ) -> Self {
        Self {
            name: name.into(),
            game_mode,
            difficulty,
            duration_secs,
            next: None,
        }
    }

    pub fn normal(name: impl Into<String>, difficulty: Difficulty, duration_secs: f32) -> Self {
        Self::new(name, GameMode::Normal, difficulty, duration_secs)
    }

    pub fn high_score(name: impl Into<String>, difficulty: Difficulty, duration_secs: f32) -> Self {
        Self::new(name, GameMode::HighScore, difficulty, duration_secs)
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.game_mode == GameMode::Normal
    }
}

/// Validated, read-only arena of ranks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rank>", into = "Vec<Rank>")]
pub struct RankChain {
    ranks: Vec<Rank>,
}

impl RankChain {
    /// Build a chain from pre-linked records, validating every `next` link
    pub fn new(ranks: Vec<Rank>) -> GameResult<Self> {
        if ranks.is_empty() {
            return Err(GameError::InvalidRankChain("chain has no ranks".into()));
        }

        let len = ranks.len();
        for (id, rank) in ranks.iter().enumerate() {
            if let Some(next) = rank.next {
                if next >= len {
                    return Err(GameError::InvalidRankChain(format!(
                        "rank {id} ({}) links to missing rank {next}",
                        rank.name
                    )));
                }
            }
            if !(rank.duration_secs.is_finite() && rank.duration_secs > 0.0) {
                return Err(GameError::InvalidRankChain(format!(
                    "rank {id} ({}) has non-positive duration {}",
                    rank.name, rank.duration_secs
                )));
            }
        }

        // Any walk longer than the chain itself must have revisited a rank
        for start in 0..len {
            let mut steps = 0;
            let mut cursor = ranks[start].next;
            while let Some(id) = cursor {
                steps += 1;
                if steps > len {
                    return Err(GameError::InvalidRankChain(format!(
                        "cycle reachable from rank {start} ({})",
                        ranks[start].name
                    )));
                }
                cursor = ranks[id].next;
            }
        }

        Ok(Self { ranks })
    }

    /// Link ranks in list order (each rank's `next` is the following entry)
    pub fn linear(mut ranks: Vec<Rank>) -> GameResult<Self> {
        link_in_order(&mut ranks);
        Self::new(ranks)
    }

    /// Built-in progression: three levels, each closed by a high score checkpoint
    pub fn default_progression() -> Self {
        let mut ranks = vec![
            Rank::normal("Novice I", Difficulty::new(10, 4), 30.0),
            Rank::normal("Novice II", Difficulty::new(10, 6), 30.0),
            Rank::high_score("Novice Checkpoint", Difficulty::new(8, 8), 45.0),
            Rank::normal("Adept I", Difficulty::new(8, 8), 30.0),
            Rank::normal("Adept II", Difficulty::new(7, 9), 35.0),
            Rank::high_score("Adept Checkpoint", Difficulty::new(6, 10), 45.0),
            Rank::normal("Master I", Difficulty::new(6, 10), 40.0),
            Rank::high_score("Master Checkpoint", Difficulty::new(5, 12), 60.0),
        ];
        link_in_order(&mut ranks);
        Self { ranks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Always false for a constructed chain
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    #[inline]
    pub fn get(&self, id: RankId) -> Option<&Rank> {
        self.ranks.get(id)
    }

    #[inline]
    pub fn contains(&self, id: RankId) -> bool {
        id < self.ranks.len()
    }

    pub fn next_of(&self, id: RankId) -> Option<RankId> {
        self.get(id).and_then(|rank| rank.next)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RankId, &Rank)> {
        self.ranks.iter().enumerate()
    }

    /// Follow `next` links starting at (and including) `start`
    pub fn walk_from(&self, start: RankId) -> RankWalk<'_> {
        RankWalk {
            chain: self,
            cursor: self.contains(start).then_some(start),
        }
    }

    /// First high score checkpoint at or after `start`, `None` if the chain runs out
    pub fn find_first_high_score_rank(&self, start: RankId) -> Option<RankId> {
        self.walk_from(start)
            .find(|(_, rank)| rank.game_mode == GameMode::HighScore)
            .map(|(id, _)| id)
    }

    /// `current` plus every immediately following `Normal` rank
    ///
    /// Fails when `current` is absent or a high score checkpoint: those levels
    /// have exactly one rank.
    pub fn ranks_for_normal_level(&self, current: Option<RankId>) -> GameResult<Vec<RankId>> {
        let start = match current.and_then(|id| self.get(id).map(|rank| (id, rank))) {
            Some((id, rank)) if rank.is_normal() => id,
            _ => return Err(GameError::NotNormalRank(current)),
        };

        Ok(self
            .walk_from(start)
            .take_while(|(_, rank)| rank.is_normal())
            .map(|(id, _)| id)
            .collect())
    }
}

fn link_in_order(ranks: &mut [Rank]) {
    let len = ranks.len();
    for (id, rank) in ranks.iter_mut().enumerate() {
        rank.next = (id + 1 < len).then_some(id + 1);
    }
}

impl std::ops::Index<RankId> for RankChain {
    type Output = Rank;

    fn index(&self, id: RankId) -> &Rank {
        &self.ranks[id]
    }
}

impl TryFrom<Vec<Rank>> for RankChain {
    type Error = GameError;

    fn try_from(ranks: Vec<Rank>) -> GameResult<Self> {
        Self::new(ranks)
    }
}

impl From<RankChain> for Vec<Rank> {
    fn from(chain: RankChain) -> Self {
        chain.ranks
    }
}

/// Iterator over a chain following `next` links
pub struct RankWalk<'a> {
    chain: &'a RankChain,
    cursor: Option<RankId>,
}

impl<'a> Iterator for RankWalk<'a> {
    type Item = (RankId, &'a Rank);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let rank = self.chain.get(id)?;
        self.cursor = rank.next;
        Some((id, rank))
    }
}
