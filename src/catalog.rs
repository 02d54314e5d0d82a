use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{Difficulty, PuzzleData};
use crate::error::DataResult;
use crate::session::PuzzleKey;

/// Every available puzzle, grouped by tier and ordered by id within a tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tiers: BTreeMap<Difficulty, Vec<PuzzleData>>,
}

impl Catalog {
    /// Parse a catalog of the form `{ "easy": [...], "medium": [...], "hard": [...] }`.
    ///
    /// Tiers may be left out. Every puzzle is validated.
    pub fn from_json(json: &str) -> DataResult<Self> {
        let tiers: BTreeMap<Difficulty, Vec<PuzzleData>> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for (tier, puzzles) in tiers {
            for puzzle in puzzles {
                catalog.insert(tier, puzzle)?;
            }
        }
        info!(
            easy = catalog.len(Difficulty::Easy),
            medium = catalog.len(Difficulty::Medium),
            hard = catalog.len(Difficulty::Hard),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Add a validated puzzle to `tier`, keeping the tier ordered by id.
    pub fn insert(&mut self, tier: Difficulty, puzzle: PuzzleData) -> DataResult<()> {
        puzzle.validate()?;
        let puzzles = self.tiers.entry(tier).or_default();
        let at = puzzles.partition_point(|p| p.id <= puzzle.id);
        puzzles.insert(at, puzzle);
        Ok(())
    }

    /// The puzzles of `tier`, ordered by id.
    pub fn tier(&self, tier: Difficulty) -> &[PuzzleData] {
        self.tiers.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Number of puzzles in `tier`.
    pub fn len(&self, tier: Difficulty) -> usize {
        self.tier(tier).len()
    }

    /// Whether no tier holds any puzzle.
    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(Vec::is_empty)
    }

    /// The puzzle at `index` within `tier`.
    pub fn get(&self, tier: Difficulty, index: usize) -> Option<&PuzzleData> {
        self.tier(tier).get(index)
    }
}

/// The player's place in the catalog: the current tier, and a remembered position in each tier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigator {
    tier: Difficulty,
    positions: BTreeMap<Difficulty, usize>,
}

impl Navigator {
    /// Starts on the first puzzle of the easiest tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tier.
    pub fn tier(&self) -> Difficulty {
        self.tier
    }

    /// Switch tiers, returning to wherever the player last was in `tier`.
    pub fn set_tier(&mut self, tier: Difficulty) {
        self.tier = tier;
    }

    /// Zero-based position within the current tier.
    pub fn index(&self) -> usize {
        self.positions.get(&self.tier).copied().unwrap_or(0)
    }

    fn go<'a>(&mut self, catalog: &'a Catalog, index: usize) -> Option<&'a PuzzleData> {
        self.positions.insert(self.tier, index);
        catalog.get(self.tier, index)
    }

    /// The puzzle at the current position, wrapping a position that no longer fits the tier back to the start.
    pub fn current<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a PuzzleData> {
        let index = if self.index() < catalog.len(self.tier) { self.index() } else { 0 };
        self.go(catalog, index)
    }

    /// Step forward, wrapping from the last puzzle to the first.
    pub fn next<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a PuzzleData> {
        let len = catalog.len(self.tier);
        if len == 0 {
            return None;
        }
        let index = (self.index() + 1) % len;
        self.go(catalog, index)
    }

    /// Step back, wrapping from the first puzzle to the last.
    pub fn previous<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a PuzzleData> {
        let len = catalog.len(self.tier);
        if len == 0 {
            return None;
        }
        let index = if self.index() == 0 || self.index() >= len { len - 1 } else { self.index() - 1 };
        self.go(catalog, index)
    }

    /// Jump to the first puzzle of the tier.
    pub fn first<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a PuzzleData> {
        self.go(catalog, 0)
    }

    /// Jump to the last puzzle of the tier.
    pub fn last<'a>(&mut self, catalog: &'a Catalog) -> Option<&'a PuzzleData> {
        let index = catalog.len(self.tier).saturating_sub(1);
        self.go(catalog, index)
    }

    /// Status text such as `#3 of 12`.
    pub fn position_caption(&self, catalog: &Catalog) -> String {
        format!("#{} of {}", self.index() + 1, catalog.len(self.tier))
    }
}

/// Fastest completion per puzzle, in milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BestTimes {
    times: BTreeMap<Difficulty, BTreeMap<u32, u64>>,
}

impl BestTimes {
    /// Read a table previously written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the table as JSON.
    pub fn to_json(&self) -> String {
        // string keys and integer values always serialize
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Keep `elapsed` if it beats the stored time for `puzzle`. Returns whether it did.
    pub fn record(&mut self, puzzle: PuzzleKey, elapsed: Duration) -> bool {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let best = self.times.entry(puzzle.tier).or_default().entry(puzzle.id).or_insert(u64::MAX);
        if millis < *best {
            *best = millis;
            info!(%puzzle, millis, "new best time");
            true
        } else {
            false
        }
    }

    /// The stored best time for `puzzle`.
    pub fn best(&self, puzzle: PuzzleKey) -> Option<Duration> {
        self.times
            .get(&puzzle.tier)
            .and_then(|tier| tier.get(&puzzle.id))
            .map(|millis| Duration::from_millis(*millis))
    }
}
