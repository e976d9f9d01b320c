//! The ordered level list and its hint table.
//!
//! The shipped catalog is assembled once, on first use, and checked for
//! consistency before any session can see it:
//!
//! - level ids run 1, 2, 3, ... with no gaps
//! - every level has a hint set and every hint set names a level
//! - every level's tier-4 solution passes that level's own validator
//!
//! A failed check is a [`CatalogInconsistency`](SingularityError::CatalogInconsistency),
//! which is fatal at startup and never surfaces mid-session.

mod levels_early;
mod levels_late;

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{Result, SingularityError};
use crate::execution::run_level;
use crate::hints::{HintSet, HINTS};
use crate::level::Level;

static SHIPPED: OnceCell<Catalog> = OnceCell::new();

/// Validated, immutable curriculum.
#[derive(Debug)]
pub struct Catalog {
    levels: Vec<&'static Level>,
    hints: HashMap<u32, &'static HintSet>,
}

impl Catalog {
    /// Returns the shipped catalog, assembling it on first call.
    pub fn shipped() -> Result<&'static Self> {
        SHIPPED.get_or_try_init(|| {
            Self::assemble(
                levels_early::LEVELS.iter().chain(levels_late::LEVELS.iter()),
                &HINTS,
            )
        })
    }

    /// Builds a catalog from levels and hints, enforcing every invariant.
    pub fn assemble(
        levels: impl IntoIterator<Item = &'static Level>,
        hints: &'static [HintSet],
    ) -> Result<Self> {
        let levels: Vec<&'static Level> = levels.into_iter().collect();
        if levels.is_empty() {
            return Err(SingularityError::catalog("no levels defined"));
        }
        for (expected, level) in (1u32..).zip(&levels) {
            if level.id != expected {
                return Err(SingularityError::catalog(format!(
                    "expected level {expected}, found level {}",
                    level.id
                )));
            }
        }

        let mut by_level = HashMap::with_capacity(hints.len());
        for set in hints {
            if set.level_id == 0 || set.level_id as usize > levels.len() {
                return Err(SingularityError::catalog(format!(
                    "hints defined for unknown level {}",
                    set.level_id
                )));
            }
            if by_level.insert(set.level_id, set).is_some() {
                return Err(SingularityError::catalog(format!(
                    "duplicate hints for level {}",
                    set.level_id
                )));
            }
        }

        let catalog = Self {
            levels,
            hints: by_level,
        };

        for level in &catalog.levels {
            let set = catalog.hints.get(&level.id).ok_or_else(|| {
                SingularityError::catalog(format!("missing hints for level {}", level.id))
            })?;
            let verdict = run_level(set.solution(), level);
            if !verdict.success {
                return Err(SingularityError::catalog(format!(
                    "solution for level {} is rejected by its validator: {}",
                    level.id, verdict.message
                )));
            }
        }

        debug!(levels = catalog.levels.len(), "Level catalog assembled");
        Ok(catalog)
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`: assembly rejects an empty catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Id of the final level.
    #[must_use]
    pub fn last_id(&self) -> u32 {
        self.levels.last().map_or(0, |level| level.id)
    }

    /// Returns `true` if `id` names a level.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        (1..=self.last_id()).contains(&id)
    }

    /// Looks up a level by id.
    pub fn level(&self, id: u32) -> Result<&'static Level> {
        id.checked_sub(1)
            .and_then(|index| self.levels.get(index as usize))
            .copied()
            .ok_or_else(|| SingularityError::unknown_level(id, self.last_id()))
    }

    /// Iterates levels in order.
    pub fn levels(&self) -> impl Iterator<Item = &'static Level> + '_ {
        self.levels.iter().copied()
    }

    /// Returns the hint set for a level.
    pub fn hints(&self, id: u32) -> Result<&'static HintSet> {
        self.hints
            .get(&id)
            .copied()
            .ok_or_else(|| SingularityError::unknown_level(id, self.last_id()))
    }

    /// Returns the hint text for a level and tier.
    pub fn hint(&self, id: u32, tier: u8) -> Result<&'static str> {
        self.hints(id)?.tier(tier)
    }

    /// Returns the tier-4 solution for a level, prefix removed.
    pub fn solution(&self, id: u32) -> Result<&'static str> {
        Ok(self.hints(id)?.solution())
    }
}
