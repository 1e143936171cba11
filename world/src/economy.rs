//! Player gold and lives.

use castle_defence_core::{EconomyError, Gold, LevelSummary};

/// Gold, lives and the cumulative counters used for scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerState {
    gold: Gold,
    lives: u32,
    starting_gold: Gold,
    max_lives: u32,
    gold_earned: Gold,
    gold_spent: Gold,
}

impl PlayerState {
    /// Creates the state a level starts with.
    #[must_use]
    pub const fn new(starting_gold: Gold, starting_lives: u32) -> Self {
        Self {
            gold: starting_gold,
            lives: starting_lives,
            starting_gold,
            max_lives: starting_lives,
            gold_earned: Gold::ZERO,
            gold_spent: Gold::ZERO,
        }
    }

    /// Credits gold to the player.
    pub fn add_gold(&mut self, amount: Gold) {
        self.gold = self.gold.saturating_add(amount);
        self.gold_earned = self.gold_earned.saturating_add(amount);
    }

    /// Debits gold from the player.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InsufficientGold`] and leaves the state
    /// untouched when `amount` exceeds the available gold.
    pub fn spend_gold(&mut self, amount: Gold) -> Result<(), EconomyError> {
        let Some(remaining) = self.gold.checked_sub(amount) else {
            return Err(EconomyError::InsufficientGold {
                required: amount,
                available: self.gold,
            });
        };
        self.gold = remaining;
        self.gold_spent = self.gold_spent.saturating_add(amount);
        Ok(())
    }

    /// Removes a single life, returning `false` when none were left.
    pub fn lose_life(&mut self) -> bool {
        if self.lives == 0 {
            return false;
        }
        self.lives -= 1;
        true
    }

    /// Reports whether `amount` can be spent right now.
    #[must_use]
    pub fn can_afford(&self, amount: Gold) -> bool {
        self.gold >= amount
    }

    /// Gold currently available.
    #[must_use]
    pub const fn gold(&self) -> Gold {
        self.gold
    }

    /// Lives currently remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Gold available when the level started.
    #[must_use]
    pub const fn starting_gold(&self) -> Gold {
        self.starting_gold
    }

    /// Lives available when the level started.
    #[must_use]
    pub const fn max_lives(&self) -> u32 {
        self.max_lives
    }

    /// Total gold credited since the level started.
    #[must_use]
    pub const fn gold_earned(&self) -> Gold {
        self.gold_earned
    }

    /// Total gold debited since the level started.
    #[must_use]
    pub const fn gold_spent(&self) -> Gold {
        self.gold_spent
    }

    /// Scoring summary of the current state.
    #[must_use]
    pub const fn summary(&self) -> LevelSummary {
        LevelSummary {
            final_lives: self.lives,
            max_lives: self.max_lives,
            gold_spent: self.gold_spent,
            starting_gold: self.starting_gold,
        }
    }
}
