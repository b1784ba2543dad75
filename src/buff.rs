//! Buffs: time-limited effects whose magnitude is driven by rank.
//!
//! A buff's rank comes from talent investment and its activation from
//! spell casts; the two are independent. A rank-0 buff can be active and
//! simply contributes nothing.

use crate::error::{Result, SimError};
use crate::talent::{RankEffect, RankScoped, RankedMagnitude};
use serde::{Deserialize, Serialize};

/// A rank-scaled, time-limited effect on the caster.
///
/// # Examples
///
/// ```rust
/// use combatsim::{Buff, RankEffect, RankScoped};
///
/// let mut buff = Buff::new("Death Wish", 30.0).with_physical_damage_per_rank(0.2);
/// buff.increase_rank(&RankEffect::Rank).unwrap();
///
/// assert_eq!(buff.physical_damage_bonus(), 0.0);
/// buff.apply(10.0);
/// assert!((buff.physical_damage_bonus() - 0.2).abs() < 1e-9);
/// assert_eq!(buff.expires_at(), Some(40.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    name: String,
    base_duration: f64,
    duration_bonus: RankedMagnitude,
    rank: u32,
    physical_damage_per_rank: f64,
    active: bool,
    expires_at: f64,
}

impl Buff {
    /// Create an inactive rank-0 buff lasting `duration` seconds.
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            name: name.into(),
            base_duration: duration,
            duration_bonus: RankedMagnitude::default(),
            rank: 0,
            physical_damage_per_rank: 0.0,
            active: false,
            expires_at: 0.0,
        }
    }

    /// Physical damage increase per rank while active, as a fraction.
    pub fn with_physical_damage_per_rank(mut self, per_rank: f64) -> Self {
        self.physical_damage_per_rank = per_rank;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Duration including talent bonuses.
    pub fn duration(&self) -> f64 {
        self.base_duration + self.duration_bonus.total()
    }

    /// When the current application ends, if active.
    pub fn expires_at(&self) -> Option<f64> {
        self.active.then_some(self.expires_at)
    }

    /// Activate (or refresh) at `now`. Returns the new expiry time.
    pub fn apply(&mut self, now: f64) -> f64 {
        self.active = true;
        self.expires_at = now + self.duration();
        self.expires_at
    }

    /// Deactivate immediately.
    pub fn remove(&mut self) {
        self.active = false;
    }

    /// Deactivate if the current application has run out at `now`.
    ///
    /// Returns `true` if the buff expired. Expiry events left over from an
    /// application that was since refreshed find the buff still running and
    /// do nothing.
    pub fn expire_if_due(&mut self, now: f64, epsilon: f64) -> bool {
        if self.active && self.expires_at - now <= epsilon {
            self.active = false;
            return true;
        }
        false
    }

    /// Current physical damage bonus, zero when inactive.
    pub fn physical_damage_bonus(&self) -> f64 {
        if self.active {
            self.physical_damage_per_rank * f64::from(self.rank)
        } else {
            0.0
        }
    }

    /// Clear activation between iterations. Rank is kept.
    pub fn reset(&mut self) {
        self.active = false;
        self.expires_at = 0.0;
    }

    fn unsupported(&self, effect: &RankEffect) -> SimError {
        SimError::UnsupportedRankEffect {
            target: self.name.clone(),
            effect: format!("{effect:?}"),
        }
    }
}

impl RankScoped for Buff {
    fn increase_rank(&mut self, effect: &RankEffect) -> Result<()> {
        match effect {
            RankEffect::Rank => self.rank += 1,
            RankEffect::DurationBonus(seconds) => self.duration_bonus.add(*seconds),
            other => return Err(self.unsupported(other)),
        }
        Ok(())
    }

    fn decrease_rank(&mut self, effect: &RankEffect) -> Result<()> {
        match effect {
            RankEffect::Rank => {
                self.rank = self
                    .rank
                    .checked_sub(1)
                    .ok_or_else(|| SimError::TalentAtMinRank(self.name.clone()))?;
            }
            RankEffect::DurationBonus(seconds) => {
                if !self.duration_bonus.remove(*seconds) {
                    return Err(SimError::TalentAtMinRank(self.name.clone()));
                }
            }
            other => return Err(self.unsupported(other)),
        }
        Ok(())
    }
}
