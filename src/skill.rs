use std::collections::BTreeSet;

use crate::models::{Difficulty, SkillTier};

/// Maps a solved-problem count onto a tier. Lower bounds are inclusive.
pub fn estimate_skill(solved_count: u32) -> SkillTier {
    match solved_count {
        200.. => SkillTier::Expert,
        100..=199 => SkillTier::Advanced,
        30..=99 => SkillTier::Intermediate,
        // 5..=29 is its own band in the UI but still reads as beginner.
        _ => SkillTier::Beginner,
    }
}

/// Difficulties worth serving to a user of the given tier.
pub fn recommended_difficulties(tier: SkillTier) -> BTreeSet<Difficulty> {
    DifficultyMapping::Narrow.recommended(tier)
}

/// Solved counts split by difficulty, as shown on a profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolvedBreakdown {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl SolvedBreakdown {
    /// Saturates at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.easy.saturating_add(self.medium).saturating_add(self.hard)
    }

    /// `0.3 * total + 0.4 * (medium + hard) + 0.3 * hard`
    pub fn weighted_score(&self) -> f64 {
        let medium = self.medium as f64;
        let hard = self.hard as f64;
        let total = self.easy as f64 + medium + hard;
        0.3 * total + 0.4 * (medium + hard) + 0.3 * hard
    }
}

/// How a tier is derived from solved counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkillModel {
    /// Plain solved count against the tier table.
    #[default]
    Count,
    /// Weighted score favouring harder problems, floored and fed through the same table.
    Weighted,
}

impl SkillModel {
    pub fn assess(&self, breakdown: &SolvedBreakdown) -> SkillTier {
        match self {
            SkillModel::Count => estimate_skill(breakdown.total()),
            SkillModel::Weighted => {
                let score = breakdown.weighted_score().floor();
                estimate_skill(score.min(u32::MAX as f64) as u32)
            }
        }
    }
}

/// Tier to difficulty lookup tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DifficultyMapping {
    #[default]
    Narrow,
    /// Each tier widened by one level.
    Wide,
}

impl DifficultyMapping {
    pub fn recommended(&self, tier: SkillTier) -> BTreeSet<Difficulty> {
        use Difficulty::*;
        let levels: &[Difficulty] = match (self, tier) {
            (DifficultyMapping::Narrow, SkillTier::Beginner) => &[Easy],
            (DifficultyMapping::Narrow, SkillTier::Intermediate) => &[Easy, Medium],
            (DifficultyMapping::Narrow, SkillTier::Advanced) => &[Medium, Hard],
            (DifficultyMapping::Narrow, SkillTier::Expert) => &[Hard],
            (DifficultyMapping::Wide, SkillTier::Beginner) => &[Easy, Medium],
            (DifficultyMapping::Wide, SkillTier::Intermediate) => &[Easy, Medium, Hard],
            (DifficultyMapping::Wide, SkillTier::Advanced) => &[Medium, Hard],
            (DifficultyMapping::Wide, SkillTier::Expert) => &[Medium, Hard],
        };
        levels.iter().copied().collect()
    }
}
