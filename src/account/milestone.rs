//! Daily transaction milestones.

/// A claimable quota milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MilestoneStage {
    First,
    Second,
    Third,
}

impl MilestoneStage {
    /// All stages in claim order.
    pub const ALL: [MilestoneStage; 3] = [Self::First, Self::Second, Self::Third];

    /// Stage number as the service expects it.
    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    /// Completed transactions needed to unlock the stage.
    pub fn threshold(self) -> u32 {
        match self {
            Self::First => 10,
            Self::Second => 50,
            Self::Third => 100,
        }
    }

    pub fn is_eligible(self, completed: u32) -> bool {
        completed >= self.threshold()
    }
}

/// Stages unlocked by `completed` transactions, ascending.
pub fn eligible_stages(completed: u32) -> Vec<MilestoneStage> {
    MilestoneStage::ALL
        .into_iter()
        .filter(|stage| stage.is_eligible(completed))
        .collect()
}
