//! Wizard steps

use std::fmt;

/// The seven steps of the close wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Setup,
    Sales,
    Payments,
    Expenses,
    Withdrawal,
    Count,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        Self::Setup,
        Self::Sales,
        Self::Payments,
        Self::Expenses,
        Self::Withdrawal,
        Self::Count,
        Self::Review,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(self) -> bool {
        self == Self::Setup
    }

    pub fn is_last(self) -> bool {
        self == Self::Review
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Setup => "Store, date and compiler",
            Self::Sales => "Sales receipt",
            Self::Payments => "Payments by method",
            Self::Expenses => "Cash expenses",
            Self::Withdrawal => "Bank withdrawal",
            Self::Count => "Cash count",
            Self::Review => "Review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {}/{}: {}",
            self.index() + 1,
            Self::ALL.len(),
            self.title()
        )
    }
}
