/// A rejected input. Raised before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Age must be between 1 and 120")]
    AgeOutOfRange,

    #[error("Height must be positive")]
    NonPositiveHeight,

    #[error("Current weight must be positive")]
    NonPositiveCurrentWeight,

    #[error("Target weight must be positive")]
    NonPositiveTargetWeight,

    #[error("Weight must be positive")]
    NonPositiveWeight,

    #[error("Weight must be between 20 and 300 kg")]
    WeightOutOfRange,

    #[error("Cannot add weight for future dates")]
    FutureWeightDate,

    #[error("Grams must be positive")]
    NonPositiveGrams,

    #[error("Grams cannot exceed 10kg")]
    TooManyGrams,

    #[error("Duration must be positive")]
    NonPositiveDuration,

    #[error("Notes must be less than 1000 characters")]
    NotesTooLong,

    #[error("Name cannot be blank")]
    BlankTechniqueName,

    #[error("Description must be less than 2000 characters")]
    DescriptionTooLong,

    #[error("Query must be at least 2 characters")]
    QueryTooShort,

    #[error("Invalid month {month} of {year}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Invalid {kind} '{value}'. Must be one of: {allowed}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        allowed: String,
    },
}

/// Outcome of a use case that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("Food lookup failed: {0:#}")]
    Remote(#[source] anyhow::Error),
}

impl UseCaseError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, UseCaseError::Validation(_))
    }

    /// The validation failure, if that is what this is.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            UseCaseError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UseCaseError>;
