//! Intake form: field schema per variant and validation into an
//! immutable `IntakeRecord`.
//!
//! DESIGN
//! ======
//! The two deployments differ only in which clinical free-text fields the
//! form asks for. `IntakeVariant` selects the schema; everything downstream
//! works on `IntakeRecord` and matches on `ClinicalDetails` where the
//! variants diverge.

use serde::{Deserialize, Serialize};

pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;
/// The concerns variant requires at least this many whitespace-separated words.
pub const MIN_CONCERN_WORDS: usize = 10;

// =============================================================================
// VARIANT
// =============================================================================

/// Which intake schema (and prompt wording) this deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeVariant {
    /// History, medications, allergies and symptoms as separate fields.
    Detailed,
    /// A single free-text concerns field.
    Concerns,
}

impl IntakeVariant {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Concerns => "concerns",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "detailed" => Some(Self::Detailed),
            "concerns" => Some(Self::Concerns),
            _ => None,
        }
    }

    /// Validate a submitted form against this variant's schema.
    ///
    /// Fields belonging to the other variant are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first failing field's [`ValidationError`], checked in form
    /// order (age, gender, clinical text).
    pub fn validate(self, form: &IntakeForm) -> Result<IntakeRecord, ValidationError> {
        let age = parse_age(&form.age)?;
        let gender = Gender::parse(&form.gender).ok_or(ValidationError::Gender)?;

        let details = match self {
            Self::Detailed => {
                if form.symptoms.trim().is_empty() {
                    return Err(ValidationError::Symptoms);
                }
                ClinicalDetails::Detailed {
                    medical_history: form.medical_history.clone(),
                    medications: form.medications.clone(),
                    allergies: form.allergies.clone(),
                    symptoms: form.symptoms.clone(),
                }
            }
            Self::Concerns => {
                let words = form.concerns.split_whitespace().count();
                if words < MIN_CONCERN_WORDS {
                    return Err(ValidationError::Concerns { words });
                }
                ClinicalDetails::Concerns { concerns: form.concerns.clone() }
            }
        };

        Ok(IntakeRecord { age, gender, details })
    }
}

fn parse_age(raw: &str) -> Result<u8, ValidationError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .ok_or(ValidationError::Age)
}

// =============================================================================
// RECORD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Other];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Variant-specific clinical free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ClinicalDetails {
    Detailed {
        medical_history: String,
        medications: String,
        allergies: String,
        symptoms: String,
    },
    Concerns {
        concerns: String,
    },
}

/// Validated patient intake. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeRecord {
    pub age: u8,
    pub gender: Gender,
    pub details: ClinicalDetails,
}

// =============================================================================
// FORM
// =============================================================================

/// Raw form submission. Every field is optional on the wire so that a
/// missing input surfaces as a validation message rather than a 400.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IntakeForm {
    pub age: String,
    pub gender: String,
    pub medical_history: String,
    pub medications: String,
    pub allergies: String,
    pub symptoms: String,
    pub concerns: String,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Form field a validation message is shown next to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeField {
    Age,
    Gender,
    Symptoms,
    Concerns,
}

impl IntakeField {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Symptoms => "symptoms",
            Self::Concerns => "concerns",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid age between 1 and 120.")]
    Age,
    #[error("Please select Male, Female or Other.")]
    Gender,
    #[error("Please enter your symptoms before consultation.")]
    Symptoms,
    #[error("Please describe your concerns in at least 10 words (you wrote {words}).")]
    Concerns { words: usize },
}

impl ValidationError {
    #[must_use]
    pub fn field(&self) -> IntakeField {
        match self {
            Self::Age => IntakeField::Age,
            Self::Gender => IntakeField::Gender,
            Self::Symptoms => IntakeField::Symptoms,
            Self::Concerns { .. } => IntakeField::Concerns,
        }
    }
}

#[cfg(test)]
#[path = "intake_test.rs"]
mod tests;
