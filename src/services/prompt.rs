//! Prompt builder: turns an intake record into the one-shot instruction
//! prompt and the durable patient summary.
//!
//! The instruction prompt seeds only the first completion call. The summary
//! is what the transcript keeps and replays on every later call.

use std::fmt::Write;

use super::intake::{ClinicalDetails, IntakeRecord};

const NONE: &str = "None";

const PHYSICIAN_ROLE: &str = "You are a highly experienced medical doctor.";

const CONSULTATION_GUIDANCE: &str = "\
Ask follow-up questions if needed, give a probable diagnosis, and detailed treatment advice.
Always respond in a professional and empathetic manner.
Provide a summary of the patient's condition and recommended next steps.
If you need more information, ask the patient directly.
At no point should you say \"I am not a doctor\" or \"I cannot provide medical advice\".
The patient should not feel that they are talking to an AI; this gives them a sense of trust.";

/// Output of [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    /// Sent as the sole message of the first completion call.
    pub instruction: String,
    /// First transcript entry, replayed on every later call.
    pub summary: String,
}

#[must_use]
pub fn build(intake: &IntakeRecord) -> BuiltPrompt {
    BuiltPrompt { instruction: instruction_prompt(intake), summary: patient_summary(intake) }
}

fn instruction_prompt(intake: &IntakeRecord) -> String {
    let mut out = format!(
        "{PHYSICIAN_ROLE} The patient is {} years old, {}.\n",
        intake.age,
        intake.gender.as_str()
    );
    match &intake.details {
        ClinicalDetails::Detailed { medical_history, medications, allergies, symptoms } => {
            let _ = writeln!(out, "Medical history: {medical_history}");
            let _ = writeln!(out, "Current medications: {medications}");
            let _ = writeln!(out, "Allergies: {allergies}");
            let _ = writeln!(out, "Symptoms: {symptoms}");
        }
        ClinicalDetails::Concerns { concerns } => {
            let _ = writeln!(out, "In their own words, the patient describes their concerns as follows:");
            let _ = writeln!(out, "{concerns}");
            out.push_str("Use the patient's age and gender to interpret these concerns.\n");
        }
    }
    out.push_str(CONSULTATION_GUIDANCE);
    out
}

fn patient_summary(intake: &IntakeRecord) -> String {
    let mut out = String::from("Patient Summary:\n");
    let _ = writeln!(out, "- Age: {} years", intake.age);
    let _ = write!(out, "- Gender: {}", intake.gender.as_str());
    match &intake.details {
        ClinicalDetails::Detailed { medical_history, medications, allergies, symptoms } => {
            let _ = write!(out, "\n- Medical history: {}", or_none(medical_history));
            let _ = write!(out, "\n- Current medications: {}", or_none(medications));
            let _ = write!(out, "\n- Allergies: {}", or_none(allergies));
            let _ = write!(out, "\n- Symptoms: {symptoms}");
        }
        ClinicalDetails::Concerns { concerns } => {
            let _ = write!(out, "\n- Concerns: {concerns}");
        }
    }
    out
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() { NONE } else { value }
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
