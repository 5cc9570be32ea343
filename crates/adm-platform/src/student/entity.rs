//! Student Entity
//!
//! Applicant records tracked from intake through interview to an admissions
//! decision. Two evaluation tracks (technical/general) are graded
//! independently; the overall status is derived from them, never set
//! directly.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::error::{AdmissionsError, Result};
use crate::shared::validation;

/// Placeholder for a student id that has not been allocated yet.
/// Must never remain on a persisted record.
pub const TEMP_ID: &str = "TEMP_ID";

/// Prefix of allocated student ids, e.g. "KRMU0000001".
pub const STUDENT_ID_PREFIX: &str = "KRMU";

/// Width of the numeric suffix in an allocated student id.
const STUDENT_ID_DIGITS: usize = 7;

/// Evaluation status of a track, and of the overall decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EvalStatus {
    Pending,
    Pass,
    Fail,
}

impl Default for EvalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl EvalStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Whether the decision notification email has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EmailStatus {
    Pending,
    Added,
}

impl Default for EmailStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

/// Student entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Sequential human-readable id, allocated at write time
    pub student_id: String,

    /// Alphabetic only
    pub first_name: String,

    /// Alphabetic only, optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Unique, lowercased
    pub email: String,

    /// 10 digits (not uniqueness-enforced)
    pub contact_number: String,

    pub fathers_name: String,

    pub gender: Gender,

    pub course_name: String,

    pub school_name: String,

    pub state: String,

    pub city: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub interview_date: DateTime<Utc>,

    /// Free-form, e.g. "10:30 AM"
    pub interview_time: String,

    /// Account id of the randomly assigned counsellor
    pub assigned_counsellor: String,

    #[serde(default)]
    pub mcq_score: i32,

    #[serde(default)]
    pub zoom_link: String,

    /// Username of the teacher grading the general track
    #[serde(default)]
    pub general_teacher: String,

    /// Username of the teacher grading the technical track
    #[serde(default)]
    pub technical_teacher: String,

    #[serde(default)]
    pub general_status: EvalStatus,

    #[serde(default)]
    pub technical_status: EvalStatus,

    #[serde(default)]
    pub email_status: EmailStatus,

    /// Overall decision, derived from the two tracks (see `reconcile_overall`)
    #[serde(default)]
    pub status: EvalStatus,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Fields of a student record that may be patched.
/// The overall `status` is deliberately absent: it is always recomputed.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub fathers_name: Option<String>,
    pub gender: Option<Gender>,
    pub course_name: Option<String>,
    pub school_name: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_time: Option<String>,
    pub mcq_score: Option<i32>,
    pub zoom_link: Option<String>,
    pub general_teacher: Option<String>,
    pub technical_teacher: Option<String>,
    pub general_status: Option<EvalStatus>,
    pub technical_status: Option<EvalStatus>,
    pub email_status: Option<EmailStatus>,
}

/// Recompute the overall status for a patch touching either sub-status.
///
/// Evaluated over the post-merge effective sub-statuses:
/// - both tracks concluded -> the technical track decides the overall status;
/// - a track reopened while the overall status was final -> back to Pending;
/// - otherwise the stored overall status stands.
///
/// A patch touching neither sub-status leaves the overall status exactly as
/// stored.
pub fn reconcile_overall(
    current: &Student,
    technical: Option<EvalStatus>,
    general: Option<EvalStatus>,
) -> EvalStatus {
    if technical.is_none() && general.is_none() {
        return current.status;
    }

    let effective_technical = technical.unwrap_or(current.technical_status);
    let effective_general = general.unwrap_or(current.general_status);

    if !effective_technical.is_pending() && !effective_general.is_pending() {
        effective_technical
    } else if !current.status.is_pending() {
        EvalStatus::Pending
    } else {
        current.status
    }
}

impl Student {
    /// New intake record: statuses Pending, student id not yet allocated.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        first_name: impl Into<String>,
        last_name: Option<String>,
        email: impl Into<String>,
        contact_number: impl Into<String>,
        fathers_name: impl Into<String>,
        gender: Gender,
        course_name: impl Into<String>,
        school_name: impl Into<String>,
        state: impl Into<String>,
        city: impl Into<String>,
        interview_date: DateTime<Utc>,
        interview_time: impl Into<String>,
        assigned_counsellor: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            student_id: TEMP_ID.to_string(),
            first_name: first_name.into(),
            last_name,
            email: email.into().to_lowercase(),
            contact_number: contact_number.into(),
            fathers_name: fathers_name.into(),
            gender,
            course_name: course_name.into(),
            school_name: school_name.into(),
            state: state.into(),
            city: city.into(),
            interview_date,
            interview_time: interview_time.into(),
            assigned_counsellor: assigned_counsellor.into(),
            mcq_score: 0,
            zoom_link: String::new(),
            general_teacher: String::new(),
            technical_teacher: String::new(),
            general_status: EvalStatus::Pending,
            technical_status: EvalStatus::Pending,
            email_status: EmailStatus::Pending,
            status: EvalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full name used in notification emails.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// Merge a patch onto this record and recompute the overall status.
    /// `updated_at` is refreshed; callers re-validate before persisting.
    pub fn apply_patch(&mut self, patch: StudentPatch) {
        self.status = reconcile_overall(self, patch.technical_status, patch.general_status);

        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = Some(v);
        }
        if let Some(v) = patch.email {
            self.email = v.to_lowercase();
        }
        if let Some(v) = patch.contact_number {
            self.contact_number = v;
        }
        if let Some(v) = patch.fathers_name {
            self.fathers_name = v;
        }
        if let Some(v) = patch.gender {
            self.gender = v;
        }
        if let Some(v) = patch.course_name {
            self.course_name = v;
        }
        if let Some(v) = patch.school_name {
            self.school_name = v;
        }
        if let Some(v) = patch.state {
            self.state = v;
        }
        if let Some(v) = patch.city {
            self.city = v;
        }
        if let Some(v) = patch.interview_date {
            self.interview_date = v;
        }
        if let Some(v) = patch.interview_time {
            self.interview_time = v;
        }
        if let Some(v) = patch.mcq_score {
            self.mcq_score = v;
        }
        if let Some(v) = patch.zoom_link {
            self.zoom_link = v;
        }
        if let Some(v) = patch.general_teacher {
            self.general_teacher = v;
        }
        if let Some(v) = patch.technical_teacher {
            self.technical_teacher = v;
        }
        if let Some(v) = patch.general_status {
            self.general_status = v;
        }
        if let Some(v) = patch.technical_status {
            self.technical_status = v;
        }
        if let Some(v) = patch.email_status {
            self.email_status = v;
        }

        self.updated_at = Utc::now();
    }

    /// Schema-level constraints, checked before every write.
    pub fn validate(&self) -> Result<()> {
        if !validation::is_alphabetic(&self.first_name) {
            return Err(AdmissionsError::validation(
                "First name must contain only alphabets",
            ));
        }
        if let Some(last) = &self.last_name {
            if !validation::is_alphabetic(last) {
                return Err(AdmissionsError::validation(
                    "Last name must contain only alphabets",
                ));
            }
        }
        if !validation::is_valid_email(&self.email) {
            return Err(AdmissionsError::validation("Please provide a valid email"));
        }
        if !validation::is_valid_phone(&self.contact_number) {
            return Err(AdmissionsError::validation("Phone number must be 10 digits"));
        }
        if self.fathers_name.trim().is_empty() {
            return Err(AdmissionsError::validation("Father's name is required"));
        }
        if self.course_name.trim().is_empty() {
            return Err(AdmissionsError::validation("Course name is required"));
        }
        if self.school_name.trim().is_empty() {
            return Err(AdmissionsError::validation("School name is required"));
        }
        if self.state.trim().is_empty() {
            return Err(AdmissionsError::validation("State is required"));
        }
        if self.city.trim().is_empty() {
            return Err(AdmissionsError::validation("City is required"));
        }
        if self.interview_time.trim().is_empty() {
            return Err(AdmissionsError::validation("Interview time is required"));
        }
        Ok(())
    }
}

/// Format a sequence number as an allocated student id.
pub fn format_student_id(sequence: u32) -> String {
    format!("{}{:0width$}", STUDENT_ID_PREFIX, sequence, width = STUDENT_ID_DIGITS)
}

/// Parse the numeric suffix of an allocated student id.
/// Returns None for the sentinel or malformed values.
pub fn parse_student_id(student_id: &str) -> Option<u32> {
    student_id
        .strip_prefix(STUDENT_ID_PREFIX)?
        .parse::<u32>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_student() -> Student {
        Student::new(
            "Priya",
            Some("Sharma".to_string()),
            "priya@example.com",
            "9876543210",
            "Rajesh Sharma",
            Gender::Female,
            "BTech CSE",
            "DPS Gurugram",
            "Haryana",
            "Gurugram",
            Utc::now(),
            "10:30 AM",
            "counsellor-id",
        )
    }

    #[test]
    fn test_new_student_defaults() {
        let student = sample_student();
        assert_eq!(student.student_id, TEMP_ID);
        assert_eq!(student.status, EvalStatus::Pending);
        assert_eq!(student.technical_status, EvalStatus::Pending);
        assert_eq!(student.general_status, EvalStatus::Pending);
        assert_eq!(student.email_status, EmailStatus::Pending);
        assert_eq!(student.mcq_score, 0);
        assert_eq!(student.zoom_link, "");
    }

    #[test]
    fn test_full_name() {
        let mut student = sample_student();
        assert_eq!(student.full_name(), "Priya Sharma");
        student.last_name = None;
        assert_eq!(student.full_name(), "Priya");
    }

    #[test]
    fn test_student_id_formatting() {
        assert_eq!(format_student_id(1), "KRMU0000001");
        assert_eq!(format_student_id(42), "KRMU0000042");
        assert_eq!(format_student_id(1234567), "KRMU1234567");
    }

    #[test]
    fn test_student_id_parsing() {
        assert_eq!(parse_student_id("KRMU0000001"), Some(1));
        assert_eq!(parse_student_id("KRMU0000042"), Some(42));
        assert_eq!(parse_student_id(TEMP_ID), None);
        assert_eq!(parse_student_id("XYZ0000001"), None);
    }

    #[test]
    fn test_reconcile_untouched_patch_keeps_status() {
        let mut student = sample_student();
        student.status = EvalStatus::Pass;
        student.technical_status = EvalStatus::Pass;
        student.general_status = EvalStatus::Pass;

        // Patch touching neither sub-status leaves the overall status alone
        assert_eq!(reconcile_overall(&student, None, None), EvalStatus::Pass);
    }

    #[test]
    fn test_reconcile_one_track_still_pending() {
        // Scenario A: technical passes while general is still pending
        let student = sample_student();
        let next = reconcile_overall(&student, Some(EvalStatus::Pass), None);
        assert_eq!(next, EvalStatus::Pending);
    }

    #[test]
    fn test_reconcile_both_tracks_concluded_technical_wins() {
        // Scenario B: general fails after technical passed -> overall = Pass
        let mut student = sample_student();
        student.technical_status = EvalStatus::Pass;

        let next = reconcile_overall(&student, None, Some(EvalStatus::Fail));
        assert_eq!(next, EvalStatus::Pass);
    }

    #[test]
    fn test_reconcile_reopened_track_resets_overall() {
        // Scenario C: technical reopened while the overall status was final
        let mut student = sample_student();
        student.technical_status = EvalStatus::Pass;
        student.general_status = EvalStatus::Fail;
        student.status = EvalStatus::Pass;

        let next = reconcile_overall(&student, Some(EvalStatus::Pending), None);
        assert_eq!(next, EvalStatus::Pending);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut student = sample_student();
        student.general_status = EvalStatus::Pass;

        student.apply_patch(StudentPatch {
            technical_status: Some(EvalStatus::Pass),
            ..StudentPatch::default()
        });
        assert_eq!(student.status, EvalStatus::Pass);

        student.apply_patch(StudentPatch {
            technical_status: Some(EvalStatus::Pass),
            ..StudentPatch::default()
        });
        assert_eq!(student.status, EvalStatus::Pass);
    }

    #[test]
    fn test_reconcile_both_fail() {
        let student = sample_student();
        let next = reconcile_overall(
            &student,
            Some(EvalStatus::Fail),
            Some(EvalStatus::Fail),
        );
        assert_eq!(next, EvalStatus::Fail);
    }

    #[test]
    fn test_apply_patch_merges_only_present_fields() {
        let mut student = sample_student();
        let original_email = student.email.clone();

        student.apply_patch(StudentPatch {
            mcq_score: Some(85),
            zoom_link: Some("https://zoom.example/j/1".to_string()),
            ..StudentPatch::default()
        });

        assert_eq!(student.mcq_score, 85);
        assert_eq!(student.zoom_link, "https://zoom.example/j/1");
        assert_eq!(student.email, original_email);
        assert_eq!(student.status, EvalStatus::Pending);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut student = sample_student();
        student.first_name = "Priya1".to_string();
        assert!(student.validate().is_err());

        let mut student = sample_student();
        student.contact_number = "12345".to_string();
        assert!(student.validate().is_err());

        let mut student = sample_student();
        student.email = "not-an-email".to_string();
        assert!(student.validate().is_err());

        assert!(sample_student().validate().is_ok());
    }
}
