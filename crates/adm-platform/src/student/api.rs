//! Students API
//!
//! REST endpoints for applicant intake, role-scoped listing, evaluation
//! updates, deletion, dashboard counts, and decision notifications.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::shared::authorization::checks;
use crate::shared::error::AdmissionsError;
use crate::shared::mail_service::MailService;
use crate::shared::middleware::Authenticated;
use crate::student::entity::{
    EmailStatus, EvalStatus, Gender, Student, StudentPatch,
};
use crate::student::repository::StudentRepository;
use crate::user::entity::Role;
use crate::user::repository::UserRepository;

/// Intake request posted by the application form
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub contact_number: String,
    pub fathers_name: String,
    pub gender: Gender,
    pub course_name: String,
    pub school_name: String,
    pub state: String,
    pub city: String,
    /// Interview date as submitted by the form
    pub select_date: Option<String>,
    /// Interview time slot, free-form
    pub select_time: Option<String>,
}

/// Partial update request; absent fields are left untouched.
/// The overall `status` cannot be patched, it is always derived.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
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
    pub interview_date: Option<String>,
    pub interview_time: Option<String>,
    pub mcq_score: Option<i32>,
    pub zoom_link: Option<String>,
    pub general_teacher: Option<String>,
    pub technical_teacher: Option<String>,
    pub general_status: Option<EvalStatus>,
    pub technical_status: Option<EvalStatus>,
    pub email_status: Option<EmailStatus>,
}

impl UpdateStudentRequest {
    fn into_patch(self) -> Result<StudentPatch, AdmissionsError> {
        let interview_date = match self.interview_date {
            Some(raw) => Some(parse_interview_date(&raw)?),
            None => None,
        };
        Ok(StudentPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            contact_number: self.contact_number,
            fathers_name: self.fathers_name,
            gender: self.gender,
            course_name: self.course_name,
            school_name: self.school_name,
            state: self.state,
            city: self.city,
            interview_date,
            interview_time: self.interview_time,
            mcq_score: self.mcq_score,
            zoom_link: self.zoom_link,
            general_teacher: self.general_teacher,
            technical_teacher: self.technical_teacher,
            general_status: self.general_status,
            technical_status: self.technical_status,
            email_status: self.email_status,
        })
    }
}

/// Lightweight counsellor reference embedded in student responses
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounsellorRef {
    pub username: String,
    pub email: String,
}

/// Student representation returned to callers
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub id: String,
    pub student_id: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub contact_number: String,
    pub fathers_name: String,
    pub gender: Gender,
    pub course_name: String,
    pub school_name: String,
    pub state: String,
    pub city: String,
    pub interview_date: String,
    pub interview_time: String,
    pub assigned_counsellor: Option<CounsellorRef>,
    pub mcq_score: i32,
    pub zoom_link: String,
    pub general_teacher: String,
    pub technical_teacher: String,
    pub general_status: EvalStatus,
    pub technical_status: EvalStatus,
    pub email_status: EmailStatus,
    pub status: EvalStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl StudentResponse {
    fn new(student: Student, counsellor: Option<CounsellorRef>) -> Self {
        Self {
            id: student.id,
            student_id: student.student_id,
            first_name: student.first_name,
            last_name: student.last_name,
            email: student.email,
            contact_number: student.contact_number,
            fathers_name: student.fathers_name,
            gender: student.gender,
            course_name: student.course_name,
            school_name: student.school_name,
            state: student.state,
            city: student.city,
            interview_date: student.interview_date.to_rfc3339(),
            interview_time: student.interview_time,
            assigned_counsellor: counsellor,
            mcq_score: student.mcq_score,
            zoom_link: student.zoom_link,
            general_teacher: student.general_teacher,
            technical_teacher: student.technical_teacher,
            general_status: student.general_status,
            technical_status: student.technical_status,
            email_status: student.email_status,
            status: student.status,
            created_at: student.created_at.to_rfc3339(),
            updated_at: student.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentData {
    pub student: StudentResponse,
}

/// Single-student response envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentEnvelope {
    pub status: String,
    pub data: StudentData,
}

impl StudentEnvelope {
    fn success(student: StudentResponse) -> Self {
        Self {
            status: "success".to_string(),
            data: StudentData { student },
        }
    }
}

/// Counsellor view: own students split by interview progress
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounsellorStudentsData {
    pub waiting_for_interview: Vec<StudentResponse>,
    pub interviewed_candidates: Vec<StudentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CounsellorStudentsResponse {
    pub status: String,
    pub data: CounsellorStudentsData,
}

/// Teacher view: all students split by grading assignment
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStudentsData {
    pub technical_candidates: Vec<StudentResponse>,
    pub general_candidates: Vec<StudentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherStudentsResponse {
    pub status: String,
    pub data: TeacherStudentsData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllStudentsData {
    pub students: Vec<StudentResponse>,
}

/// Admin view: flat list with count
#[derive(Debug, Serialize, ToSchema)]
pub struct AllStudentsResponse {
    pub status: String,
    pub results: usize,
    pub data: AllStudentsData,
}

/// Dashboard aggregate counts
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub enrolled: u64,
    pub waiting_for_interview: u64,
    pub in_interview: u64,
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub status: String,
    pub data: DashboardStats,
}

/// Notification send result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailSendResponse {
    pub status: String,
    pub email_sent: bool,
}

/// Students service state
#[derive(Clone)]
pub struct StudentsState {
    pub student_repo: Arc<StudentRepository>,
    pub user_repo: Arc<UserRepository>,
    pub mail_service: Arc<MailService>,
}

fn parse_interview_date(raw: &str) -> Result<DateTime<Utc>, AdmissionsError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Err(AdmissionsError::validation("Invalid interview date"))
}

/// Resolve assigned counsellors to lightweight references for a batch.
async fn counsellor_refs(
    user_repo: &UserRepository,
    students: &[Student],
) -> Result<HashMap<String, CounsellorRef>, AdmissionsError> {
    let ids: Vec<String> = students
        .iter()
        .map(|s| s.assigned_counsellor.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let users = user_repo.find_by_ids(&ids).await?;
    Ok(users
        .into_iter()
        .map(|(id, u)| {
            (
                id,
                CounsellorRef {
                    username: u.username,
                    email: u.email,
                },
            )
        })
        .collect())
}

fn to_responses(
    students: Vec<Student>,
    refs: &HashMap<String, CounsellorRef>,
) -> Vec<StudentResponse> {
    students
        .into_iter()
        .map(|s| {
            let counsellor = refs.get(&s.assigned_counsellor).cloned();
            StudentResponse::new(s, counsellor)
        })
        .collect()
}

async fn resolved_response(
    user_repo: &UserRepository,
    student: Student,
) -> Result<StudentResponse, AdmissionsError> {
    let refs = counsellor_refs(user_repo, std::slice::from_ref(&student)).await?;
    let counsellor = refs.get(&student.assigned_counsellor).cloned();
    Ok(StudentResponse::new(student, counsellor))
}

/// Create a new student record
///
/// Public intake endpoint: assigns a random counsellor and allocates the
/// next sequential student id.
#[utoipa::path(
    post,
    path = "",
    tag = "students",
    operation_id = "postStudents",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentEnvelope),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_student(
    State(state): State<StudentsState>,
    Json(req): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AdmissionsError> {
    let (select_date, select_time) = match (req.select_date, req.select_time) {
        (Some(d), Some(t)) if !d.is_empty() && !t.is_empty() => (d, t),
        _ => {
            return Err(AdmissionsError::validation(
                "Interview date and time are required",
            ))
        }
    };
    let interview_date = parse_interview_date(&select_date)?;

    // Uniform pick over the current counsellor accounts
    let counsellors = state.user_repo.find_by_role(Role::Counsellor).await?;
    let counsellor = counsellors
        .choose(&mut rand::thread_rng())
        .ok_or_else(|| AdmissionsError::validation("No counsellors available"))?
        .clone();

    let email = req.email.trim().to_lowercase();
    if state.student_repo.find_by_email(&email).await?.is_some() {
        return Err(AdmissionsError::duplicate("email"));
    }

    let mut student = Student::new(
        req.first_name,
        req.last_name,
        email,
        req.contact_number,
        req.fathers_name,
        req.gender,
        req.course_name,
        req.school_name,
        req.state,
        req.city,
        interview_date,
        select_time,
        counsellor.id.clone(),
    );
    student.validate()?;

    // Allocated immediately before the insert; no lock spans the two steps.
    student.student_id = state.student_repo.next_student_id().await?;
    state.student_repo.insert(&student).await?;

    tracing::info!(
        student_id = %student.student_id,
        counsellor = %counsellor.username,
        "student record created"
    );

    let response = resolved_response(&state.user_repo, student).await?;
    Ok((StatusCode::CREATED, Json(StudentEnvelope::success(response))))
}

/// List students, shaped by the caller's role
///
/// Counsellors see their own students partitioned by interview progress,
/// teachers see grading queues matched on their username, admins see the
/// flat list.
#[utoipa::path(
    get,
    path = "",
    tag = "students",
    operation_id = "getStudents",
    responses(
        (status = 200, description = "Role-scoped student listing", body = AllStudentsResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_students(
    State(state): State<StudentsState>,
    auth: Authenticated,
) -> Result<Response, AdmissionsError> {
    match auth.role {
        Role::Counsellor => {
            let students = state
                .student_repo
                .find_by_counsellor(&auth.user_id)
                .await?;
            let refs = counsellor_refs(&state.user_repo, &students).await?;

            let (waiting, interviewed): (Vec<_>, Vec<_>) = students
                .into_iter()
                .partition(|s| s.status.is_pending());

            Ok(Json(CounsellorStudentsResponse {
                status: "success".to_string(),
                data: CounsellorStudentsData {
                    waiting_for_interview: to_responses(waiting, &refs),
                    interviewed_candidates: to_responses(interviewed, &refs),
                },
            })
            .into_response())
        }
        Role::Teacher => {
            let students = state.student_repo.find_all().await?;
            let refs = counsellor_refs(&state.user_repo, &students).await?;

            let technical: Vec<_> = students
                .iter()
                .filter(|s| s.technical_teacher == auth.username)
                .cloned()
                .collect();
            let general: Vec<_> = students
                .into_iter()
                .filter(|s| s.general_teacher == auth.username)
                .collect();

            Ok(Json(TeacherStudentsResponse {
                status: "success".to_string(),
                data: TeacherStudentsData {
                    technical_candidates: to_responses(technical, &refs),
                    general_candidates: to_responses(general, &refs),
                },
            })
            .into_response())
        }
        Role::Admin => {
            let students = state.student_repo.find_all().await?;
            let refs = counsellor_refs(&state.user_repo, &students).await?;
            let students = to_responses(students, &refs);

            Ok(Json(AllStudentsResponse {
                status: "success".to_string(),
                results: students.len(),
                data: AllStudentsData { students },
            })
            .into_response())
        }
    }
}

/// Get student by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "students",
    operation_id = "getStudentsById",
    params(
        ("id" = String, Path, description = "Student record id")
    ),
    responses(
        (status = 200, description = "Student found", body = StudentEnvelope),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_student(
    State(state): State<StudentsState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<StudentEnvelope>, AdmissionsError> {
    let student = state
        .student_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AdmissionsError::not_found("student", &id))?;

    let response = resolved_response(&state.user_repo, student).await?;
    Ok(Json(StudentEnvelope::success(response)))
}

/// Update student fields
///
/// The overall status is recomputed whenever the patch touches either
/// sub-status; it can never be written directly.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "students",
    operation_id = "patchStudentsById",
    params(
        ("id" = String, Path, description = "Student record id")
    ),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentEnvelope),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_student(
    State(state): State<StudentsState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<StudentEnvelope>, AdmissionsError> {
    let mut student = state
        .student_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AdmissionsError::not_found("student", &id))?;

    if let Some(email) = req.email.as_deref() {
        let email = email.to_lowercase();
        if let Some(existing) = state.student_repo.find_by_email(&email).await? {
            if existing.id != id {
                return Err(AdmissionsError::duplicate("email"));
            }
        }
    }

    student.apply_patch(req.into_patch()?);
    student.validate()?;
    state.student_repo.update(&student).await?;

    let response = resolved_response(&state.user_repo, student).await?;
    Ok(Json(StudentEnvelope::success(response)))
}

/// Delete a student record (admin only, permanent)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "students",
    operation_id = "deleteStudentsById",
    params(
        ("id" = String, Path, description = "Student record id")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_student(
    State(state): State<StudentsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AdmissionsError> {
    checks::require_role(&auth.0, &[Role::Admin])?;

    if !state.student_repo.delete(&id).await? {
        return Err(AdmissionsError::not_found("student", &id));
    }

    tracing::info!(student = %id, deleted_by = %auth.username, "student record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard aggregate counts
///
/// `inInterview`, `accepted` and `rejected` reference status labels the
/// write path never produces; they are reported as zero rather than mapped
/// onto the Pending/Pass/Fail vocabulary.
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "students",
    operation_id = "getStudentsDashboardStats",
    responses(
        (status = 200, description = "Aggregate counts", body = DashboardResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard_stats(
    State(state): State<StudentsState>,
    _auth: Authenticated,
) -> Result<Json<DashboardResponse>, AdmissionsError> {
    let enrolled = state.student_repo.count_all().await?;
    let waiting_for_interview = state
        .student_repo
        .count_by_status(EvalStatus::Pending)
        .await?;

    Ok(Json(DashboardResponse {
        status: "success".to_string(),
        data: DashboardStats {
            enrolled,
            waiting_for_interview,
            in_interview: 0,
            accepted: 0,
            rejected: 0,
        },
    }))
}

/// Send the acceptance notification email
#[utoipa::path(
    post,
    path = "/{id}/send-acceptance",
    tag = "students",
    operation_id = "postStudentsSendAcceptance",
    params(
        ("id" = String, Path, description = "Student record id")
    ),
    responses(
        (status = 200, description = "Send attempted", body = MailSendResponse),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_acceptance(
    State(state): State<StudentsState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MailSendResponse>, AdmissionsError> {
    send_notification(&state, &id, true).await
}

/// Send the rejection notification email
#[utoipa::path(
    post,
    path = "/{id}/send-rejection",
    tag = "students",
    operation_id = "postStudentsSendRejection",
    params(
        ("id" = String, Path, description = "Student record id")
    ),
    responses(
        (status = 200, description = "Send attempted", body = MailSendResponse),
        (status = 404, description = "Student not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_rejection(
    State(state): State<StudentsState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MailSendResponse>, AdmissionsError> {
    send_notification(&state, &id, false).await
}

async fn send_notification(
    state: &StudentsState,
    id: &str,
    acceptance: bool,
) -> Result<Json<MailSendResponse>, AdmissionsError> {
    let mut student = state
        .student_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AdmissionsError::not_found("student", id))?;

    let name = student.full_name();
    let sent = if acceptance {
        state.mail_service.send_acceptance(&student.email, &name).await
    } else {
        state.mail_service.send_rejection(&student.email, &name).await
    };

    if sent && student.email_status != EmailStatus::Added {
        student.email_status = EmailStatus::Added;
        student.updated_at = Utc::now();
        state.student_repo.update(&student).await?;
    }

    Ok(Json(MailSendResponse {
        status: "success".to_string(),
        email_sent: sent,
    }))
}

/// Create students router
pub fn students_router(state: StudentsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_student, list_students))
        .routes(routes!(dashboard_stats))
        .routes(routes!(get_student, update_student, delete_student))
        .routes(routes!(send_acceptance))
        .routes(routes!(send_rejection))
        .with_state(state)
}
