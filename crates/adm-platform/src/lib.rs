//! Admissions Platform
//!
//! Backend for the admissions office:
//! - Staff account registration and login (counsellor, teacher, admin)
//! - Applicant records from intake through interview to a decision
//! - Independently graded technical/general evaluation tracks with a
//!   derived overall status
//! - Role-scoped listings, dashboard counts, and decision notifications
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints (where applicable)

// Core aggregates
pub mod user;
pub mod student;

// Authentication & authorization
pub mod auth;

// Shared infrastructure
pub mod shared;

// Development tooling
pub mod seed;

// Re-export common types from shared
pub use shared::error::{AdmissionsError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export main entity types for convenience
pub use user::entity::{Role, User};
pub use student::entity::{
    reconcile_overall, EmailStatus, EvalStatus, Gender, Student, StudentPatch, TEMP_ID,
};

// Re-export repositories
pub use user::repository::UserRepository;
pub use student::repository::StudentRepository;

// Re-export services
pub use auth::auth_service::{AccessTokenClaims, AuthConfig, AuthService};
pub use auth::password_service::PasswordService;
pub use shared::authorization::{checks, AuthContext};
pub use shared::mail_service::{MailConfig, MailService};

// Re-export API surface
pub use auth::auth_api::{auth_router, AuthState};
pub use student::api::{students_router, StudentsState};
pub use shared::middleware::{AppState, AuthLayer, Authenticated};
