// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

/// Sentinel stored in `gender_restriction` when a practitioner accepts every
/// subject regardless of gender.
pub const ACCEPT_ALL_GENDERS: &str = "TODOS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub consultation_minutes: Option<i32>,
    pub gender_restriction: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

impl Practitioner {
    /// Slot length granted to this practitioner's reservations. Unset or
    /// non-positive values fall back to the standard hour.
    pub fn effective_consultation_minutes(&self) -> i32 {
        match self.consultation_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => 60,
        }
    }

    pub fn gender_policy(&self) -> GenderPolicy {
        match self.gender_restriction.as_deref().map(str::trim) {
            None | Some("") => GenderPolicy::AcceptAll,
            Some(raw) if raw.eq_ignore_ascii_case(ACCEPT_ALL_GENDERS) => GenderPolicy::AcceptAll,
            Some(raw) => GenderPolicy::Only(raw.to_string()),
        }
    }

    pub fn has_age_restriction(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Interpreted form of a practitioner's `gender_restriction` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenderPolicy {
    AcceptAll,
    Only(String),
}

/// One recurring weekly working interval. `day_of_week` follows the 0 = Sunday
/// .. 6 = Saturday convention used across the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub day_of_week: i16,
    pub active: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub relationship: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Dependent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The person physically attending a consultation: the requesting patient
/// themselves, or one of their dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "dependent_id")]
pub enum SubjectRef {
    Titular,
    Dependent(Uuid),
}

/// The fields the eligibility rules look at, regardless of whether the
/// subject is the titular patient or a dependent.
#[derive(Debug, Clone)]
pub struct BookingSubject {
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl BookingSubject {
    pub fn titular(patient: &Patient) -> Self {
        Self {
            gender: patient.gender.clone(),
            date_of_birth: patient.date_of_birth,
        }
    }

    pub fn dependent(dependent: &Dependent) -> Self {
        Self {
            gender: dependent.gender.clone(),
            date_of_birth: dependent.date_of_birth,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub dependent_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub meeting_link: String,
    pub purpose_of_consultation: Option<String>,
    pub initial_symptoms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Half-open interval overlap: touching boundaries do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    /// Cancelled reservations release their slot; everything else holds it.
    pub fn holds_slot(&self) -> bool {
        self.status != ReservationStatus::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Scheduled => write!(f, "scheduled"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
            ReservationStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookReservationRequest {
    pub practitioner_id: Uuid,
    pub subject: SubjectRef,
    pub start_time: DateTime<Utc>,
    pub purpose_of_consultation: Option<String>,
    pub initial_symptoms: Option<String>,
}

/// An already-authorized acting party, resolved by the caller. The engine
/// never inspects role lists; it only dispatches on this descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActingParty {
    Patient { user_id: Uuid },
    Practitioner { user_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Patient,
    Practitioner,
}

// ==============================================================================
// NOTIFICATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationEvent {
    ReservationBooked,
    ReservationCancelled,
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEvent::ReservationBooked => write!(f, "reservation-booked"),
            NotificationEvent::ReservationCancelled => write!(f, "reservation-cancelled"),
        }
    }
}

/// Outbound message handed to the `Notifier` collaborator after a successful
/// commit. `context` carries the template variables for the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub event: NotificationEvent,
    pub recipients: Vec<String>,
    pub context: serde_json::Value,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Patient profile required for booking")]
    PatientNotFound,

    #[error("Dependent not found")]
    DependentNotFound,

    #[error("Practitioner not found")]
    PractitionerNotFound,

    #[error("Reservation not found")]
    ReservationNotFound,

    #[error("You are not allowed to act on this reservation")]
    Forbidden,

    #[error("Subject gender is not specified but the practitioner restricts by gender")]
    MissingSubjectGender,

    #[error("Practitioner only accepts subjects with gender {0}")]
    GenderRestricted(String),

    #[error("Subject does not meet the practitioner's minimum age of {0}")]
    BelowMinimumAge(i32),

    #[error("Subject exceeds the practitioner's maximum age of {0}")]
    AboveMaximumAge(i32),

    #[error("Date of birth is required because the practitioner restricts by age")]
    MissingDateOfBirth,

    #[error("Reservations must be booked at least one hour in advance")]
    LeadTimeViolation,

    #[error("Practitioner is not working at the requested day and time")]
    OutsideSchedule,

    #[error("The requested slot is no longer available")]
    SlotTaken,

    #[error("Reservation cannot be modified in its current status: {0}")]
    InvalidTransition(ReservationStatus),

    #[error("Storage unavailable, retry later: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
