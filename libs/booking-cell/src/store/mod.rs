// libs/booking-cell/src/store/mod.rs
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    AvailabilityWindow, BookingError, Dependent, Patient, Practitioner, Reservation,
};

pub use supabase::SupabaseStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage request timed out")]
    Timeout,

    #[error("storage error: {0}")]
    Backend(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => BookingError::Transient("storage request timed out".to_string()),
            StoreError::Backend(message) => BookingError::Storage(message),
        }
    }
}

/// Persistence collaborator consumed by the booking engine. Implementations
/// decide where the entities live; the engine only relies on the contracts
/// spelled out per method.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn load_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError>;

    async fn load_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError>;

    async fn load_dependent(&self, dependent_id: Uuid) -> Result<Option<Dependent>, StoreError>;

    async fn load_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError>;

    async fn load_practitioner_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError>;

    async fn load_availability_windows(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError>;

    /// All reservations for the practitioner that still hold their slot and
    /// whose interval intersects `[start, end)`: `r.start < end && r.end > start`.
    async fn find_overlapping(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn insert_reservation(&self, reservation: &Reservation)
        -> Result<Reservation, StoreError>;

    async fn update_reservation(&self, reservation: &Reservation)
        -> Result<Reservation, StoreError>;

    async fn load_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Reservations where the titular patient behind `user_id` is the booking
    /// party, newest first.
    async fn reservations_for_patient(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Reservations held by the practitioner behind `user_id`, newest first.
    async fn reservations_for_practitioner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError>;
}
