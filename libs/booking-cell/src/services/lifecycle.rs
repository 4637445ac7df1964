// libs/booking-cell/src/services/lifecycle.rs
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    ActingParty, BookingError, CancelledBy, NotificationEvent, NotificationRequest, Patient,
    Practitioner, Reservation, ReservationStatus,
};
use crate::services::notifications::{self, Notifier};
use crate::store::BookingStore;

/// Governs the state transitions of a committed reservation.
pub struct LifecycleService {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
}

/// All statuses a reservation may move to from `current`. Cancelled and
/// completed are terminal.
pub fn valid_transitions(current: &ReservationStatus) -> Vec<ReservationStatus> {
    match current {
        ReservationStatus::Scheduled => vec![
            ReservationStatus::Cancelled,
            ReservationStatus::Completed,
        ],
        ReservationStatus::Cancelled | ReservationStatus::Completed => vec![],
    }
}

pub fn validate_transition(
    current: &ReservationStatus,
    next: &ReservationStatus,
) -> Result<(), BookingError> {
    if !valid_transitions(current).contains(next) {
        warn!("Invalid status transition attempted: {} -> {}", current, next);
        return Err(BookingError::InvalidTransition(current.clone()));
    }
    Ok(())
}

impl LifecycleService {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Cancel a scheduled reservation. Only the booking patient or the
    /// reservation's practitioner may cancel; the other party is notified.
    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Reservation, BookingError> {
        debug!("Cancelling reservation: {}", reservation_id);

        let mut reservation = self
            .store
            .load_reservation(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;

        let (patient, practitioner) = self.load_parties(&reservation).await?;

        let cancelled_by = if acting_user_id == patient.user_id {
            CancelledBy::Patient
        } else if acting_user_id == practitioner.user_id {
            CancelledBy::Practitioner
        } else {
            return Err(BookingError::Forbidden);
        };

        validate_transition(&reservation.status, &ReservationStatus::Cancelled)?;

        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = Utc::now();
        let saved = self.store.update_reservation(&reservation).await?;

        self.send_cancellation(&saved, &patient, &practitioner, cancelled_by);

        info!("Reservation {} cancelled", saved.id);
        Ok(saved)
    }

    /// Mark a scheduled reservation as completed. Only the assigned
    /// practitioner may complete; `end_time` is overwritten with the actual
    /// completion instant rather than the originally scheduled end.
    pub async fn complete(
        &self,
        reservation_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Reservation, BookingError> {
        debug!("Completing reservation: {}", reservation_id);

        let mut reservation = self
            .store
            .load_reservation(reservation_id)
            .await?
            .ok_or(BookingError::ReservationNotFound)?;

        let practitioner = self
            .store
            .load_practitioner(reservation.practitioner_id)
            .await?
            .ok_or_else(|| {
                BookingError::Storage("reservation references an unknown practitioner".to_string())
            })?;

        if acting_user_id != practitioner.user_id {
            return Err(BookingError::Forbidden);
        }

        validate_transition(&reservation.status, &ReservationStatus::Completed)?;

        let now = Utc::now();
        reservation.status = ReservationStatus::Completed;
        reservation.end_time = now;
        reservation.updated_at = now;
        let saved = self.store.update_reservation(&reservation).await?;

        info!("Reservation {} completed", saved.id);
        Ok(saved)
    }

    /// List the reservations visible to an already-authorized acting party,
    /// newest first.
    pub async fn reservations_for(
        &self,
        party: ActingParty,
    ) -> Result<Vec<Reservation>, BookingError> {
        match party {
            ActingParty::Patient { user_id } => {
                self.store
                    .load_patient_by_user(user_id)
                    .await?
                    .ok_or(BookingError::PatientNotFound)?;
                Ok(self.store.reservations_for_patient(user_id).await?)
            }
            ActingParty::Practitioner { user_id } => {
                self.store
                    .load_practitioner_by_user(user_id)
                    .await?
                    .ok_or(BookingError::PractitionerNotFound)?;
                Ok(self.store.reservations_for_practitioner(user_id).await?)
            }
        }
    }

    async fn load_parties(
        &self,
        reservation: &Reservation,
    ) -> Result<(Patient, Practitioner), BookingError> {
        let patient = self
            .store
            .load_patient(reservation.patient_id)
            .await?
            .ok_or_else(|| {
                BookingError::Storage("reservation references an unknown patient".to_string())
            })?;
        let practitioner = self
            .store
            .load_practitioner(reservation.practitioner_id)
            .await?
            .ok_or_else(|| {
                BookingError::Storage("reservation references an unknown practitioner".to_string())
            })?;
        Ok((patient, practitioner))
    }

    fn send_cancellation(
        &self,
        reservation: &Reservation,
        patient: &Patient,
        practitioner: &Practitioner,
        cancelled_by: CancelledBy,
    ) {
        let cancelling_party_name = match cancelled_by {
            CancelledBy::Patient => patient.full_name(),
            CancelledBy::Practitioner => practitioner.full_name(),
        };

        let recipients: Vec<String> = [patient.email.clone(), practitioner.email.clone()]
            .into_iter()
            .flatten()
            .collect();

        notifications::dispatch(
            Arc::clone(&self.notifier),
            NotificationRequest {
                event: NotificationEvent::ReservationCancelled,
                recipients,
                context: json!({
                    "cancelled_by": cancelled_by,
                    "cancelling_party_name": cancelling_party_name,
                    "patient_name": patient.full_name(),
                    "practitioner_name": practitioner.full_name(),
                    "slot_time": notifications::format_slot_time(reservation.start_time),
                }),
            },
        );
    }
}
