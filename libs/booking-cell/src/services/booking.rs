// libs/booking-cell/src/services/booking.rs
use chrono::{Datelike, Duration as ChronoDuration, Timelike, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    BookReservationRequest, BookingError, BookingSubject, NotificationEvent, NotificationRequest,
    Patient, Practitioner, Reservation, ReservationStatus, SubjectRef,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::notifications::{self, Notifier, TracingNotifier};
use crate::services::{eligibility, schedule};
use crate::store::{BookingStore, SupabaseStore};

/// Minimum advance notice before a slot's start.
const MIN_LEAD_TIME_HOURS: i64 = 1;

/// One guard per practitioner. Holding it across the conflict check and the
/// insert serializes overlapping-slot decisions for that practitioner while
/// unrelated practitioners proceed in parallel.
#[derive(Default)]
struct PractitionerLocks {
    locks: StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl PractitionerLocks {
    fn for_practitioner(&self, practitioner_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(practitioner_id).or_default())
    }
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    conflict_service: ConflictDetectionService,
    slot_locks: PractitionerLocks,
    meeting_base_url: String,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let store: Arc<dyn BookingStore> = Arc::new(SupabaseStore::new(supabase));
        Self::with_collaborators(store, Arc::new(TracingNotifier), &config.meeting_base_url)
    }

    /// Wire the engine onto explicit collaborators. Tests and alternative
    /// backends enter here.
    pub fn with_collaborators(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        meeting_base_url: &str,
    ) -> Self {
        let conflict_service = ConflictDetectionService::new(Arc::clone(&store));
        Self {
            store,
            notifier,
            conflict_service,
            slot_locks: PractitionerLocks::default(),
            meeting_base_url: meeting_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Decide and commit a booking request end to end. Any failed check
    /// aborts with a single specific reason and no state change; the
    /// conflict check and insert run under the practitioner's slot lock.
    pub async fn request_booking(
        &self,
        requester_user_id: Uuid,
        request: BookReservationRequest,
    ) -> Result<Reservation, BookingError> {
        info!(
            "Booking reservation for user {} with practitioner {}",
            requester_user_id, request.practitioner_id
        );

        let patient = self
            .store
            .load_patient_by_user(requester_user_id)
            .await?
            .ok_or(BookingError::PatientNotFound)?;

        let dependent = match request.subject {
            SubjectRef::Titular => None,
            SubjectRef::Dependent(dependent_id) => {
                let dependent = self
                    .store
                    .load_dependent(dependent_id)
                    .await?
                    .ok_or(BookingError::DependentNotFound)?;
                if dependent.patient_id != patient.id {
                    return Err(BookingError::Forbidden);
                }
                Some(dependent)
            }
        };

        let practitioner = self
            .store
            .load_practitioner(request.practitioner_id)
            .await?
            .ok_or(BookingError::PractitionerNotFound)?;

        let start_time = request.start_time;
        let minutes = practitioner.effective_consultation_minutes();
        let end_time = start_time + ChronoDuration::minutes(minutes as i64);

        let subject = match &dependent {
            Some(dependent) => BookingSubject::dependent(dependent),
            None => BookingSubject::titular(&patient),
        };

        let now = Utc::now();
        eligibility::evaluate(&practitioner, &subject, now.date_naive())?;

        if start_time < now + ChronoDuration::hours(MIN_LEAD_TIME_HOURS) {
            return Err(BookingError::LeadTimeViolation);
        }

        let windows = self
            .store
            .load_availability_windows(practitioner.id)
            .await?;
        if !schedule::is_within_schedule(
            &windows,
            start_time.weekday(),
            start_time.time(),
            end_time.time(),
        ) {
            return Err(BookingError::OutsideSchedule);
        }

        let slot_lock = self.slot_locks.for_practitioner(practitioner.id);
        let guard = slot_lock.lock().await;

        if self
            .conflict_service
            .has_conflict(practitioner.id, start_time, end_time)
            .await?
        {
            warn!(
                "Slot conflict for practitioner {} at {}",
                practitioner.id, start_time
            );
            return Err(BookingError::SlotTaken);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            practitioner_id: practitioner.id,
            patient_id: patient.id,
            dependent_id: dependent.as_ref().map(|d| d.id),
            start_time,
            end_time,
            status: ReservationStatus::Scheduled,
            meeting_link: self.generate_meeting_link(),
            purpose_of_consultation: request.purpose_of_consultation,
            initial_symptoms: request.initial_symptoms,
            created_at: now,
            updated_at: now,
        };

        let saved = self.store.insert_reservation(&reservation).await?;
        drop(guard);

        self.send_booking_confirmation(&saved, &patient, &practitioner);

        info!(
            "Reservation {} booked with practitioner {} for [{}, {})",
            saved.id, practitioner.id, saved.start_time, saved.end_time
        );
        Ok(saved)
    }

    /// Opaque, collision-resistant meeting room reference, unique per
    /// reservation.
    fn generate_meeting_link(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        format!("{}/cita-{}", self.meeting_base_url, &token[..10])
    }

    fn send_booking_confirmation(
        &self,
        reservation: &Reservation,
        patient: &Patient,
        practitioner: &Practitioner,
    ) {
        let recipients: Vec<String> = [patient.email.clone(), practitioner.email.clone()]
            .into_iter()
            .flatten()
            .collect();

        notifications::dispatch(
            Arc::clone(&self.notifier),
            NotificationRequest {
                event: NotificationEvent::ReservationBooked,
                recipients,
                context: json!({
                    "patient_name": patient.full_name(),
                    "practitioner_name": practitioner.full_name(),
                    "slot_time": notifications::format_slot_time(reservation.start_time),
                    "meeting_link": reservation.meeting_link,
                    "purpose_of_consultation": reservation.purpose_of_consultation,
                }),
            },
        );
    }
}
