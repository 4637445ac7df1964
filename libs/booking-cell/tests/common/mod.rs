// Shared fixtures for the booking-cell test suite: an in-memory
// implementation of the persistence collaborator, a recording notifier, and
// entity builders.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use std::sync::{Arc, Mutex as StdMutex};
use uuid::Uuid;

use booking_cell::models::{
    AvailabilityWindow, BookReservationRequest, Dependent, NotificationRequest, Patient,
    Practitioner, Reservation, SubjectRef,
};
use booking_cell::services::booking::BookingService;
use booking_cell::services::notifications::Notifier;
use booking_cell::store::{BookingStore, StoreError};

pub const MEETING_BASE_URL: &str = "https://meet.jit.si";

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Default)]
struct State {
    patients: Vec<Patient>,
    dependents: Vec<Dependent>,
    practitioners: Vec<Practitioner>,
    windows: Vec<AvailabilityWindow>,
    reservations: Vec<Reservation>,
}

/// In-memory `BookingStore`. Each call yields back to the scheduler once so
/// that concurrent callers interleave the same way they would across real
/// storage round-trips.
#[derive(Default)]
pub struct InMemoryStore {
    state: StdMutex<State>,
}

impl InMemoryStore {
    pub fn add_patient(&self, patient: Patient) {
        self.state.lock().unwrap().patients.push(patient);
    }

    pub fn add_dependent(&self, dependent: Dependent) {
        self.state.lock().unwrap().dependents.push(dependent);
    }

    pub fn add_practitioner(&self, practitioner: Practitioner) {
        self.state.lock().unwrap().practitioners.push(practitioner);
    }

    pub fn add_window(&self, window: AvailabilityWindow) {
        self.state.lock().unwrap().windows.push(window);
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.state.lock().unwrap().reservations.clone()
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn load_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state.patients.iter().find(|p| p.id == patient_id).cloned())
    }

    async fn load_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state.patients.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn load_dependent(&self, dependent_id: Uuid) -> Result<Option<Dependent>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state.dependents.iter().find(|d| d.id == dependent_id).cloned())
    }

    async fn load_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .practitioners
            .iter()
            .find(|p| p.id == practitioner_id)
            .cloned())
    }

    async fn load_practitioner_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .practitioners
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn load_availability_windows(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .windows
            .iter()
            .filter(|w| w.practitioner_id == practitioner_id)
            .cloned()
            .collect())
    }

    async fn find_overlapping(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .reservations
            .iter()
            .filter(|r| {
                r.practitioner_id == practitioner_id && r.holds_slot() && r.overlaps(start, end)
            })
            .cloned()
            .collect())
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.reservations.push(reservation.clone());
        Ok(reservation.clone())
    }

    async fn update_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation.id)
            .ok_or_else(|| StoreError::Backend("reservation not found".to_string()))?;
        *slot = reservation.clone();
        Ok(reservation.clone())
    }

    async fn load_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .reservations
            .iter()
            .find(|r| r.id == reservation_id)
            .cloned())
    }

    async fn reservations_for_patient(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        let Some(patient) = state.patients.iter().find(|p| p.user_id == user_id) else {
            return Ok(vec![]);
        };
        let mut reservations: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|r| r.patient_id == patient.id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn reservations_for_practitioner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError> {
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        let Some(practitioner) = state.practitioners.iter().find(|p| p.user_id == user_id) else {
            return Ok(vec![]);
        };
        let mut reservations: Vec<Reservation> = state
            .reservations
            .iter()
            .filter(|r| r.practitioner_id == practitioner.id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }
}

// ==============================================================================
// RECORDING NOTIFIER
// ==============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    requests: StdMutex<Vec<NotificationRequest>>,
}

impl RecordingNotifier {
    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, request: NotificationRequest) -> anyhow::Result<()> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Notification dispatch is fire-and-forget; give the spawned task a moment
/// to land before asserting on the recorder.
pub async fn settle_notifications() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

// ==============================================================================
// ENTITY BUILDERS
// ==============================================================================

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn practitioner() -> Practitioner {
    Practitioner {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        first_name: "Elena".to_string(),
        last_name: "Vargas".to_string(),
        email: Some("elena.vargas@example.com".to_string()),
        specialty: Some("General Medicine".to_string()),
        consultation_minutes: Some(30),
        gender_restriction: None,
        min_age: None,
        max_age: None,
    }
}

pub fn patient_for_user(user_id: Uuid) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        user_id,
        first_name: "Lucia".to_string(),
        last_name: "Mendez".to_string(),
        email: Some("lucia.mendez@example.com".to_string()),
        gender: Some("FEMENINO".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 10),
    }
}

pub fn dependent_of(patient_id: Uuid) -> Dependent {
    Dependent {
        id: Uuid::new_v4(),
        patient_id,
        first_name: "Mateo".to_string(),
        last_name: "Mendez".to_string(),
        relationship: Some("HIJO".to_string()),
        gender: Some("MASCULINO".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(2015, 3, 22),
    }
}

pub fn window_for(
    practitioner_id: Uuid,
    day_of_week: i16,
    start: NaiveTime,
    end: NaiveTime,
) -> AvailabilityWindow {
    AvailabilityWindow {
        id: Uuid::new_v4(),
        practitioner_id,
        day_of_week,
        active: true,
        start_time: start,
        end_time: end,
        lunch_start: None,
        lunch_end: None,
    }
}

/// Monday 09:00-17:00 with a 12:00-13:00 lunch break.
pub fn monday_window(practitioner_id: Uuid) -> AvailabilityWindow {
    let mut window = window_for(practitioner_id, 1, time(9, 0), time(17, 0));
    window.lunch_start = Some(time(12, 0));
    window.lunch_end = Some(time(13, 0));
    window
}

/// Round-the-clock windows for every day of the week, no lunch break.
pub fn all_week_windows(practitioner_id: Uuid) -> Vec<AvailabilityWindow> {
    (0..7)
        .map(|day| {
            window_for(
                practitioner_id,
                day,
                NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            )
        })
        .collect()
}

/// The next `weekday` at `at` (UTC), at least two days out so the lead-time
/// rule never interferes.
pub fn next_slot(weekday: Weekday, at: NaiveTime) -> DateTime<Utc> {
    let mut date = Utc::now().date_naive() + Duration::days(2);
    while date.weekday() != weekday {
        date += Duration::days(1);
    }
    date.and_time(at).and_utc()
}

pub fn booking_request(practitioner_id: Uuid, start: DateTime<Utc>) -> BookReservationRequest {
    BookReservationRequest {
        practitioner_id,
        subject: SubjectRef::Titular,
        start_time: start,
        purpose_of_consultation: Some("General check-up".to_string()),
        initial_symptoms: None,
    }
}

pub fn engine(store: &Arc<InMemoryStore>, notifier: &Arc<RecordingNotifier>) -> BookingService {
    BookingService::with_collaborators(
        Arc::clone(store) as Arc<dyn BookingStore>,
        Arc::clone(notifier) as Arc<dyn Notifier>,
        MEETING_BASE_URL,
    )
}

/// The overlap invariant: for one practitioner, no two reservations that
/// still hold their slot may intersect.
pub fn assert_pairwise_non_overlapping(reservations: &[Reservation]) {
    let held: Vec<&Reservation> = reservations.iter().filter(|r| r.holds_slot()).collect();
    for (i, a) in held.iter().enumerate() {
        for b in held.iter().skip(i + 1) {
            if a.practitioner_id != b.practitioner_id {
                continue;
            }
            assert!(
                !a.overlaps(b.start_time, b.end_time),
                "reservations {} and {} overlap: [{}, {}) vs [{}, {})",
                a.id,
                b.id,
                a.start_time,
                a.end_time,
                b.start_time,
                b.end_time
            );
        }
    }
}
