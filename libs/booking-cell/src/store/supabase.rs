// libs/booking-cell/src/store/supabase.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{
    AvailabilityWindow, Dependent, Patient, Practitioner, Reservation, ReservationStatus,
};
use crate::store::{BookingStore, StoreError};

/// PostgREST-backed implementation of the persistence collaborator.
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(store_error)?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| StoreError::Backend(format!("Failed to parse row: {}", e)))
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_rows(path).await?.into_iter().next())
    }
}

fn store_error(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_timeout() || e.is_connect() => StoreError::Timeout,
        _ => StoreError::Backend(err.to_string()),
    }
}

fn encode_instant(instant: DateTime<Utc>) -> String {
    let rendered = instant.to_rfc3339_opts(SecondsFormat::Secs, true);
    urlencoding::encode(&rendered).into_owned()
}

fn representation_headers() -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "Prefer",
        reqwest::header::HeaderValue::from_static("return=representation"),
    );
    headers
}

#[async_trait]
impl BookingStore for SupabaseStore {
    async fn load_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        self.fetch_one(&path).await
    }

    async fn load_patient_by_user(&self, user_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let path = format!("/rest/v1/patients?user_id=eq.{}", user_id);
        self.fetch_one(&path).await
    }

    async fn load_dependent(&self, dependent_id: Uuid) -> Result<Option<Dependent>, StoreError> {
        let path = format!("/rest/v1/dependents?id=eq.{}", dependent_id);
        self.fetch_one(&path).await
    }

    async fn load_practitioner(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError> {
        let path = format!("/rest/v1/practitioners?id=eq.{}", practitioner_id);
        self.fetch_one(&path).await
    }

    async fn load_practitioner_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Practitioner>, StoreError> {
        let path = format!("/rest/v1/practitioners?user_id=eq.{}", user_id);
        self.fetch_one(&path).await
    }

    async fn load_availability_windows(
        &self,
        practitioner_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/availability_windows?practitioner_id=eq.{}&order=day_of_week.asc,start_time.asc",
            practitioner_id
        );
        self.fetch_rows(&path).await
    }

    async fn find_overlapping(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        debug!(
            "Querying overlapping reservations for practitioner {} in [{}, {})",
            practitioner_id, start, end
        );

        let path = format!(
            "/rest/v1/reservations?practitioner_id=eq.{}&status=neq.{}&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            practitioner_id,
            ReservationStatus::Cancelled,
            encode_instant(end),
            encode_instant(start),
        );
        self.fetch_rows(&path).await
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let body = serde_json::to_value(reservation)
            .map_err(|e| StoreError::Backend(format!("Failed to encode reservation: {}", e)))?;

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/reservations",
                Some(body),
                Some(representation_headers()),
            )
            .await
            .map_err(store_error)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Failed to create reservation".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| StoreError::Backend(format!("Failed to parse created reservation: {}", e)))
    }

    async fn update_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<Reservation, StoreError> {
        let body = serde_json::json!({
            "status": reservation.status,
            "end_time": reservation.end_time,
            "updated_at": reservation.updated_at,
        });

        let path = format!("/rest/v1/reservations?id=eq.{}", reservation.id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(representation_headers()),
            )
            .await
            .map_err(store_error)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("Failed to update reservation".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| StoreError::Backend(format!("Failed to parse updated reservation: {}", e)))
    }

    async fn load_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        let path = format!("/rest/v1/reservations?id=eq.{}", reservation_id);
        self.fetch_one(&path).await
    }

    async fn reservations_for_patient(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError> {
        let Some(patient) = self.load_patient_by_user(user_id).await? else {
            return Ok(vec![]);
        };

        let path = format!(
            "/rest/v1/reservations?patient_id=eq.{}&order=created_at.desc",
            patient.id
        );
        self.fetch_rows(&path).await
    }

    async fn reservations_for_practitioner(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Reservation>, StoreError> {
        let Some(practitioner) = self.load_practitioner_by_user(user_id).await? else {
            return Ok(vec![]);
        };

        let path = format!(
            "/rest/v1/reservations?practitioner_id=eq.{}&order=created_at.desc",
            practitioner.id
        );
        self.fetch_rows(&path).await
    }
}
