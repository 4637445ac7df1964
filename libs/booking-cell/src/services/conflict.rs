use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::BookingError;
use crate::store::BookingStore;

pub struct ConflictDetectionService {
    store: Arc<dyn BookingStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Does `[start, end)` overlap any reservation that still holds its slot
    /// for this practitioner? Equal boundaries do not conflict, so
    /// back-to-back slots are legal.
    pub async fn has_conflict(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        debug!(
            "Checking conflicts for practitioner {} from {} to {}",
            practitioner_id, start, end
        );

        let existing = self
            .store
            .find_overlapping(practitioner_id, start, end)
            .await?;

        // Re-apply the overlap predicate on top of whatever range the store
        // returned; only reservations still holding their slot count.
        let conflicting = existing
            .iter()
            .filter(|r| r.holds_slot() && r.overlaps(start, end))
            .count();

        if conflicting > 0 {
            warn!(
                "Conflict detected for practitioner {} - {} overlapping reservations",
                practitioner_id, conflicting
            );
        }

        Ok(conflicting > 0)
    }
}
