// libs/booking-cell/src/services/eligibility.rs
use chrono::NaiveDate;

use crate::models::{BookingError, BookingSubject, GenderPolicy, Practitioner};

/// Decide whether `subject` may be booked with `practitioner` as of `today`.
///
/// Checks run in a fixed order and the first violation wins: gender policy
/// first, then the age bounds. A missing birth date under an age-restricted
/// practitioner is a rejection, never a silent pass.
pub fn evaluate(
    practitioner: &Practitioner,
    subject: &BookingSubject,
    today: NaiveDate,
) -> Result<(), BookingError> {
    if let GenderPolicy::Only(required) = practitioner.gender_policy() {
        let gender = subject.gender.as_deref().map(str::trim).unwrap_or("");
        if gender.is_empty() {
            return Err(BookingError::MissingSubjectGender);
        }
        if !gender.eq_ignore_ascii_case(&required) {
            return Err(BookingError::GenderRestricted(required));
        }
    }

    match subject.date_of_birth {
        Some(date_of_birth) => {
            let age = age_on(date_of_birth, today);
            if let Some(min_age) = practitioner.min_age {
                if age < min_age {
                    return Err(BookingError::BelowMinimumAge(min_age));
                }
            }
            if let Some(max_age) = practitioner.max_age {
                if age > max_age {
                    return Err(BookingError::AboveMaximumAge(max_age));
                }
            }
        }
        None => {
            if practitioner.has_age_restriction() {
                return Err(BookingError::MissingDateOfBirth);
            }
        }
    }

    Ok(())
}

/// Whole calendar years between `date_of_birth` and `today`.
fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    today.years_since(date_of_birth).unwrap_or(0) as i32
}
