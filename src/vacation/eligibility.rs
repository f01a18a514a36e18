use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::VacationError;
use super::availability::conflicting_days;
use crate::model::booking::{Booking, NewBooking};
use crate::model::employee::Employee;
use crate::utils::calendar::{DateRange, add_months, deserialize_calendar_day};

/// A proposed booking as submitted by the employee form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingCandidate {
    /// Display name typed into the form. Informational only; identity is
    /// resolved by email.
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub employee_name: Option<String>,
    #[schema(example = "jane.doe@clinic.example")]
    pub email: String,
    #[schema(example = "clinic1")]
    pub clinic: String,
    #[schema(example = "dept1")]
    pub department: String,
    #[serde(deserialize_with = "deserialize_calendar_day")]
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_calendar_day")]
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

/// `[start, end)`: the days on which requests may currently be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingHorizon {
    start: NaiveDate,
    end_exclusive: NaiveDate,
}

impl BookingHorizon {
    pub fn starting(today: NaiveDate, months: u32) -> Self {
        Self {
            start: today,
            end_exclusive: add_months(today, months).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end_exclusive(&self) -> NaiveDate {
        self.end_exclusive
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day < self.end_exclusive
    }

    /// The horizon as an inclusive window.
    pub fn window(&self) -> DateRange {
        let last = self.end_exclusive.pred_opt().unwrap_or(self.end_exclusive);
        DateRange::clamped(self.start, last)
    }
}

/// Proof that a candidate passed every eligibility check. Only
/// [`check_eligibility`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRange {
    pub employee_id: u64,
    pub clinic: String,
    pub department: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub requested_days: u32,
    #[schema(example = 10)]
    pub remaining_days: u32,
    #[serde(skip)]
    range: DateRange,
}

impl ValidatedRange {
    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn into_new_booking(self, created_at: DateTime<Utc>) -> NewBooking {
        NewBooking {
            employee_id: self.employee_id,
            clinic: self.clinic,
            department: self.department,
            range: self.range,
            created_at,
        }
    }
}

/// First three checks: the employee exists and the candidate names their
/// own clinic and department.
pub fn check_assignment<'e>(
    employee: Option<&'e Employee>,
    candidate: &BookingCandidate,
) -> Result<&'e Employee, VacationError> {
    let employee = employee.ok_or_else(|| VacationError::EmployeeNotFound {
        identity: candidate.email.trim().to_string(),
    })?;

    if candidate.clinic != employee.clinic {
        return Err(VacationError::ClinicMismatch {
            assigned: employee.clinic.clone(),
            requested: candidate.clinic.clone(),
        });
    }
    if candidate.department != employee.department {
        return Err(VacationError::DepartmentMismatch {
            assigned: employee.department.clone(),
            requested: candidate.department.clone(),
        });
    }
    Ok(employee)
}

/// Runs the booking checks in order and stops at the first failure:
/// employee, clinic, department, date order, horizon, balance, overlap.
///
/// `slot_bookings` must hold the current bookings of the requested
/// clinic+department; other bookings are ignored.
pub fn check_eligibility(
    employee: Option<&Employee>,
    candidate: &BookingCandidate,
    horizon: &BookingHorizon,
    slot_bookings: &[Booking],
) -> Result<ValidatedRange, VacationError> {
    let employee = check_assignment(employee, candidate)?;

    let range = DateRange::new(candidate.start_date, candidate.end_date)?;

    if !horizon.contains(range.start()) || !horizon.contains(range.end()) {
        return Err(VacationError::OutOfHorizon {
            start: range.start(),
            end: range.end(),
            horizon_start: horizon.start(),
            horizon_end: horizon.end_exclusive(),
        });
    }

    let requested = range.len_days();
    let available = employee.remaining_days();
    if requested > available {
        return Err(VacationError::InsufficientBalance {
            requested,
            available,
        });
    }

    let conflicting = conflicting_days(slot_bookings, &employee.clinic, &employee.department, &range);
    if let Some(first_conflict) = conflicting.first().copied() {
        return Err(VacationError::DateRangeConflict {
            first_conflict,
            conflicting,
        });
    }

    Ok(ValidatedRange {
        employee_id: employee.id,
        clinic: employee.clinic.clone(),
        department: employee.department.clone(),
        start_date: range.start(),
        end_date: range.end(),
        requested_days: requested,
        remaining_days: available,
        range,
    })
}
