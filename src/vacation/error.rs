use chrono::NaiveDate;
use derive_more::Display;
use serde_json::{Value, json};
use strum_macros::IntoStaticStr;

use crate::model::booking::BookingStatus;
use crate::utils::calendar::CalendarError;

/// Every way a booking request or decision can be turned down. All of them
/// are recoverable; `Store` carries collaborator failures through untouched.
#[derive(Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VacationError {
    #[display(fmt = "no employee found for {}", identity)]
    EmployeeNotFound { identity: String },

    #[display(fmt = "employee is assigned to clinic {}, not {}", assigned, requested)]
    ClinicMismatch { assigned: String, requested: String },

    #[display(
        fmt = "employee is assigned to department {}, not {}",
        assigned,
        requested
    )]
    DepartmentMismatch { assigned: String, requested: String },

    #[display(fmt = "end date {} must be on or after start date {}", end, start)]
    InvalidDateOrder { start: NaiveDate, end: NaiveDate },

    #[display(
        fmt = "{}..{} is outside the booking window starting {} and ending before {}",
        start,
        end,
        horizon_start,
        horizon_end
    )]
    OutOfHorizon {
        start: NaiveDate,
        end: NaiveDate,
        horizon_start: NaiveDate,
        horizon_end: NaiveDate,
    },

    #[display(
        fmt = "requested {} vacation days but only {} remaining",
        requested,
        available
    )]
    InsufficientBalance { requested: u32, available: u32 },

    #[display(fmt = "date range overlaps an existing booking from {}", first_conflict)]
    DateRangeConflict {
        first_conflict: NaiveDate,
        conflicting: Vec<NaiveDate>,
    },

    #[display(fmt = "booking {} not found", booking_id)]
    NotFound { booking_id: u64 },

    #[display(fmt = "booking {} was already {}", booking_id, status)]
    AlreadyDecided {
        booking_id: u64,
        status: BookingStatus,
    },

    #[display(fmt = "a rejection reason is required for booking {}", booking_id)]
    ReasonRequired { booking_id: u64 },

    #[display(fmt = "storage failure: {}", _0)]
    Store(anyhow::Error),
}

impl VacationError {
    /// Stable machine-readable kind, e.g. `INSUFFICIENT_BALANCE`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Structured context a client needs to render an actionable message.
    pub fn details(&self) -> Value {
        match self {
            VacationError::EmployeeNotFound { identity } => json!({ "identity": identity }),
            VacationError::ClinicMismatch {
                assigned,
                requested,
            }
            | VacationError::DepartmentMismatch {
                assigned,
                requested,
            } => json!({ "assigned": assigned, "requested": requested }),
            VacationError::InvalidDateOrder { start, end } => {
                json!({ "startDate": start, "endDate": end })
            }
            VacationError::OutOfHorizon {
                start,
                end,
                horizon_start,
                horizon_end,
            } => json!({
                "startDate": start,
                "endDate": end,
                "horizonStart": horizon_start,
                "horizonEnd": horizon_end,
            }),
            VacationError::InsufficientBalance {
                requested,
                available,
            } => json!({ "requested": requested, "available": available }),
            VacationError::DateRangeConflict {
                first_conflict,
                conflicting,
            } => json!({ "firstConflict": first_conflict, "conflictingDates": conflicting }),
            VacationError::NotFound { booking_id } | VacationError::ReasonRequired { booking_id } => {
                json!({ "bookingId": booking_id })
            }
            VacationError::AlreadyDecided { booking_id, status } => {
                json!({ "bookingId": booking_id, "status": status })
            }
            VacationError::Store(_) => Value::Null,
        }
    }
}

impl std::error::Error for VacationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VacationError::Store(e) => Some(e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for VacationError {
    fn from(e: anyhow::Error) -> Self {
        VacationError::Store(e)
    }
}

impl From<CalendarError> for VacationError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::InvalidRange { start, end } => {
                VacationError::InvalidDateOrder { start, end }
            }
        }
    }
}
