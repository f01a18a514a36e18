use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::utils::calendar::{CalendarError, DateRange, days_between};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Approved and rejected bookings accept no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Pending requests hold their days exactly like approved ones.
    pub fn occupies_calendar(&self) -> bool {
        !matches!(self, BookingStatus::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 7,
    "employeeId": 1,
    "clinic": "clinic1",
    "department": "dept1",
    "startDate": "2026-01-05",
    "endDate": "2026-01-07",
    "status": "pending",
    "rejectionReason": null,
    "createdAt": "2026-01-01T09:30:00Z"
}))]
pub struct Booking {
    pub id: u64,
    pub employee_id: u64,
    pub clinic: String,
    pub department: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    #[schema(nullable = true)]
    pub rejection_reason: Option<String>,
    #[schema(example = "2026-01-01T09:30:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> Result<DateRange, CalendarError> {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn requested_days(&self) -> Result<u32, CalendarError> {
        days_between(self.start_date, self.end_date)
    }

    pub fn is_for_slot(&self, clinic: &str, department: &str) -> bool {
        self.clinic == clinic && self.department == department
    }
}

/// Insert payload for a freshly submitted request. Always stored as pending.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub employee_id: u64,
    pub clinic: String,
    pub department: String,
    pub range: DateRange,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_pending(self, id: u64) -> Booking {
        Booking {
            id,
            employee_id: self.employee_id,
            clinic: self.clinic,
            department: self.department,
            start_date: self.range.start(),
            end_date: self.range.end(),
            status: BookingStatus::Pending,
            rejection_reason: None,
            created_at: self.created_at,
        }
    }
}

/// Fields a decision writes. Stores apply it only while the record is still
/// pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingUpdate {
    pub status: BookingStatus,
    pub rejection_reason: Option<String>,
}

impl BookingUpdate {
    pub fn approve() -> Self {
        Self {
            status: BookingStatus::Approved,
            rejection_reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            status: BookingStatus::Rejected,
            rejection_reason: Some(reason.into()),
        }
    }

    pub fn apply_to(&self, booking: &mut Booking) {
        booking.status = self.status;
        booking.rejection_reason = self.rejection_reason.clone();
    }
}
