use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};

use super::{VacationError, VacationService};
use crate::model::booking::{Booking, BookingStatus};
use crate::model::employee::Employee;
use crate::utils::calendar::CalendarError;

/// One row of the admin table: a booking joined with its owner's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 7,
    "employeeId": 1,
    "employeeName": "Jane Doe",
    "employeeEmail": "jane.doe@clinic.example",
    "clinic": "clinic1",
    "department": "dept1",
    "startDate": "2026-01-05",
    "endDate": "2026-01-07",
    "status": "pending",
    "rejectionReason": null,
    "createdAt": "2026-01-01T09:30:00Z",
    "annualVacationDays": 20,
    "usedVacationDays": 4,
    "requestedDays": 3,
    "remainingDays": 16,
    "canApprove": true
}))]
pub struct AdminBookingView {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: String,
    pub employee_email: String,
    pub clinic: String,
    pub department: String,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    #[schema(nullable = true)]
    pub rejection_reason: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub annual_vacation_days: u32,
    pub used_vacation_days: u32,
    pub requested_days: u32,
    /// Read-time balance of the employee.
    pub remaining_days: u32,
    /// Pending and still covered by the current balance.
    pub can_approve: bool,
}

impl AdminBookingView {
    fn join(booking: Booking, employee: &Employee) -> Result<Self, CalendarError> {
        let requested_days = booking.requested_days()?;
        let remaining_days = employee.remaining_days();
        Ok(Self {
            id: booking.id,
            employee_id: booking.employee_id,
            employee_name: employee.name.clone(),
            employee_email: employee.email.clone(),
            clinic: booking.clinic,
            department: booking.department,
            start_date: booking.start_date,
            end_date: booking.end_date,
            can_approve: booking.status == BookingStatus::Pending
                && requested_days <= remaining_days,
            status: booking.status,
            rejection_reason: booking.rejection_reason,
            created_at: booking.created_at,
            annual_vacation_days: employee.annual_vacation_days,
            used_vacation_days: employee.used_vacation_days,
            requested_days,
            remaining_days,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AdminFilter {
    /// Only bookings in this status
    #[param(value_type = Option<String>, example = "pending")]
    pub status: Option<BookingStatus>,
    /// Only bookings for this clinic
    #[param(example = "clinic1")]
    pub clinic: Option<String>,
    /// Only bookings for this department
    #[param(example = "dept1")]
    pub department: Option<String>,
}

impl AdminFilter {
    fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|s| s == booking.status)
            && self.clinic.as_deref().is_none_or(|c| c == booking.clinic)
            && self
                .department
                .as_deref()
                .is_none_or(|d| d == booking.department)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub clinic: String,
    pub department: String,
    pub annual_vacation_days: u32,
    pub used_vacation_days: u32,
    pub remaining_days: u32,
}

impl From<Employee> for EmployeeProfile {
    fn from(e: Employee) -> Self {
        Self {
            remaining_days: e.remaining_days(),
            id: e.id,
            name: e.name,
            email: e.email,
            clinic: e.clinic,
            department: e.department,
            annual_vacation_days: e.annual_vacation_days,
            used_vacation_days: e.used_vacation_days,
        }
    }
}

impl VacationService {
    /// All bookings joined with their owners, newest first. Read-only.
    #[instrument(skip(self))]
    pub async fn list_for_admin(
        &self,
        filter: &AdminFilter,
    ) -> Result<Vec<AdminBookingView>, VacationError> {
        let mut bookings = self.repo.list_all().await?;
        bookings.retain(|b| filter.matches(b));
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut owners: HashMap<u64, Employee> = HashMap::new();
        for booking in &bookings {
            if owners.contains_key(&booking.employee_id) {
                continue;
            }
            if let Some(employee) = self.repo.get_employee(booking.employee_id).await? {
                owners.insert(employee.id, employee);
            }
        }

        let mut rows = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let Some(owner) = owners.get(&booking.employee_id) else {
                warn!(booking_id = booking.id, employee_id = booking.employee_id, "Booking owner missing, skipping row");
                continue;
            };
            rows.push(AdminBookingView::join(booking, owner)?);
        }
        Ok(rows)
    }

    /// Occupied days of a clinic+department inside the window, in order.
    /// Stale pending requests are left out when an expiry policy is set.
    #[instrument(skip(self))]
    pub async fn unavailable_days(
        &self,
        clinic: &str,
        department: &str,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, VacationError> {
        Ok(self
            .occupied_days(clinic, department, window_start, window_end)
            .await?
            .into_iter()
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn employee_profile(&self, email: &str) -> Result<EmployeeProfile, VacationError> {
        self.repo
            .find_by_email(email.trim())
            .await?
            .map(EmployeeProfile::from)
            .ok_or_else(|| VacationError::EmployeeNotFound {
                identity: email.trim().to_string(),
            })
    }

    pub(super) async fn admin_view(
        &self,
        booking_id: u64,
    ) -> Result<AdminBookingView, VacationError> {
        let booking = self.load_booking(booking_id).await?;
        let owner = self
            .repo
            .get_employee(booking.employee_id)
            .await?
            .ok_or_else(|| VacationError::EmployeeNotFound {
                identity: format!("employee #{}", booking.employee_id),
            })?;
        Ok(AdminBookingView::join(booking, &owner)?)
    }
}
