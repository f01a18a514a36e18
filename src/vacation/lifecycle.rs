use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::availability::occupied_days;
use super::eligibility::{
    BookingCandidate, BookingHorizon, ValidatedRange, check_assignment, check_eligibility,
};
use super::queries::AdminBookingView;
use super::{SlotKey, VacationError, VacationService};
use crate::model::booking::{Booking, BookingStatus, BookingUpdate};
use crate::store::ApprovalOutcome;
use crate::utils::calendar::{calendar_day, format_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

/// What a successful submission hands back: the stored request plus the
/// figures the booking form shows next.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking: Booking,
    #[schema(example = 3)]
    pub requested_days: u32,
    /// Balance after submission. Unchanged until the request is approved.
    #[schema(example = 10)]
    pub remaining_days: u32,
    /// Occupied days of the clinic+department across the booking horizon,
    /// including the new request.
    #[schema(value_type = Vec<String>, example = json!(["2026-01-05", "2026-01-06", "2026-01-07"]))]
    pub unavailable_dates: Vec<NaiveDate>,
}

impl VacationService {
    /// Advisory check. Same rules as [`submit`](Self::submit), no writes and
    /// no locks.
    #[instrument(skip_all, fields(
        email = %candidate.email,
        employee_name = candidate.employee_name.as_deref(),
        clinic = %candidate.clinic,
        department = %candidate.department,
    ))]
    pub async fn precheck(
        &self,
        candidate: &BookingCandidate,
    ) -> Result<ValidatedRange, VacationError> {
        let today = self.clock.today();
        let employee = self.repo.find_by_email(candidate.email.trim()).await?;
        let mut slot = self
            .repo
            .list_for_slot(&candidate.clinic, &candidate.department)
            .await?;
        slot.retain(|b| !self.is_stale(b, today));

        let horizon = BookingHorizon::starting(today, self.policy.horizon_months);
        check_eligibility(employee.as_ref(), candidate, &horizon, &slot)
    }

    /// Re-runs every eligibility check against current state and stores a
    /// pending request. Nothing is written when a check fails.
    #[instrument(skip_all, fields(
        email = %candidate.email,
        employee_name = candidate.employee_name.as_deref(),
        clinic = %candidate.clinic,
        department = %candidate.department,
    ))]
    pub async fn submit(
        &self,
        candidate: &BookingCandidate,
    ) -> Result<BookingReceipt, VacationError> {
        let today = self.clock.today();
        let found = self.repo.find_by_email(candidate.email.trim()).await?;
        let employee = check_assignment(found.as_ref(), candidate).inspect_err(refused)?;

        // Only a matched assignment may create a slot lock entry.
        let _slot_guard = self
            .slot_locks
            .acquire(Self::slot_key(&employee.clinic, &employee.department))
            .await;

        // Re-read under the lock; the first read only told us which slot.
        let employee = self.repo.get_employee(employee.id).await?;
        let mut slot = self
            .repo
            .list_for_slot(&candidate.clinic, &candidate.department)
            .await?;
        self.sweep_stale(&mut slot, today).await?;

        let horizon = BookingHorizon::starting(today, self.policy.horizon_months);
        let validated =
            check_eligibility(employee.as_ref(), candidate, &horizon, &slot).inspect_err(refused)?;

        let requested_days = validated.requested_days;
        let remaining_days = validated.remaining_days;
        let booking_id = self
            .repo
            .create(validated.into_new_booking(self.clock.now()))
            .await?;
        let booking = self.load_booking(booking_id).await?;
        info!(
            booking_id,
            start = %format_date(booking.start_date),
            end = %format_date(booking.end_date),
            requested_days,
            "Vacation request submitted"
        );

        slot.push(booking.clone());
        let unavailable_dates = occupied_days(
            &slot,
            &booking.clinic,
            &booking.department,
            &horizon.window(),
        )
        .into_iter()
        .collect();

        Ok(BookingReceipt {
            booking,
            requested_days,
            remaining_days,
            unavailable_dates,
        })
    }

    /// Moves a pending booking to its terminal state. Approval re-checks the
    /// employee's current balance and charges it in the same store write.
    #[instrument(skip(self, reason))]
    pub async fn decide(
        &self,
        booking_id: u64,
        outcome: DecisionOutcome,
        reason: Option<&str>,
    ) -> Result<AdminBookingView, VacationError> {
        let owner = self.load_booking(booking_id).await?.employee_id;
        let _employee_guard = self.employee_locks.acquire(owner).await;

        // Re-read under the lock; the first read only told us whom to lock.
        let booking = self.load_booking(booking_id).await?;
        if booking.status.is_terminal() {
            return Err(VacationError::AlreadyDecided {
                booking_id,
                status: booking.status,
            });
        }

        match outcome {
            DecisionOutcome::Rejected => {
                let reason = reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or(VacationError::ReasonRequired { booking_id })?;
                if !self
                    .repo
                    .update(booking_id, BookingUpdate::reject(reason))
                    .await?
                {
                    return Err(self.already_decided(booking_id).await);
                }
                info!(booking_id, reason, "Vacation request rejected");
            }
            DecisionOutcome::Approved => {
                let employee = self
                    .repo
                    .get_employee(booking.employee_id)
                    .await?
                    .ok_or_else(|| VacationError::EmployeeNotFound {
                        identity: format!("employee #{}", booking.employee_id),
                    })?;

                let requested = booking.requested_days()?;
                let available = employee.remaining_days();
                if requested > available {
                    warn!(booking_id, requested, available, "Approval blocked by balance");
                    return Err(VacationError::InsufficientBalance {
                        requested,
                        available,
                    });
                }

                match self
                    .repo
                    .record_approval(booking_id, employee.id, requested)
                    .await?
                {
                    ApprovalOutcome::Recorded => {
                        info!(booking_id, employee_id = employee.id, requested, "Vacation request approved");
                    }
                    ApprovalOutcome::NotPending => {
                        return Err(self.already_decided(booking_id).await);
                    }
                    ApprovalOutcome::BalanceExceeded => {
                        let available = self
                            .repo
                            .get_employee(employee.id)
                            .await?
                            .map_or(0, |e| e.remaining_days());
                        return Err(VacationError::InsufficientBalance {
                            requested,
                            available,
                        });
                    }
                }
            }
        }

        self.admin_view(booking_id).await
    }

    /// Rejects every pending request older than the expiry policy allows.
    /// A no-op when no expiry is configured.
    #[instrument(skip(self))]
    pub async fn expire_stale_pending(&self) -> Result<usize, VacationError> {
        if self.policy.pending_expiry_days.is_none() {
            return Ok(0);
        }

        let today = self.clock.today();
        let stale_slots: BTreeSet<SlotKey> = self
            .repo
            .list_all()
            .await?
            .iter()
            .filter(|b| self.is_stale(b, today))
            .map(|b| Self::slot_key(&b.clinic, &b.department))
            .collect();

        let mut expired = 0;
        for (clinic, department) in stale_slots {
            let _slot_guard = self
                .slot_locks
                .acquire((clinic.clone(), department.clone()))
                .await;
            let mut slot = self.repo.list_for_slot(&clinic, &department).await?;
            expired += self.sweep_stale(&mut slot, today).await?;
        }
        Ok(expired)
    }

    /// True for a pending booking whose creation day is at least
    /// `pending_expiry_days` before `today`.
    pub(super) fn is_stale(&self, booking: &Booking, today: NaiveDate) -> bool {
        let Some(expiry_days) = self.policy.pending_expiry_days else {
            return false;
        };
        booking.status == BookingStatus::Pending
            && calendar_day(booking.created_at)
                .checked_add_days(Days::new(u64::from(expiry_days)))
                .is_some_and(|deadline| deadline <= today)
    }

    /// Persists the expiry of stale bookings in `slot` and updates the slice
    /// in place so callers see the post-sweep state. Caller holds the slot
    /// lock.
    async fn sweep_stale(
        &self,
        slot: &mut [Booking],
        today: NaiveDate,
    ) -> Result<usize, VacationError> {
        let Some(expiry_days) = self.policy.pending_expiry_days else {
            return Ok(0);
        };

        let mut expired = 0;
        for booking in slot.iter_mut() {
            if !self.is_stale(booking, today) {
                continue;
            }
            let update = BookingUpdate::reject(format!(
                "request expired after {expiry_days} days without a decision"
            ));
            if self.repo.update(booking.id, update.clone()).await? {
                update.apply_to(booking);
                expired += 1;
                info!(booking_id = booking.id, expiry_days, "Expired stale vacation request");
            } else if let Some(fresh) = self.repo.get(booking.id).await? {
                *booking = fresh;
            }
        }
        Ok(expired)
    }

    pub(super) async fn load_booking(&self, booking_id: u64) -> Result<Booking, VacationError> {
        self.repo
            .get(booking_id)
            .await?
            .ok_or(VacationError::NotFound { booking_id })
    }

    async fn already_decided(&self, booking_id: u64) -> VacationError {
        match self.repo.get(booking_id).await {
            Ok(Some(booking)) => VacationError::AlreadyDecided {
                booking_id,
                status: booking.status,
            },
            Ok(None) => VacationError::NotFound { booking_id },
            Err(e) => e.into(),
        }
    }
}

fn refused(e: &VacationError) {
    info!(kind = e.kind(), reason = %e, "Vacation request refused");
}
