//! Booking core: availability, eligibility, the approval lifecycle and the
//! read projections built on top of them.

mod availability;
mod eligibility;
mod error;
mod lifecycle;
mod queries;
#[cfg(test)]
mod tests;

pub use eligibility::{BookingCandidate, BookingHorizon, ValidatedRange};
pub use error::VacationError;
pub use lifecycle::{BookingReceipt, DecisionOutcome};
pub use queries::{AdminBookingView, AdminFilter, EmployeeProfile};

use std::sync::Arc;

use crate::store::VacationRepository;
use crate::utils::calendar::Clock;
use crate::utils::key_locks::KeyLocks;

/// Tunables that shape what may be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Length of the booking horizon in calendar months.
    pub horizon_months: u32,
    /// Pending requests older than this many days are rejected
    /// automatically. `None` keeps them pending until an admin decides.
    pub pending_expiry_days: Option<u32>,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            horizon_months: 2,
            pending_expiry_days: None,
        }
    }
}

type SlotKey = (String, String);

pub struct VacationService {
    repo: Arc<dyn VacationRepository>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
    /// Held while an employee's balance is checked and charged.
    employee_locks: KeyLocks<u64>,
    /// Held across the overlap check and insert for a clinic+department.
    slot_locks: KeyLocks<SlotKey>,
}

impl VacationService {
    pub fn new(
        repo: Arc<dyn VacationRepository>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            repo,
            clock,
            policy,
            employee_locks: KeyLocks::new(),
            slot_locks: KeyLocks::new(),
        }
    }

    pub fn policy(&self) -> BookingPolicy {
        self.policy
    }

    /// Horizon as of the current clock reading.
    pub fn horizon(&self) -> BookingHorizon {
        BookingHorizon::starting(self.clock.today(), self.policy.horizon_months)
    }

    fn slot_key(clinic: &str, department: &str) -> SlotKey {
        (clinic.to_string(), department.to_string())
    }
}
