//! Collaborator contracts the booking core reads and writes through.
//!
//! Transient failures come back as `anyhow::Error` and are handed to the
//! caller unchanged; the core never retries.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::model::booking::{Booking, BookingUpdate, NewBooking};
use crate::model::employee::Employee;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = anyhow::Result<T>;

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>>;

}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: NewBooking) -> StoreResult<u64>;

    async fn get(&self, id: u64) -> StoreResult<Option<Booking>>;

    /// Applies the decision only if the booking is still pending. Returns
    /// whether a row changed.
    async fn update(&self, id: u64, update: BookingUpdate) -> StoreResult<bool>;

    async fn list_all(&self) -> StoreResult<Vec<Booking>>;

    async fn list_for_slot(&self, clinic: &str, department: &str) -> StoreResult<Vec<Booking>> {
        let mut bookings = self.list_all().await?;
        bookings.retain(|b| b.is_for_slot(clinic, department));
        Ok(bookings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Recorded,
    /// Someone else decided the booking first.
    NotPending,
    /// The balance no longer covers the request.
    BalanceExceeded,
}

#[async_trait]
pub trait VacationRepository: EmployeeDirectory + BookingStore {
    /// Marks the booking approved and adds `days` to the employee's used
    /// count as one unit: either both happen or neither does. The charge is
    /// refused when it would push `used` past the allotment.
    async fn record_approval(
        &self,
        booking_id: u64,
        employee_id: u64,
        days: u32,
    ) -> StoreResult<ApprovalOutcome>;
}
