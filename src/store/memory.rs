use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use super::{
    ApprovalOutcome, BookingStore, EmployeeDirectory, StoreResult, VacationRepository,
};
use crate::model::booking::{Booking, BookingStatus, BookingUpdate, NewBooking};
use crate::model::employee::{Employee, NewEmployee};

#[derive(Default)]
struct MemoryState {
    employees: BTreeMap<u64, Employee>,
    bookings: BTreeMap<u64, Booking>,
    next_employee_id: u64,
    next_booking_id: u64,
}

impl MemoryState {
    fn employee_by_email(&self, email: &str) -> Option<&Employee> {
        self.employees
            .values()
            .find(|e| e.email.eq_ignore_ascii_case(email.trim()))
    }
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_employee(&self, employee: NewEmployee) -> anyhow::Result<Employee> {
        if employee.used_vacation_days > employee.annual_vacation_days {
            bail!(
                "employee {} has used {} of {} days",
                employee.email,
                employee.used_vacation_days,
                employee.annual_vacation_days
            );
        }

        let mut state = self.state.write().await;
        if state.employee_by_email(&employee.email).is_some() {
            bail!("employee with email {} already exists", employee.email);
        }

        state.next_employee_id += 1;
        let record = Employee {
            id: state.next_employee_id,
            name: employee.name,
            email: employee.email.trim().to_string(),
            clinic: employee.clinic,
            department: employee.department,
            annual_vacation_days: employee.annual_vacation_days,
            used_vacation_days: employee.used_vacation_days,
        };
        state.employees.insert(record.id, record.clone());
        Ok(record)
    }

    /// Loads a JSON array of employees, as exported by provisioning.
    pub async fn load_seed(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading employee seed {}", path.display()))?;
        let employees: Vec<NewEmployee> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing employee seed {}", path.display()))?;

        let count = employees.len();
        for employee in employees {
            self.insert_employee(employee).await?;
        }
        info!(count, path = %path.display(), "Seeded in-memory employee directory");
        Ok(count)
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        Ok(self.state.read().await.employee_by_email(email).cloned())
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.state.read().await.employees.get(&id).cloned())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create(&self, booking: NewBooking) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        state.next_booking_id += 1;
        let id = state.next_booking_id;
        state.bookings.insert(id, booking.into_pending(id));
        Ok(id)
    }

    async fn get(&self, id: u64) -> StoreResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn update(&self, id: u64, update: BookingUpdate) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(apply_if_pending(&mut state, id, &update))
    }

    async fn list_all(&self) -> StoreResult<Vec<Booking>> {
        Ok(self.state.read().await.bookings.values().cloned().collect())
    }

    async fn list_for_slot(&self, clinic: &str, department: &str) -> StoreResult<Vec<Booking>> {
        Ok(self
            .state
            .read()
            .await
            .bookings
            .values()
            .filter(|b| b.is_for_slot(clinic, department))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VacationRepository for MemoryStore {
    async fn record_approval(
        &self,
        booking_id: u64,
        employee_id: u64,
        days: u32,
    ) -> StoreResult<ApprovalOutcome> {
        let mut state = self.state.write().await;

        let pending = state
            .bookings
            .get(&booking_id)
            .is_some_and(|b| b.status == BookingStatus::Pending);
        if !pending {
            return Ok(ApprovalOutcome::NotPending);
        }
        let covered = state
            .employees
            .get(&employee_id)
            .is_some_and(|e| e.remaining_days() >= days);
        if !covered {
            return Ok(ApprovalOutcome::BalanceExceeded);
        }

        apply_if_pending(&mut state, booking_id, &BookingUpdate::approve());
        charge(&mut state, employee_id, days);
        Ok(ApprovalOutcome::Recorded)
    }
}

fn apply_if_pending(state: &mut MemoryState, id: u64, update: &BookingUpdate) -> bool {
    match state.bookings.get_mut(&id) {
        Some(booking) if booking.status == BookingStatus::Pending => {
            update.apply_to(booking);
            true
        }
        _ => false,
    }
}

fn charge(state: &mut MemoryState, employee_id: u64, days: u32) -> bool {
    match state.employees.get_mut(&employee_id) {
        Some(employee) if employee.remaining_days() >= days => {
            employee.used_vacation_days += days;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::calendar::DateRange;
    use chrono::{NaiveDate, Utc};

    fn jane() -> NewEmployee {
        NewEmployee {
            name: "Jane".into(),
            email: "jane@clinic.example".into(),
            clinic: "clinic1".into(),
            department: "dept1".into(),
            annual_vacation_days: 10,
            used_vacation_days: 8,
        }
    }

    fn new_booking(employee_id: u64) -> NewBooking {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        NewBooking {
            employee_id,
            clinic: "clinic1".into(),
            department: "dept1".into(),
            range: DateRange::new(start, end).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let jane = store.insert_employee(jane()).await.unwrap();

        let found = store.find_by_email("JANE@clinic.example").await.unwrap();
        assert_eq!(found, Some(jane));
        assert!(store.insert_employee(self::jane()).await.is_err());
    }

    #[tokio::test]
    async fn update_only_touches_pending_bookings() {
        let store = MemoryStore::new();
        let id = store.create(new_booking(1)).await.unwrap();

        assert!(store.update(id, BookingUpdate::reject("busy")).await.unwrap());
        assert!(!store.update(id, BookingUpdate::approve()).await.unwrap());

        let booking = store.get(id).await.unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Rejected);
        assert_eq!(booking.rejection_reason.as_deref(), Some("busy"));
    }

    #[tokio::test]
    async fn approval_checks_balance_and_status_together() {
        let store = MemoryStore::new();
        let jane = store.insert_employee(jane()).await.unwrap();
        let id = store.create(new_booking(jane.id)).await.unwrap();

        assert_eq!(
            store.record_approval(id, jane.id, 3).await.unwrap(),
            ApprovalOutcome::BalanceExceeded
        );
        // A refused charge leaves both records untouched.
        let untouched = store.get(id).await.unwrap().unwrap();
        assert_eq!(untouched.status, BookingStatus::Pending);
        let unchanged = store.get_employee(jane.id).await.unwrap().unwrap();
        assert_eq!(unchanged.used_vacation_days, 8);

        assert_eq!(
            store.record_approval(id, jane.id, 2).await.unwrap(),
            ApprovalOutcome::Recorded
        );
        assert_eq!(
            store.record_approval(id, jane.id, 2).await.unwrap(),
            ApprovalOutcome::NotPending
        );

        let jane = store.get_employee(jane.id).await.unwrap().unwrap();
        assert_eq!(jane.used_vacation_days, 10);
    }

    #[tokio::test]
    async fn seed_file_populates_the_directory() {
        let path = std::env::temp_dir().join(format!("vacation-seed-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[
                {"name": "Ana", "email": "ana@clinic.example", "clinic": "clinic1", "department": "dept1", "annualVacationDays": 25},
                {"name": "Tom", "email": "tom@clinic.example", "clinic": "clinic2", "department": "dept1", "annualVacationDays": 20, "usedVacationDays": 5}
            ]"#,
        )
        .await
        .unwrap();

        let store = MemoryStore::new();
        let loaded = store.load_seed(&path).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(loaded.unwrap(), 2);
        let tom = store.find_by_email("tom@clinic.example").await.unwrap().unwrap();
        assert_eq!(tom.remaining_days(), 15);
        assert!(store.load_seed(&path).await.is_err());
    }
}
