use std::sync::Arc;

use chrono::{Days, NaiveDate};
use futures::future::join_all;

use super::*;
use crate::model::booking::BookingStatus;
use crate::model::employee::{Employee, NewEmployee};
use crate::store::{BookingStore, EmployeeDirectory, MemoryStore};
use crate::utils::calendar::{DateRange, FixedClock};

fn d(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn today() -> NaiveDate {
    d(5, 20)
}

fn service_at(store: &Arc<MemoryStore>, day: NaiveDate, policy: BookingPolicy) -> VacationService {
    VacationService::new(store.clone(), Arc::new(FixedClock::on(day)), policy)
}

fn setup() -> (Arc<MemoryStore>, VacationService) {
    let store = Arc::new(MemoryStore::new());
    let service = service_at(&store, today(), BookingPolicy::default());
    (store, service)
}

async fn hire(store: &MemoryStore, email: &str, department: &str, allotment: u32, used: u32) -> Employee {
    store
        .insert_employee(NewEmployee {
            name: email.split('@').next().unwrap().to_string(),
            email: email.into(),
            clinic: "clinic1".into(),
            department: department.into(),
            annual_vacation_days: allotment,
            used_vacation_days: used,
        })
        .await
        .unwrap()
}

fn request(email: &str, department: &str, start: NaiveDate, end: NaiveDate) -> BookingCandidate {
    BookingCandidate {
        employee_name: None,
        email: email.into(),
        clinic: "clinic1".into(),
        department: department.into(),
        start_date: start,
        end_date: end,
    }
}

async fn used_days(store: &MemoryStore, employee_id: u64) -> u32 {
    store
        .get_employee(employee_id)
        .await
        .unwrap()
        .unwrap()
        .used_vacation_days
}

#[tokio::test]
async fn scenario_a_balance_shortfall_creates_nothing() {
    let (store, service) = setup();
    hire(&store, "ana@clinic.example", "dept1", 20, 18).await;

    let err = service
        .submit(&request("ana@clinic.example", "dept1", d(6, 1), d(6, 3)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        VacationError::InsufficientBalance { requested: 3, available: 2 }
    ));
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn scenario_b_submit_then_approve_charges_balance_once() {
    let (store, service) = setup();
    let ben = hire(&store, "ben@clinic.example", "dept1", 20, 10).await;

    let receipt = service
        .submit(&request("ben@clinic.example", "dept1", d(6, 1), d(6, 3)))
        .await
        .unwrap();
    assert_eq!(receipt.booking.status, BookingStatus::Pending);
    assert_eq!(receipt.requested_days, 3);
    assert_eq!(receipt.remaining_days, 10);
    assert_eq!(receipt.unavailable_dates, vec![d(6, 1), d(6, 2), d(6, 3)]);
    assert_eq!(used_days(&store, ben.id).await, 10);

    let view = service
        .decide(receipt.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap();
    assert_eq!(view.status, BookingStatus::Approved);
    assert_eq!(view.used_vacation_days, 13);
    assert_eq!(view.remaining_days, 7);
    assert!(!view.can_approve);
    assert_eq!(used_days(&store, ben.id).await, 13);

    let again = service
        .decide(receipt.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(
        again,
        VacationError::AlreadyDecided { status: BookingStatus::Approved, .. }
    ));
    assert_eq!(used_days(&store, ben.id).await, 13);
}

#[tokio::test]
async fn scenario_c_pending_request_blocks_colleague() {
    let (store, service) = setup();
    hire(&store, "ben@clinic.example", "dept1", 20, 10).await;
    hire(&store, "cleo@clinic.example", "dept1", 20, 0).await;

    service
        .submit(&request("ben@clinic.example", "dept1", d(6, 1), d(6, 3)))
        .await
        .unwrap();

    let err = service
        .submit(&request("cleo@clinic.example", "dept1", d(6, 3), d(6, 5)))
        .await
        .unwrap_err();
    match err {
        VacationError::DateRangeConflict {
            first_conflict,
            conflicting,
        } => {
            assert_eq!(first_conflict, d(6, 3));
            assert_eq!(conflicting, vec![d(6, 3)]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_d_rejection_needs_reason_and_frees_the_range() {
    let (store, service) = setup();
    let ben = hire(&store, "ben@clinic.example", "dept1", 20, 10).await;
    hire(&store, "cleo@clinic.example", "dept1", 20, 0).await;

    let id = service
        .submit(&request("ben@clinic.example", "dept1", d(6, 1), d(6, 3)))
        .await
        .unwrap()
        .booking
        .id;

    for reason in [None, Some(""), Some("   ")] {
        let err = service
            .decide(id, DecisionOutcome::Rejected, reason)
            .await
            .unwrap_err();
        assert!(matches!(err, VacationError::ReasonRequired { booking_id } if booking_id == id));
    }
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        BookingStatus::Pending
    );

    let view = service
        .decide(id, DecisionOutcome::Rejected, Some("staffing shortage"))
        .await
        .unwrap();
    assert_eq!(view.status, BookingStatus::Rejected);
    assert_eq!(view.rejection_reason.as_deref(), Some("staffing shortage"));
    assert_eq!(used_days(&store, ben.id).await, 10);

    let later = service
        .submit(&request("cleo@clinic.example", "dept1", d(6, 2), d(6, 4)))
        .await
        .unwrap();
    assert_eq!(later.booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn scenario_e_start_beyond_horizon() {
    let (store, service) = setup();
    hire(&store, "dan@clinic.example", "dept1", 20, 0).await;

    let start = today().checked_add_days(Days::new(70)).unwrap();
    let err = service
        .submit(&request("dan@clinic.example", "dept1", start, start))
        .await
        .unwrap_err();
    assert!(matches!(err, VacationError::OutOfHorizon { horizon_end, .. } if horizon_end == d(7, 20)));
}

#[tokio::test]
async fn decide_on_unknown_booking_is_not_found() {
    let (_store, service) = setup();
    let err = service
        .decide(404, DecisionOutcome::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VacationError::NotFound { booking_id: 404 }));
}

#[tokio::test]
async fn approval_rechecks_balance_across_pending_requests() {
    let (store, service) = setup();
    let eve = hire(&store, "eve@clinic.example", "dept1", 10, 5).await;

    let first = service
        .submit(&request("eve@clinic.example", "dept1", d(6, 1), d(6, 3)))
        .await
        .unwrap();
    let second = service
        .submit(&request("eve@clinic.example", "dept1", d(6, 10), d(6, 12)))
        .await
        .unwrap();

    service
        .decide(first.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap();
    let err = service
        .decide(second.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VacationError::InsufficientBalance { requested: 3, available: 2 }
    ));

    let still = store.get(second.booking.id).await.unwrap().unwrap();
    assert_eq!(still.status, BookingStatus::Pending);
    assert_eq!(used_days(&store, eve.id).await, 8);

    let rows = service.list_for_admin(&AdminFilter::default()).await.unwrap();
    let row = rows.iter().find(|r| r.id == second.booking.id).unwrap();
    assert!(!row.can_approve);
    assert_eq!(row.remaining_days, 2);

    service
        .decide(second.booking.id, DecisionOutcome::Rejected, Some("not enough days"))
        .await
        .unwrap();
}

#[tokio::test]
async fn assignment_and_identity_failures() {
    let (store, service) = setup();
    hire(&store, "fay@clinic.example", "dept1", 20, 0).await;

    let err = service
        .submit(&request("nobody@clinic.example", "dept1", d(6, 1), d(6, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, VacationError::EmployeeNotFound { .. }));

    let mut wrong_clinic = request("fay@clinic.example", "dept1", d(6, 1), d(6, 1));
    wrong_clinic.clinic = "clinic2".into();
    let err = service.submit(&wrong_clinic).await.unwrap_err();
    assert_eq!(err.kind(), "CLINIC_MISMATCH");

    let err = service
        .submit(&request("fay@clinic.example", "dept2", d(6, 1), d(6, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "DEPARTMENT_MISMATCH");

    let err = service
        .submit(&request("fay@clinic.example", "dept1", d(6, 3), d(6, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INVALID_DATE_ORDER");

    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn refused_requests_leave_no_lock_entries_behind() {
    let (store, service) = setup();
    hire(&store, "ivy@clinic.example", "dept1", 20, 0).await;

    for i in 0..200 {
        let mut ghost = request("nobody@clinic.example", "dept1", d(6, 1), d(6, 1));
        ghost.clinic = format!("clinic-{i}");
        ghost.department = format!("dept-{i}");
        assert!(service.submit(&ghost).await.is_err());

        let mut stray = request("ivy@clinic.example", "dept1", d(6, 1), d(6, 1));
        stray.clinic = format!("clinic-{i}");
        assert!(service.submit(&stray).await.is_err());
    }
    assert_eq!(service.slot_locks.len(), 0);

    let err = service
        .submit(&request("ivy@clinic.example", "dept1", d(6, 3), d(6, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INVALID_DATE_ORDER");
    assert_eq!(service.slot_locks.len(), 0);

    let receipt = service
        .submit(&request("ivy@clinic.example", "dept1", d(6, 1), d(6, 2)))
        .await
        .unwrap();
    service
        .decide(receipt.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap();
    assert_eq!(service.slot_locks.len(), 0);
    assert_eq!(service.employee_locks.len(), 0);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn precheck_is_advisory_and_writes_nothing() {
    let (store, service) = setup();
    hire(&store, "gus@clinic.example", "dept1", 20, 0).await;

    let validated = service
        .precheck(&request("GUS@clinic.example ", "dept1", d(6, 1), d(6, 5)))
        .await
        .unwrap();
    assert_eq!(validated.requested_days, 5);
    assert_eq!(validated.remaining_days, 20);
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_days_is_idempotent_and_scoped() {
    let (store, service) = setup();
    hire(&store, "hal@clinic.example", "dept1", 20, 0).await;
    hire(&store, "ivy@clinic.example", "dept2", 20, 0).await;

    service
        .submit(&request("hal@clinic.example", "dept1", d(6, 1), d(6, 2)))
        .await
        .unwrap();
    service
        .submit(&request("ivy@clinic.example", "dept2", d(6, 5), d(6, 6)))
        .await
        .unwrap();

    let first = service
        .unavailable_days("clinic1", "dept1", d(5, 20), d(7, 19))
        .await
        .unwrap();
    let second = service
        .unavailable_days("clinic1", "dept1", d(5, 20), d(7, 19))
        .await
        .unwrap();
    assert_eq!(first, vec![d(6, 1), d(6, 2)]);
    assert_eq!(first, second);

    assert!(service.is_range_free("clinic1", "dept1", d(6, 3), d(6, 9)).await.unwrap());
    assert!(!service.is_range_free("clinic1", "dept2", d(6, 3), d(6, 9)).await.unwrap());

    let err = service
        .unavailable_days("clinic1", "dept1", d(7, 1), d(6, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INVALID_DATE_ORDER");
}

#[tokio::test]
async fn admin_listing_is_newest_first_and_filterable() {
    let (store, service) = setup();
    hire(&store, "jo@clinic.example", "dept1", 20, 0).await;

    let older = service
        .submit(&request("jo@clinic.example", "dept1", d(6, 1), d(6, 1)))
        .await
        .unwrap();
    let newer = service
        .submit(&request("jo@clinic.example", "dept1", d(6, 8), d(6, 9)))
        .await
        .unwrap();
    service
        .decide(older.booking.id, DecisionOutcome::Rejected, Some("audit week"))
        .await
        .unwrap();

    let rows = service.list_for_admin(&AdminFilter::default()).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.booking.id, older.booking.id]);
    assert_eq!(rows[0].employee_name, "jo");
    assert_eq!(rows[0].requested_days, 2);
    assert!(rows[0].can_approve);

    let pending_only = AdminFilter {
        status: Some(BookingStatus::Pending),
        ..AdminFilter::default()
    };
    let rows = service.list_for_admin(&pending_only).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, newer.booking.id);
}

#[tokio::test]
async fn stale_pending_requests_expire_only_when_configured() {
    let store = Arc::new(MemoryStore::new());
    hire(&store, "kim@clinic.example", "dept1", 20, 0).await;
    hire(&store, "lou@clinic.example", "dept1", 20, 0).await;

    let expiring = BookingPolicy {
        pending_expiry_days: Some(7),
        ..BookingPolicy::default()
    };
    let stale = service_at(&store, today(), expiring)
        .submit(&request("kim@clinic.example", "dept1", d(6, 25), d(6, 27)))
        .await
        .unwrap()
        .booking;

    let later = d(5, 27);
    let no_expiry = service_at(&store, later, BookingPolicy::default());
    let err = no_expiry
        .submit(&request("lou@clinic.example", "dept1", d(6, 26), d(6, 26)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "DATE_RANGE_CONFLICT");
    assert_eq!(no_expiry.expire_stale_pending().await.unwrap(), 0);

    let day_before = service_at(&store, d(5, 26), expiring);
    assert!(!day_before.is_range_free("clinic1", "dept1", d(6, 26), d(6, 26)).await.unwrap());

    let expiring_service = service_at(&store, later, expiring);
    assert!(expiring_service.is_range_free("clinic1", "dept1", d(6, 26), d(6, 26)).await.unwrap());
    let receipt = expiring_service
        .submit(&request("lou@clinic.example", "dept1", d(6, 26), d(6, 26)))
        .await
        .unwrap();
    assert_eq!(receipt.unavailable_dates, vec![d(6, 26)]);

    let swept = store.get(stale.id).await.unwrap().unwrap();
    assert_eq!(swept.status, BookingStatus::Rejected);
    assert!(swept.rejection_reason.unwrap().contains("expired"));
}

#[tokio::test]
async fn reaper_sweep_rejects_every_stale_request() {
    let store = Arc::new(MemoryStore::new());
    hire(&store, "max@clinic.example", "dept1", 20, 0).await;
    hire(&store, "ned@clinic.example", "dept2", 20, 0).await;

    let policy = BookingPolicy {
        pending_expiry_days: Some(3),
        ..BookingPolicy::default()
    };
    let early = service_at(&store, today(), policy);
    let a = early
        .submit(&request("max@clinic.example", "dept1", d(6, 1), d(6, 2)))
        .await
        .unwrap();
    let b = early
        .submit(&request("ned@clinic.example", "dept2", d(6, 1), d(6, 2)))
        .await
        .unwrap();
    early
        .decide(b.booking.id, DecisionOutcome::Approved, None)
        .await
        .unwrap();

    let late = service_at(&store, d(5, 23), policy);
    assert_eq!(late.expire_stale_pending().await.unwrap(), 1);
    assert_eq!(late.expire_stale_pending().await.unwrap(), 0);

    let a = store.get(a.booking.id).await.unwrap().unwrap();
    let b = store.get(b.booking.id).await.unwrap().unwrap();
    assert_eq!(a.status, BookingStatus::Rejected);
    assert_eq!(b.status, BookingStatus::Approved);
}

#[tokio::test]
async fn concurrent_approvals_never_overdraw() {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(service_at(&store, today(), BookingPolicy::default()));
    let oli = hire(&store, "oli@clinic.example", "dept1", 10, 5).await;

    let mut ids = Vec::new();
    for start in [1, 8] {
        let receipt = service
            .submit(&request("oli@clinic.example", "dept1", d(6, start), d(6, start + 2)))
            .await
            .unwrap();
        ids.push(receipt.booking.id);
    }

    let results = join_all(ids.iter().map(|id| {
        let service = service.clone();
        let id = *id;
        tokio::spawn(async move { service.decide(id, DecisionOutcome::Approved, None).await })
    }))
    .await;

    let approved = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(approved, 1);
    assert_eq!(used_days(&store, oli.id).await, 8);
}

#[tokio::test]
async fn concurrent_submits_keep_slot_free_of_overlaps() {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(service_at(&store, today(), BookingPolicy::default()));
    for i in 0..8 {
        hire(&store, &format!("staff{i}@clinic.example"), "dept1", 20, 0).await;
    }

    let results = join_all((0..8).map(|i| {
        let service = service.clone();
        let start = d(6, 1 + i);
        let end = d(6, 3 + i);
        tokio::spawn(async move {
            service
                .submit(&request(&format!("staff{i}@clinic.example"), "dept1", start, end))
                .await
        })
    }))
    .await;
    let accepted = results.into_iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert!(accepted >= 1);

    let live: Vec<_> = store
        .list_for_slot("clinic1", "dept1")
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.status.occupies_calendar())
        .collect();
    assert_eq!(live.len(), accepted);
    for (i, a) in live.iter().enumerate() {
        for b in &live[i + 1..] {
            let ra = DateRange::new(a.start_date, a.end_date).unwrap();
            let rb = DateRange::new(b.start_date, b.end_date).unwrap();
            assert!(ra.intersection(&rb).is_none(), "{a:?} overlaps {b:?}");
        }
    }
}
