use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::instrument;

use super::{VacationError, VacationService};
use crate::model::booking::Booking;
use crate::utils::calendar::{DateRange, enumerate_days};

/// Days inside `window` covered by a non-rejected booking of the given
/// clinic+department. Pending and approved bookings count the same.
pub fn occupied_days(
    bookings: &[Booking],
    clinic: &str,
    department: &str,
    window: &DateRange,
) -> BTreeSet<NaiveDate> {
    bookings
        .iter()
        .filter(|b| b.status.occupies_calendar() && b.is_for_slot(clinic, department))
        .filter_map(|b| b.range().ok())
        .filter_map(|range| range.intersection(window))
        .flat_map(|overlap| overlap.days())
        .collect()
}

/// Occupied days that fall inside `range`, in calendar order.
pub fn conflicting_days(
    bookings: &[Booking],
    clinic: &str,
    department: &str,
    range: &DateRange,
) -> Vec<NaiveDate> {
    let occupied = occupied_days(bookings, clinic, department, range);
    range.days().filter(|day| occupied.contains(day)).collect()
}

pub fn is_range_free(
    bookings: &[Booking],
    clinic: &str,
    department: &str,
    range: &DateRange,
) -> bool {
    conflicting_days(bookings, clinic, department, range).is_empty()
}

impl VacationService {
    #[instrument(skip(self))]
    pub async fn occupied_days(
        &self,
        clinic: &str,
        department: &str,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, VacationError> {
        let window = enumerate_days(window_start, window_end)?;
        let bookings = self.live_slot_bookings(clinic, department).await?;
        Ok(occupied_days(&bookings, clinic, department, &window))
    }

    pub async fn is_range_free(
        &self,
        clinic: &str,
        department: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool, VacationError> {
        let range = DateRange::new(start, end)?;
        let bookings = self.live_slot_bookings(clinic, department).await?;
        Ok(is_range_free(&bookings, clinic, department, &range))
    }

    /// Slot bookings minus pending requests that have outlived the expiry
    /// policy but have not been swept yet.
    async fn live_slot_bookings(
        &self,
        clinic: &str,
        department: &str,
    ) -> Result<Vec<Booking>, VacationError> {
        let today = self.clock.today();
        let mut bookings = self.repo.list_for_slot(clinic, department).await?;
        bookings.retain(|b| !self.is_stale(b, today));
        Ok(bookings)
    }
}
