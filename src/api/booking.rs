use actix_web::{HttpResponse, web};
use tracing::info;

use crate::vacation::{BookingCandidate, VacationError, VacationService};

/// Dry-run a vacation request
///
/// Runs every booking check without storing anything. A later submission
/// re-checks against the state at that moment.
#[utoipa::path(
    post,
    path = "/api/vacation-bookings/check",
    request_body = BookingCandidate,
    responses(
        (status = 200, description = "Request would be accepted", body = ValidatedRange),
        (status = 400, description = "Wrong clinic/department, bad date order or outside the booking window", body = Object, example = json!({
            "error": "OUT_OF_HORIZON",
            "message": "2026-04-01..2026-04-03 is outside the booking window starting 2026-01-01 and ending before 2026-03-01",
            "details": {
                "startDate": "2026-04-01",
                "endDate": "2026-04-03",
                "horizonStart": "2026-01-01",
                "horizonEnd": "2026-03-01"
            }
        })),
        (status = 404, description = "No employee with that email"),
        (status = 409, description = "Not enough balance or the days are taken", body = Object, example = json!({
            "error": "INSUFFICIENT_BALANCE",
            "message": "requested 3 vacation days but only 2 remaining",
            "details": { "requested": 3, "available": 2 }
        }))
    ),
    tag = "Booking"
)]
pub async fn check_booking(
    service: web::Data<VacationService>,
    payload: web::Json<BookingCandidate>,
) -> Result<HttpResponse, VacationError> {
    let validated = service.precheck(&payload).await?;
    Ok(HttpResponse::Ok().json(validated))
}

/// Submit a vacation request
///
/// Stores a pending request. The balance is charged only when an admin
/// approves it.
#[utoipa::path(
    post,
    path = "/api/vacation-bookings",
    request_body = BookingCandidate,
    responses(
        (status = 201, description = "Request stored as pending", body = BookingReceipt),
        (status = 400, description = "Wrong clinic/department, bad date order or outside the booking window"),
        (status = 404, description = "No employee with that email"),
        (status = 409, description = "Not enough balance or the days are taken", body = Object, example = json!({
            "error": "DATE_RANGE_CONFLICT",
            "message": "date range overlaps an existing booking from 2026-01-06",
            "details": { "firstConflict": "2026-01-06", "conflictingDates": ["2026-01-06", "2026-01-07"] }
        })),
        (status = 429, description = "Too many requests")
    ),
    tag = "Booking"
)]
pub async fn create_booking(
    service: web::Data<VacationService>,
    payload: web::Json<BookingCandidate>,
) -> Result<HttpResponse, VacationError> {
    let receipt = service.submit(&payload).await?;
    info!(booking_id = receipt.booking.id, "Booking created via API");
    Ok(HttpResponse::Created().json(receipt))
}
