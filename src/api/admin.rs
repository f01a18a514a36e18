use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::vacation::{AdminFilter, DecisionOutcome, VacationError, VacationService};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    #[schema(example = "rejected")]
    pub status: DecisionOutcome,
    /// Required when rejecting.
    #[serde(default)]
    #[schema(example = "Two colleagues already off that week")]
    pub rejection_reason: Option<String>,
}

/// List vacation requests for review, newest first
#[utoipa::path(
    get,
    path = "/api/admin/vacation-requests",
    params(AdminFilter),
    responses(
        (status = 200, description = "Requests joined with their owner's balance", body = Vec<AdminBookingView>)
    ),
    tag = "Admin"
)]
pub async fn list_requests(
    service: web::Data<VacationService>,
    filter: web::Query<AdminFilter>,
) -> Result<HttpResponse, VacationError> {
    let rows = service.list_for_admin(&filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Approve or reject a pending vacation request
#[utoipa::path(
    put,
    path = "/api/admin/vacation-requests/{booking_id}",
    params(
        ("booking_id" = u64, Path, description = "ID of the vacation request")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = AdminBookingView),
        (status = 400, description = "Rejection without a reason", body = Object, example = json!({
            "error": "REASON_REQUIRED",
            "message": "a rejection reason is required for booking 7",
            "details": { "bookingId": 7 }
        })),
        (status = 404, description = "Vacation request not found"),
        (status = 409, description = "Already decided or the balance no longer covers it", body = Object, example = json!({
            "error": "ALREADY_DECIDED",
            "message": "booking 7 was already approved",
            "details": { "bookingId": 7, "status": "approved" }
        }))
    ),
    tag = "Admin"
)]
pub async fn decide_request(
    service: web::Data<VacationService>,
    path: web::Path<u64>,
    payload: web::Json<DecisionRequest>,
) -> Result<HttpResponse, VacationError> {
    let booking_id = path.into_inner();
    let DecisionRequest {
        status,
        rejection_reason,
    } = payload.into_inner();

    let view = service
        .decide(booking_id, status, rejection_reason.as_deref())
        .await?;
    info!(booking_id, status = %view.status, "Admin decision applied");
    Ok(HttpResponse::Ok().json(view))
}
