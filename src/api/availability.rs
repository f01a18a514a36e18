use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::utils::calendar::deserialize_optional_calendar_day;
use crate::vacation::{VacationError, VacationService};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UnavailableDatesQuery {
    #[param(example = "clinic1")]
    pub clinic: String,
    #[param(example = "dept1")]
    pub department: String,
    /// First day of the window. Defaults to today.
    #[serde(default, deserialize_with = "deserialize_optional_calendar_day")]
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the window, inclusive. Defaults to the end of the booking
    /// horizon.
    #[serde(default, deserialize_with = "deserialize_optional_calendar_day")]
    #[param(value_type = Option<String>, example = "2026-02-28")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableDatesResponse {
    #[schema(value_type = Vec<String>, example = json!(["2026-01-05", "2026-01-06"]))]
    pub unavailable_dates: Vec<NaiveDate>,
}

/// Days already taken in a clinic+department
#[utoipa::path(
    get,
    path = "/api/unavailable-dates",
    params(UnavailableDatesQuery),
    responses(
        (status = 200, description = "Occupied days in calendar order", body = UnavailableDatesResponse),
        (status = 400, description = "Window end before its start", body = Object, example = json!({
            "error": "INVALID_DATE_ORDER",
            "message": "end date 2026-01-01 must be on or after start date 2026-02-01",
            "details": { "startDate": "2026-02-01", "endDate": "2026-01-01" }
        }))
    ),
    tag = "Availability"
)]
pub async fn unavailable_dates(
    service: web::Data<VacationService>,
    query: web::Query<UnavailableDatesQuery>,
) -> Result<HttpResponse, VacationError> {
    let query = query.into_inner();
    let horizon = service.horizon().window();
    let start = query.start_date.unwrap_or(horizon.start());
    let end = query.end_date.unwrap_or(horizon.end());

    let unavailable_dates = service
        .unavailable_days(&query.clinic, &query.department, start, end)
        .await?;
    Ok(HttpResponse::Ok().json(UnavailableDatesResponse { unavailable_dates }))
}
