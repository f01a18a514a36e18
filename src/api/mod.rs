pub mod admin;
pub mod availability;
pub mod booking;
pub mod employee;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, error, web};
use serde_json::json;
use tracing::error;

use crate::vacation::VacationError;

impl ResponseError for VacationError {
    fn status_code(&self) -> StatusCode {
        match self {
            VacationError::EmployeeNotFound { .. } | VacationError::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            VacationError::ClinicMismatch { .. }
            | VacationError::DepartmentMismatch { .. }
            | VacationError::InvalidDateOrder { .. }
            | VacationError::OutOfHorizon { .. }
            | VacationError::ReasonRequired { .. } => StatusCode::BAD_REQUEST,
            VacationError::InsufficientBalance { .. }
            | VacationError::DateRangeConflict { .. }
            | VacationError::AlreadyDecided { .. } => StatusCode::CONFLICT,
            VacationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let VacationError::Store(e) = self {
            error!(error = %e, "Store failure");
            return HttpResponse::InternalServerError().json(json!({
                "error": self.kind(),
                "message": "Something went wrong, Contact with system admin",
                "details": {}
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
            "details": self.details(),
        }))
    }
}

fn bad_request(message: String) -> actix_web::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(json!({
            "error": "INVALID_REQUEST",
            "message": message,
            "details": {}
        })),
    )
    .into()
}

/// Malformed bodies get the same error shape as domain failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| bad_request(err.to_string()))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string()))
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| bad_request(err.to_string()))
}
