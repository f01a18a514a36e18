use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::vacation::{VacationError, VacationService};

/// Employee profile and balance, looked up by work email
#[utoipa::path(
    get,
    path = "/api/employees/{email}",
    params(
        ("email" = String, Path, description = "Work email of the employee", example = "jane.doe@clinic.example")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeProfile),
        (status = 404, description = "No employee with that email", body = Object, example = json!({
            "error": "EMPLOYEE_NOT_FOUND",
            "message": "no employee found for nobody@clinic.example",
            "details": { "identity": "nobody@clinic.example" }
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    service: web::Data<VacationService>,
    path: web::Path<String>,
) -> Result<HttpResponse, VacationError> {
    let email = path.into_inner();
    let profile = service.employee_profile(&email).await?;
    debug!(employee_id = profile.id, "Employee profile served");
    Ok(HttpResponse::Ok().json(profile))
}
