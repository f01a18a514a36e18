use crate::api::admin::DecisionRequest;
use crate::api::availability::UnavailableDatesResponse;
use crate::model::booking::{Booking, BookingStatus};
use crate::vacation::{
    AdminBookingView, AdminFilter, BookingCandidate, BookingReceipt, DecisionOutcome,
    EmployeeProfile, ValidatedRange,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clinic Vacation API",
        version = "1.0.0",
        description = r#"
## Clinic Vacation Booking

Employees request vacation inside a rolling booking window. Within one
clinic and department only one person may be away on any given day.

### 🔹 Key Features
- **Availability**
  - Days already taken per clinic and department
- **Booking**
  - Dry-run checks and pending submissions
- **Admin review**
  - Approve or reject pending requests with a reason

### 📦 Response Format
- JSON with camelCase fields, dates as `YYYY-MM-DD`
- Failures carry `error`, `message` and `details`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::get_employee,

        crate::api::availability::unavailable_dates,

        crate::api::booking::check_booking,
        crate::api::booking::create_booking,

        crate::api::admin::list_requests,
        crate::api::admin::decide_request
    ),
    components(
        schemas(
            EmployeeProfile,
            UnavailableDatesResponse,
            BookingCandidate,
            ValidatedRange,
            BookingReceipt,
            Booking,
            BookingStatus,
            AdminBookingView,
            AdminFilter,
            DecisionOutcome,
            DecisionRequest
        )
    ),
    tags(
        (name = "Employee", description = "Employee lookup"),
        (name = "Availability", description = "Department calendar"),
        (name = "Booking", description = "Vacation requests"),
        (name = "Admin", description = "Vacation request review"),
    )
)]
pub struct ApiDoc;
