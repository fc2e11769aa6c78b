use crate::api::employee::{EmployeeListResponse, EmployeeQuery, MeResponse};
use crate::api::ledger::{BatchQuery, BatchState, RegisterBatch};
use crate::api::organization::{CreateOrganization, OrganizationPath, SetManager};
use crate::api::pay_item::{CreatePayItem, SetActive};
use crate::api::position::CreatePosition;
use crate::api::standard::{StandardChange, SubmitStandard};
use crate::auth::auth::AuthUser;
use crate::model::{
    employee::Employee, organization::Organization, pay_item::PayItem,
    payment_line::PaymentLine, position::Position, review_state::ReviewState, role::Role,
};
use crate::service::hierarchy::{Supervisor, Supervisors};
use crate::service::ledger::{
    BatchDetail, BatchPage, BatchSummary, EmployeeInput, EmployeePay, RegisterOutcome,
};
use crate::service::standard::{ResolvedStandard, StandardEntry, StandardItemInput, StandardStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pay Ledger API",
        version = "0.1.0",
        description = r#"
## Compensation Ledger

Versioned pay standards per position, a three-level organization tree, and
monthly payment batches with a review workflow.

### 🔹 Key Features
- **Organization tree**
  - Units on three levels, managers, root-to-leaf paths
- **Pay standards**
  - Versioned amounts per position and pay item, latest approved wins
- **Ledger**
  - One batch per organization and month, reviewed as a whole

### 🔐 Security
Every endpoint expects a **JWT Bearer** access token from the identity provider.
Employees who manage a unit act as **Boss** over that unit's subtree.

### 📦 Response Format
- JSON bodies; errors carry a stable `kind` and a `message`
- Pagination on the batch list
"#,
    ),
    paths(
        crate::api::organization::create_organization,
        crate::api::organization::list_organizations,
        crate::api::organization::organization_path,
        crate::api::organization::set_manager,
        crate::api::organization::delete_organization,

        crate::api::position::create_position,
        crate::api::position::supervisors,
        crate::api::position::delete_position,

        crate::api::pay_item::create_pay_item,
        crate::api::pay_item::list_pay_items,
        crate::api::pay_item::set_active,
        crate::api::pay_item::delete_pay_item,

        crate::api::standard::submit_standard,
        crate::api::standard::resolve_standard,
        crate::api::standard::standard_status,
        crate::api::standard::approve_standard,
        crate::api::standard::reject_standard,
        crate::api::standard::withdraw_standard,

        crate::api::ledger::register_batch,
        crate::api::ledger::list_batches,
        crate::api::ledger::batch_detail,
        crate::api::ledger::approve_batch,
        crate::api::ledger::reject_batch,
        crate::api::ledger::withdraw_batch,

        crate::api::employee::list_employees,
        crate::api::employee::me
    ),
    components(
        schemas(
            Organization,
            CreateOrganization,
            SetManager,
            OrganizationPath,
            Position,
            CreatePosition,
            Supervisor,
            Supervisors,
            PayItem,
            CreatePayItem,
            SetActive,
            SubmitStandard,
            StandardItemInput,
            StandardChange,
            ResolvedStandard,
            StandardStatus,
            StandardEntry,
            ReviewState,
            RegisterBatch,
            EmployeeInput,
            RegisterOutcome,
            BatchQuery,
            BatchState,
            BatchPage,
            BatchSummary,
            BatchDetail,
            EmployeePay,
            PaymentLine,
            Employee,
            EmployeeQuery,
            EmployeeListResponse,
            MeResponse,
            AuthUser,
            Role
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Organization", description = "Organization tree APIs"),
        (name = "Position", description = "Position and supervisor APIs"),
        (name = "Pay Item", description = "Pay item catalog APIs"),
        (name = "Standard", description = "Pay standard APIs"),
        (name = "Ledger", description = "Payment batch APIs"),
        (name = "Employee", description = "Down-line and caller APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
