use actix_web::{HttpResponse, Responder};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RedPulse API",
        version = "1.0.0",
        description = "Blood donation platform backend. \n\n**Authentication:** protected endpoints take an identity-provider ID token as `Authorization: Bearer <token>`.\n\n**Features:**\n- Donor registration and search\n- Donation requests\n- Blogs\n- Funding through hosted checkout"
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Users
        crate::api::users::register_user,

        // Funding & payments
        crate::api::funding::create_funding,
        crate::api::payments::create_checkout_session,
        crate::api::payments::verify_checkout_session,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::RegisterUserResponse,
            crate::models::CreateFundingRequest,
            crate::models::FundingResponse,
            crate::models::FundingWriteResponse,
            crate::api::payments::CheckoutSessionRequest,
            crate::services::payment_service::CheckoutSessionCreated,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and health endpoints."),
        (name = "Users", description = "Registration and profile management."),
        (name = "Funding", description = "Contributions recorded for the platform."),
        (name = "Payments", description = "Hosted checkout and payment reconciliation."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity-provider ID token"))
                        .build(),
                ),
            );
        }
    }
}

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
