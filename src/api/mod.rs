pub mod blogs;
pub mod donation_requests;
pub mod funding;
pub mod health;
pub mod payments;
pub mod swagger;
pub mod users;

use crate::middleware::AuthMiddleware;
use crate::utils::error::AppError;
use actix_web::{guard, web};
use serde::Deserialize;

/// `?email=`
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// `?status=`
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Every route of the service. Protected resources carry `AuthMiddleware`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(health::root))
    .route("/health", web::get().to(health::health_check))
    .route("/api-docs/openapi.json", web::get().to(swagger::openapi_json))
    // ==================== USERS ====================
    // Registration is public; the rest of /users needs a token.
    .service(
        web::resource("/users")
            .guard(guard::Post())
            .route(web::post().to(users::register_user)),
    )
    .service(
        web::resource("/users")
            .wrap(AuthMiddleware)
            .route(web::get().to(users::list_users))
            .route(web::patch().to(users::update_user)),
    )
    .service(
        web::resource("/users/email")
            .wrap(AuthMiddleware)
            .route(web::get().to(users::get_user_by_email)),
    )
    .service(
        web::resource("/users/{email}/role")
            .wrap(AuthMiddleware)
            .route(web::get().to(users::get_user_role)),
    )
    .route("/search-donors", web::get().to(users::search_donors))
    // ==================== DONATION REQUESTS ====================
    .service(
        web::resource("/donation-requests")
            .wrap(AuthMiddleware)
            .route(web::post().to(donation_requests::create_donation_request))
            .route(web::get().to(donation_requests::list_donation_requests)),
    )
    .service(
        web::resource("/donation-requests/email")
            .wrap(AuthMiddleware)
            .route(web::get().to(donation_requests::list_my_donation_requests)),
    )
    .route(
        "/donation-requests/status",
        web::get().to(donation_requests::list_donation_requests_by_status),
    )
    // Must stay after /email and /status
    .service(
        web::resource("/donation-requests/{id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(donation_requests::get_donation_request))
            .route(web::patch().to(donation_requests::update_donation_request))
            .route(web::delete().to(donation_requests::delete_donation_request)),
    )
    // ==================== BLOGS ====================
    .service(
        web::resource("/blogs")
            .route(web::post().to(blogs::create_blog))
            .route(web::get().to(blogs::list_blogs)),
    )
    .route("/blogs/{id}", web::get().to(blogs::get_blog))
    // ==================== FUNDING & PAYMENTS ====================
    .service(
        web::resource("/funding")
            .wrap(AuthMiddleware)
            .route(web::post().to(funding::create_funding))
            .route(web::get().to(funding::list_funding)),
    )
    .service(
        web::resource("/create-checkout-session")
            .wrap(AuthMiddleware)
            .route(web::post().to(payments::create_checkout_session)),
    )
    .route(
        "/verify-checkout-session/{session_id}",
        web::get().to(payments::verify_checkout_session),
    );
}

#[cfg(test)]
mod tests {
    use crate::testing::{bearer, paid_session, test_app, test_state, FakePayments};
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_health_and_banner() {
        let app = test_app!(test_state(FakePayments::default())).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_openapi_document_is_served() {
        let app = test_app!(test_state(FakePayments::default())).await;
        let req = test::TestRequest::get().uri("/api-docs/openapi.json").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert!(body["paths"]["/health"].is_object());
        assert!(body["paths"]["/create-checkout-session"].is_object());
    }

    #[actix_web::test]
    async fn test_protected_routes_need_a_token() {
        let app = test_app!(test_state(FakePayments::default())).await;

        for (method, uri) in [
            ("GET", "/users"),
            ("GET", "/users/email?email=a@example.com"),
            ("GET", "/donation-requests"),
            ("POST", "/funding"),
            ("POST", "/create-checkout-session"),
        ] {
            let req = match method {
                "GET" => test::TestRequest::get(),
                _ => test::TestRequest::post(),
            }
            .uri(uri)
            .to_request();

            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);

            let body: Value = test::read_body_json(res).await;
            assert_eq!(body["error"], "Unauthorized Access!");
        }

        let req = test::TestRequest::get()
            .uri("/users/email?email=a@example.com")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_register_then_fetch_self() {
        let app = test_app!(test_state(FakePayments::default())).await;

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "email": "rahim@example.com", "district": "Dhaka" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["inserted"], true);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "email": "rahim@example.com" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["inserted"], false);
        assert_eq!(body["message"], "User already exists");

        let req = test::TestRequest::get()
            .uri("/users/email?email=rahim@example.com")
            .insert_header(bearer("rahim@example.com"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["district"], "Dhaka");
        assert_eq!(body["role"], "donor");

        let req = test::TestRequest::get()
            .uri("/users/rahim@example.com/role")
            .insert_header(bearer("karim@example.com"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_search_donors_requires_a_filter() {
        let app = test_app!(test_state(FakePayments::default())).await;

        let req = test::TestRequest::get().uri("/search-donors").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/search-donors?bloodGroup=AB%2B").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn test_donation_request_flow() {
        let app = test_app!(test_state(FakePayments::default())).await;

        let req = test::TestRequest::post()
            .uri("/donation-requests")
            .insert_header(bearer("owner@example.com"))
            .set_json(json!({ "recipientName": "Ayesha", "bloodGroup": "O+" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        let id = body["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/donation-requests/status?status=pending")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["_id"], id.as_str());
        assert_eq!(body[0]["requesterEmail"], "owner@example.com");

        let req = test::TestRequest::get()
            .uri(&format!("/donation-requests/{}", id))
            .insert_header(bearer("stranger@example.com"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Forbidden!");

        let req = test::TestRequest::patch()
            .uri(&format!("/donation-requests/{}", id))
            .insert_header(bearer("owner@example.com"))
            .set_json(json!({ "status": "inprogress" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/donation-requests/not-an-id")
            .insert_header(bearer("owner@example.com"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_blogs_are_public() {
        let app = test_app!(test_state(FakePayments::default())).await;

        let req = test::TestRequest::post()
            .uri("/blogs")
            .set_json(json!({ "title": "Give blood", "content": "..." }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["insertedId"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&format!("/blogs/{}", id)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "Give blood");

        let req = test::TestRequest::get().uri("/blogs?page=1&limit=5").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["limit"], 5);

        for uri in ["/blogs?page=-1", "/blogs?page=0&limit=-5"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
            let body: Value = test::read_body_json(res).await;
            assert_eq!(body["page"], 1);
            assert_eq!(body["data"][0]["title"], "Give blood");
        }

        let req = test::TestRequest::get()
            .uri("/blogs?page=9223372036854775807&limit=50")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"], json!([]));
    }

    #[actix_web::test]
    async fn test_checkout_provider_failure_is_reported() {
        let app = test_app!(test_state(FakePayments::rejecting("Invalid API Key provided"))).await;

        let req = test::TestRequest::post()
            .uri("/create-checkout-session")
            .insert_header(bearer("rahim@example.com"))
            .set_json(json!({ "amount": 5 }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid API Key provided");
    }

    #[actix_web::test]
    async fn test_checkout_and_verify() {
        let payments = FakePayments::with_session(paid_session("cs_9", "pi_9", 4200));
        let app = test_app!(test_state(payments)).await;

        let req = test::TestRequest::post()
            .uri("/create-checkout-session")
            .insert_header(bearer("rahim@example.com"))
            .set_json(json!({ "amount": -3 }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/create-checkout-session")
            .insert_header(bearer("rahim@example.com"))
            .set_json(json!({ "amount": 42 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["url"].as_str().unwrap().starts_with("https://"));

        for expected in [true, false] {
            let req = test::TestRequest::get()
                .uri("/verify-checkout-session/cs_9")
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["inserted"], expected);
            assert_eq!(body["record"]["amount"], 42.0);
            assert_eq!(body["record"]["trackingId"], "cs_9");
        }

        let req = test::TestRequest::get()
            .uri("/funding")
            .insert_header(bearer("rahim@example.com"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["limit"], 5);
    }
}
