use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::Client;

use quotedesk_api::middleware::auth::{Claims, StaffRole};
use quotedesk_api::routes::{self, AppContext};
use quotedesk_api::services::agency_settings::MemorySettingsStorage;
use quotedesk_api::services::export_service::PlainTextExporter;
use quotedesk_api::services::id_generator::SequentialIdGenerator;
use quotedesk_api::services::quotation_service::QuotationService;

pub const TEST_SECRET: &str = "test-secret";

/// App wired with in-memory collaborators. Routes that need MongoDB are
/// mounted but not exercised here.
pub struct TestApp {
    pub context: web::Data<AppContext>,
}

impl TestApp {
    pub fn new() -> Self {
        let context = AppContext::new(
            Arc::new(MemorySettingsStorage::new()),
            Arc::new(PlainTextExporter),
            Arc::new(SequentialIdGenerator::new()),
        );
        Self {
            context: web::Data::new(context),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody<Error = actix_web::http::Error>>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.context.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| routes::configure(cfg, TEST_SECRET))
    }
}

/// Quotation service over a client that never reaches a server. Only for
/// requests that are rejected before any query runs; anything else fails
/// with a database error after a short server selection timeout.
pub fn offline_quotations() -> web::Data<QuotationService> {
    let mut options = ClientOptions::default();
    options.hosts = vec![ServerAddress::Tcp {
        host: "127.0.0.1".to_string(),
        port: Some(9),
    }];
    options.server_selection_timeout = Some(Duration::from_millis(100));
    let client = Client::with_options(options).unwrap();
    web::Data::new(QuotationService::new(client.database("quotedesk_test")))
}

pub fn token_with(role: StaffRole, agency_id: &str, lifetime_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "agent@example.com".to_string(),
        exp: (now + lifetime_secs) as usize,
        iat: now as usize,
        user_id: "test_user_123".to_string(),
        agency_id: agency_id.to_string(),
        role,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn agent_token(agency_id: &str) -> String {
    token_with(StaffRole::Agent, agency_id, 3600)
}

pub fn admin_token(agency_id: &str) -> String {
    token_with(StaffRole::Admin, agency_id, 3600)
}
