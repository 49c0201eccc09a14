use std::sync::Arc;

use actix_web::{guard, web};

use crate::middleware::auth::{AuthMiddleware, StaffRole};
use crate::middleware::role_auth::RequireRole;
use crate::models::catalog::{Activity, CatalogEntity, Destination, Hotel, Location, Meal, Transport};
use crate::errors::{QuotationError, Result};
use crate::services::agency_settings::{settings_key, AgencySettingsStore, SettingsStorage};
use crate::services::export_service::DocumentExporter;
use crate::services::id_generator::IdGenerator;
use crate::services::request_guard::RequestGuard;

pub mod agency_settings;
pub mod catalog;
pub mod health;
pub mod quotation;

/// Process-wide collaborators shared by every worker.
pub struct AppContext {
    pub settings: Arc<dyn SettingsStorage>,
    pub exporter: Arc<dyn DocumentExporter>,
    pub ids: Arc<dyn IdGenerator>,
    /// Rejects a second save of the same quotation while one is running.
    pub saves: RequestGuard,
}

impl AppContext {
    pub fn new(
        settings: Arc<dyn SettingsStorage>,
        exporter: Arc<dyn DocumentExporter>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            settings,
            exporter,
            ids,
            saves: RequestGuard::new(),
        }
    }
}

/// Loads one agency's settings and runs `op` on them, off the async workers
/// since the storage may touch the filesystem.
pub async fn with_agency_settings<F, T>(ctx: &AppContext, agency_id: &str, op: F) -> Result<T>
where
    F: FnOnce(&mut AgencySettingsStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = ctx.settings.clone();
    let key = settings_key(agency_id);
    web::block(move || op(&mut AgencySettingsStore::load(storage, key)))
        .await
        .map_err(|e| QuotationError::Storage(format!("settings task failed: {}", e)))?
}

fn catalog_scope<T: CatalogEntity>(path: &str) -> actix_web::Scope {
    web::scope(path)
        .route("", web::get().to(catalog::list::<T>))
        .route("", web::post().to(catalog::create::<T>))
        .route("/{id}", web::get().to(catalog::get::<T>))
        .route("/{id}", web::put().to(catalog::update::<T>))
        .route("/{id}", web::delete().to(catalog::delete::<T>))
}

/// Mounts the whole `/api` tree. Everything but `/api/health` needs a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig, jwt_secret: &str) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("")
                    .wrap(AuthMiddleware::new(jwt_secret))
                    .service(
                        web::scope("/catalog")
                            .service(catalog_scope::<Hotel>("/hotels"))
                            .service(catalog_scope::<Transport>("/transports"))
                            .service(catalog_scope::<Meal>("/meals"))
                            .service(catalog_scope::<Activity>("/activities"))
                            .service(catalog_scope::<Destination>("/destinations"))
                            .service(catalog_scope::<Location>("/locations")),
                    )
                    .service(
                        web::scope("/quotations")
                            .route("", web::get().to(quotation::list))
                            .route("", web::post().to(quotation::create))
                            .route("/preview", web::post().to(quotation::preview))
                            .route("/{id}", web::get().to(quotation::get_by_id))
                            .route("/{id}", web::put().to(quotation::update))
                            .route("/{id}", web::delete().to(quotation::delete))
                            .route("/{id}/export", web::post().to(quotation::export)),
                    )
                    .service(
                        web::scope("/agency")
                            // Writes are admin only; reads fall through to the route below.
                            .service(
                                web::scope("/settings")
                                    .guard(guard::Put())
                                    .wrap(RequireRole::new(StaffRole::Admin))
                                    .route("", web::put().to(agency_settings::update))
                                    .route("/pricing", web::put().to(agency_settings::update_pricing)),
                            )
                            .route("/settings", web::get().to(agency_settings::get)),
                    ),
            ),
    );
}
