use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use log::error;
use mongodb::Database;
use serde::Serialize;

use crate::db::mongo;
use crate::errors::QuotationError;
use crate::routes::AppContext;
use crate::services::agency_settings::SettingsStorage;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(db: web::Data<Database>, ctx: web::Data<AppContext>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&db).await;
    let settings_result = check_settings_storage(&ctx).await;
    if mongo_result.status != "ok" || settings_result.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("mongodb".to_string(), mongo_result);
    health
        .services
        .insert("settings_storage".to_string(), settings_result);

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(db: &Database) -> ServiceStatus {
    match mongo::ping(db).await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("Connected to database {}", db.name())),
        },
        Err(e) => {
            error!("MongoDB health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Failed to reach MongoDB".to_string()),
            }
        }
    }
}

async fn check_settings_storage(ctx: &AppContext) -> ServiceStatus {
    let storage = ctx.settings.clone();
    let outcome = web::block(move || storage.read("health"))
        .await
        .map_err(|e| QuotationError::Storage(e.to_string()))
        .and_then(|read| read);
    match outcome {
        Ok(_) => ServiceStatus {
            status: "ok".to_string(),
            details: None,
        },
        Err(e) => {
            error!("Settings storage health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some("Settings storage is unreadable".to_string()),
            }
        }
    }
}
