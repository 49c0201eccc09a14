use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::errors::QuotationError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::catalog::CatalogEntity;
use crate::models::envelope::ApiResponse;
use crate::services::catalog_service::CatalogService;

#[derive(Deserialize)]
pub struct QueryParams {
    limit: Option<u16>,
    search: Option<String>,
}

/*
    GET /api/catalog/{kind}?search=&limit=
*/
pub async fn list<T: CatalogEntity>(
    catalog: web::Data<CatalogService>,
    user: AuthenticatedUser,
    params: web::Query<QueryParams>,
) -> Result<HttpResponse, QuotationError> {
    let items: Vec<T> = catalog
        .list(&user.agency_id, params.search.as_deref(), params.limit)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/*
    GET /api/catalog/{kind}/{id}
*/
pub async fn get<T: CatalogEntity>(
    catalog: web::Data<CatalogService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, QuotationError> {
    let item: T = catalog.get(&user.agency_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

/*
    POST /api/catalog/{kind}
*/
pub async fn create<T: CatalogEntity>(
    catalog: web::Data<CatalogService>,
    user: AuthenticatedUser,
    input: web::Json<T>,
) -> Result<HttpResponse, QuotationError> {
    let item = catalog.create(&user.agency_id, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(item)))
}

/*
    PUT /api/catalog/{kind}/{id}
*/
pub async fn update<T: CatalogEntity>(
    catalog: web::Data<CatalogService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<T>,
) -> Result<HttpResponse, QuotationError> {
    let item = catalog
        .update(&user.agency_id, &path.into_inner(), input.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

/*
    DELETE /api/catalog/{kind}/{id}
*/
pub async fn delete<T: CatalogEntity>(
    catalog: web::Data<CatalogService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, QuotationError> {
    let id = path.into_inner();
    catalog.delete::<T>(&user.agency_id, &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "id": id }))))
}
