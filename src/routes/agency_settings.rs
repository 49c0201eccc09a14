use actix_web::{web, HttpResponse};

use crate::errors::Result;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::envelope::ApiResponse;
use crate::models::pricing::{AgencySettingsPatch, PricingPatch};
use crate::routes::{with_agency_settings, AppContext};

/*
    GET /api/agency/settings
*/
pub async fn get(ctx: web::Data<AppContext>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let settings = with_agency_settings(&ctx, &user.agency_id, |store| Ok(store.settings().clone())).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/*
    PUT /api/agency/settings (admin)
*/
pub async fn update(
    ctx: web::Data<AppContext>,
    user: AuthenticatedUser,
    input: web::Json<AgencySettingsPatch>,
) -> Result<HttpResponse> {
    let patch = input.into_inner();
    let settings = with_agency_settings(&ctx, &user.agency_id, move |store| {
        store.update_agency_settings(patch).cloned()
    })
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/*
    PUT /api/agency/settings/pricing (admin)
*/
pub async fn update_pricing(
    ctx: web::Data<AppContext>,
    user: AuthenticatedUser,
    input: web::Json<PricingPatch>,
) -> Result<HttpResponse> {
    let patch = input.into_inner();
    let pricing = with_agency_settings(&ctx, &user.agency_id, move |store| {
        store.update_pricing(patch).cloned()
    })
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(pricing)))
}
