use actix_web::{http::header, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::Result;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::envelope::ApiResponse;
use crate::models::pricing::PricingConfiguration;
use crate::models::quotation::QuotationSubmission;
use crate::routes::{with_agency_settings, AppContext};
use crate::services::export_service::{quotation_notes, quotation_title, ExportedDocument};
use crate::services::quotation_service::{preview_submission, QuotationService};

#[derive(Deserialize)]
pub struct ListParams {
    client_id: Option<String>,
}

async fn agency_pricing(ctx: &AppContext, agency_id: &str) -> Result<PricingConfiguration> {
    with_agency_settings(ctx, agency_id, |store| Ok(store.pricing().clone())).await
}

/*
    GET /api/quotations?client_id=
*/
pub async fn list(
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    params: web::Query<ListParams>,
) -> Result<HttpResponse> {
    let items = quotations
        .list(&user.agency_id, params.client_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(items)))
}

/*
    GET /api/quotations/{id}
*/
pub async fn get_by_id(
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let quotation = quotations.get(&user.agency_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(quotation)))
}

/*
    POST /api/quotations/preview
    Prices a submission with the agency's current pricing; nothing is saved.
*/
pub async fn preview(
    ctx: web::Data<AppContext>,
    user: AuthenticatedUser,
    input: web::Json<QuotationSubmission>,
) -> Result<HttpResponse> {
    let pricing = agency_pricing(&ctx, &user.agency_id).await?;
    let preview = preview_submission(input.into_inner(), &pricing, ctx.ids.clone())?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(preview)))
}

/*
    POST /api/quotations
*/
pub async fn create(
    ctx: web::Data<AppContext>,
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    input: web::Json<QuotationSubmission>,
) -> Result<HttpResponse> {
    let submission = input.into_inner();
    let action = format!("create:{}:{}", user.agency_id, user.user_id);
    let pricing = agency_pricing(&ctx, &user.agency_id).await?;

    // A double submit gets a 409 while the first save is still running.
    let _in_flight = ctx.saves.enter(&action)?;
    let quotation = quotations
        .build(
            &user.agency_id,
            &user.user_id,
            submission,
            &pricing,
            ctx.ids.clone(),
        )
        .await?;
    let saved = quotations.insert(quotation).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(saved)))
}

/*
    PUT /api/quotations/{id}
    Re-prices the submission with the current pricing. Last write wins.
*/
pub async fn update(
    ctx: web::Data<AppContext>,
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<QuotationSubmission>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let submission = input.into_inner();
    let action = format!("save:{}:{}", user.agency_id, id);
    let pricing = agency_pricing(&ctx, &user.agency_id).await?;

    let _in_flight = ctx.saves.enter(&action)?;
    let mut quotation = quotations
        .build(
            &user.agency_id,
            &user.user_id,
            submission,
            &pricing,
            ctx.ids.clone(),
        )
        .await?;
    quotation.updated_at = Some(Utc::now());
    let saved = quotations.replace(&id, quotation).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(saved)))
}

/*
    DELETE /api/quotations/{id}
*/
pub async fn delete(
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    quotations.delete(&user.agency_id, &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "id": id }))))
}

/*
    POST /api/quotations/{id}/export
    Responds with the rendered document as an attachment.
*/
pub async fn export(
    ctx: web::Data<AppContext>,
    quotations: web::Data<QuotationService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let quotation = quotations.get(&user.agency_id, &path.into_inner()).await?;
    let settings = with_agency_settings(&ctx, &user.agency_id, |store| Ok(store.settings().clone())).await?;
    let notes = quotation_notes(&quotation, &settings)?;
    let document = ctx.exporter.export(&quotation_title(&quotation), &notes)?;
    Ok(attachment(document))
}

fn attachment(document: ExportedDocument) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(document.content_type.as_str())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ))
        .body(document.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;

    use crate::services::export_service::DocumentExporter;

    struct StubExporter;

    impl DocumentExporter for StubExporter {
        fn export(&self, title: &str, notes: &str) -> Result<ExportedDocument> {
            Ok(ExportedDocument {
                file_name: "kerala-escape.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: format!("{}|{}", title, notes).into_bytes(),
            })
        }
    }

    #[actix_rt::test]
    async fn test_exported_document_is_sent_as_attachment() {
        let exporter: Arc<dyn DocumentExporter> = Arc::new(StubExporter);
        let document = exporter.export("Kerala Escape", "Day 1: Arrival").unwrap();

        let response = attachment(document);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"kerala-escape.pdf\""
        );

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"Kerala Escape|Day 1: Arrival");
    }
}
