use std::sync::Arc;

use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use log::info;
use mongodb::{options::FindOptions, Collection, Database};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{QuotationError, Result};
use crate::models::catalog::{Destination, Location};
use crate::models::custom_activity::NewCustomActivity;
use crate::models::day_selection::{DayKey, DayPatch, DaySelection, TripDates};
use crate::models::pricing::{PricingConfiguration, Totals};
use crate::models::quotation::{Quotation, QuotationItem, QuotationSubmission};
use crate::services::catalog_prices::CatalogPrices;
use crate::services::catalog_service::CatalogService;
use crate::services::id_generator::IdGenerator;
use crate::services::quotation_draft::{flatten_items, QuotationDraft};

const COLLECTION: &str = "Quotations";

/// Priced view of a submission that has not been saved.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuotationPreview {
    pub items: Vec<QuotationItem>,
    pub totals: Totals,
    pub display_totals: Totals,
    pub per_person: Option<Decimal>,
}

/// Replays a submission through the wizard and the day store so every
/// invariant is checked, leaving the draft at the review step.
pub fn draft_from_submission(
    submission: QuotationSubmission,
    destination: Destination,
    location: Location,
    ids: Arc<dyn IdGenerator>,
) -> Result<QuotationDraft> {
    let dates = TripDates::new(submission.start_date, submission.end_date)?;
    let mut draft = QuotationDraft::new(submission.client_id, dates, submission.travelers, ids)?;

    draft.select_destination(destination);
    draft.next_step()?;
    draft.select_location(location)?;
    draft.next_step()?;

    apply_selections(&mut draft, submission.days, submission.custom_activities)?;

    draft.set_itinerary(submission.itinerary)?;
    draft.next_step()?;
    Ok(draft)
}

/// Totals for a submission without touching the catalog or saving anything.
/// Prices are the client's own and only have to be within bounds.
pub fn preview_submission(
    submission: QuotationSubmission,
    pricing: &PricingConfiguration,
    ids: Arc<dyn IdGenerator>,
) -> Result<QuotationPreview> {
    let dates = TripDates::new(submission.start_date, submission.end_date)?;
    let travelers = submission.travelers;
    let mut draft = QuotationDraft::new(submission.client_id, dates, travelers, ids)?;
    apply_selections(&mut draft, submission.days, submission.custom_activities)?;

    let totals = draft.totals(pricing);
    let days = draft.store().ordered_days();
    Ok(QuotationPreview {
        items: flatten_items(&days),
        totals,
        display_totals: totals.rounded(),
        per_person: totals.per_person(travelers.paying()),
    })
}

fn apply_selections(
    draft: &mut QuotationDraft,
    days: Vec<DaySelection>,
    custom_activities: Vec<NewCustomActivity>,
) -> Result<()> {
    let mut confirmed_days = Vec::new();
    for day in days {
        let key = DayKey::Index(day.day);
        if day.confirmed {
            confirmed_days.push(key);
        }
        draft.update_day_selection(key, DayPatch::from_day(day))?;
    }

    for data in custom_activities {
        let activity = draft.add_custom_activity(data)?;
        draft.apply_custom_activity_to_own_days(&activity.id)?;
    }

    // Locks go on last so the custom activities above can still be placed.
    for key in confirmed_days {
        draft.confirm_day(key)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct QuotationService {
    db: Database,
}

impl QuotationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Quotation> {
        self.db.collection(COLLECTION)
    }

    /// Looks up every referenced catalog document, takes names and prices
    /// from the catalog, then prices the submission with the agency's
    /// configuration.
    pub async fn build(
        &self,
        agency_id: &str,
        user_id: &str,
        mut submission: QuotationSubmission,
        pricing: &PricingConfiguration,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Quotation> {
        let catalog = CatalogService::new(self.db.clone());
        let destination: Destination = catalog.get(agency_id, &submission.destination_id).await?;
        let location: Location = catalog.get(agency_id, &submission.location_id).await?;

        let prices = CatalogPrices::fetch(&catalog, agency_id, &submission.days).await?;
        for day in &mut submission.days {
            prices.reprice(day)?;
        }

        let mut draft = draft_from_submission(submission, destination, location, ids)?;
        draft.finalize(agency_id, Some(user_id.to_string()), pricing, Utc::now())
    }

    pub async fn list(&self, agency_id: &str, client_id: Option<&str>) -> Result<Vec<Quotation>> {
        let filter = match client_id {
            Some(client_id) => doc! { "agency_id": agency_id, "client_id": client_id },
            None => doc! { "agency_id": agency_id },
        };
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "created_at": -1 });
        options.limit = Some(100);

        let cursor = self.collection().find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn get(&self, agency_id: &str, id: &str) -> Result<Quotation> {
        self.collection()
            .find_one(doc! { "_id": id, "agency_id": agency_id })
            .await?
            .ok_or_else(|| QuotationError::not_found("Quotation", id))
    }

    pub async fn insert(&self, mut quotation: Quotation) -> Result<Quotation> {
        quotation.id = uuid::Uuid::new_v4().to_string();
        self.collection().insert_one(&quotation).await?;
        info!(
            "Saved quotation {} for agency {} ({} items)",
            quotation.id,
            quotation.agency_id,
            quotation.items.len()
        );
        Ok(quotation)
    }

    /// Last write wins; concurrent editors are not detected.
    pub async fn replace(&self, id: &str, mut quotation: Quotation) -> Result<Quotation> {
        let existing = self.get(&quotation.agency_id, id).await?;
        quotation.id = id.to_string();
        quotation.created_at = existing.created_at;
        quotation.created_by = existing.created_by;

        self.collection()
            .replace_one(doc! { "_id": id, "agency_id": quotation.agency_id.as_str() }, &quotation)
            .await?;
        info!("Updated quotation {} for agency {}", id, quotation.agency_id);
        Ok(quotation)
    }

    pub async fn delete(&self, agency_id: &str, id: &str) -> Result<()> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": id, "agency_id": agency_id })
            .await?;
        if result.deleted_count == 0 {
            return Err(QuotationError::not_found("Quotation", id));
        }
        Ok(())
    }
}
