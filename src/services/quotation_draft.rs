//! The quotation being assembled: wizard position, per-day selections,
//! custom activities and itinerary text, plus memoized totals.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::{QuotationError, Result};
use crate::models::catalog::{Destination, Location};
use crate::models::custom_activity::{CustomActivity, NewCustomActivity};
use crate::models::day_selection::{
    DayKey, DayListField, DayPatch, DaySelection, Occupancy, RoomSelection, TripDates,
};
use crate::models::pricing::{PricingConfiguration, Totals};
use crate::models::quotation::{
    DestinationRef, ItineraryDay, LocationRef, Quotation, QuotationItem, ServiceType,
    TravelerCounts,
};
use crate::services::custom_activity_registry::CustomActivityRegistry;
use crate::services::id_generator::IdGenerator;
use crate::services::pricing_service::PricingService;
use crate::services::request_guard::{RequestGuard, RequestTicket};
use crate::services::selection_store::DaySelectionStore;
use crate::services::wizard::{WizardController, WizardStep};

struct CachedTotals {
    revision: u64,
    pricing: PricingConfiguration,
    totals: Totals,
}

pub struct QuotationDraft {
    client_id: String,
    travelers: TravelerCounts,
    wizard: WizardController,
    store: DaySelectionStore,
    registry: CustomActivityRegistry,
    itinerary: Vec<ItineraryDay>,
    requests: RequestGuard,
    cached: Option<CachedTotals>,
}

impl QuotationDraft {
    pub fn new(
        client_id: impl Into<String>,
        dates: TripDates,
        travelers: TravelerCounts,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(QuotationError::validation("client_id", "Select a client"));
        }
        travelers.validate()?;
        Ok(Self {
            client_id,
            travelers,
            wizard: WizardController::new(),
            store: DaySelectionStore::new(dates),
            registry: CustomActivityRegistry::new(ids),
            itinerary: Vec::new(),
            requests: RequestGuard::new(),
            cached: None,
        })
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    pub fn store(&self) -> &DaySelectionStore {
        &self.store
    }

    pub fn registry(&self) -> &CustomActivityRegistry {
        &self.registry
    }

    pub fn select_destination(&mut self, destination: Destination) {
        self.wizard.record_destination(destination);
    }

    pub fn select_location(&mut self, location: Location) -> Result<()> {
        self.wizard.record_location(location)
    }

    /// Navigation invalidates in-flight requests issued for the old step.
    pub fn next_step(&mut self) -> Result<WizardStep> {
        let step = self.wizard.next_step()?;
        self.requests.invalidate();
        Ok(step)
    }

    pub fn prev_step(&mut self) -> WizardStep {
        self.requests.invalidate();
        self.wizard.prev_step()
    }

    /// After a catalog lookup reports a missing entity, steps back to where it
    /// can be chosen again. Other errors leave the wizard where it is.
    pub fn recover(&mut self, error: &QuotationError) -> WizardStep {
        if let QuotationError::NotFound { entity, .. } = error {
            self.requests.invalidate();
            return self.wizard.recover_from_not_found(entity);
        }
        self.wizard.step()
    }

    pub fn update_day_selection(&mut self, key: DayKey, patch: DayPatch) -> Result<&DaySelection> {
        self.store.update_day_selection(key, patch)
    }

    pub fn get_day_selection(&self, key: DayKey) -> Result<DaySelection> {
        self.store.get_day_selection(key)
    }

    pub fn remove_from_day(&mut self, key: DayKey, field: DayListField, item_id: &str) -> Result<()> {
        self.store.remove_from_day(key, field, item_id)
    }

    pub fn update_room_occupancy(
        &mut self,
        key: DayKey,
        room_id: &str,
        room_count: u32,
        occupancy: Occupancy,
    ) -> Result<&RoomSelection> {
        self.store.update_room_occupancy(key, room_id, room_count, occupancy)
    }

    pub fn confirm_room(&mut self, key: DayKey, room_id: &str, at: DateTime<Utc>) -> Result<&RoomSelection> {
        self.store.confirm_room(key, room_id, at)
    }

    pub fn confirm_day(&mut self, key: DayKey) -> Result<()> {
        self.store.confirm_day(key)
    }

    pub fn unconfirm_day(&mut self, key: DayKey) -> Result<()> {
        self.store.unconfirm_day(key)
    }

    pub fn add_custom_activity(&mut self, data: NewCustomActivity) -> Result<CustomActivity> {
        self.registry.add_custom_activity(data)
    }

    pub fn apply_custom_activity(&mut self, id: &str, days: &[DayKey]) -> Result<Vec<String>> {
        self.registry.apply_to_days(id, days, &mut self.store)
    }

    pub fn apply_custom_activity_to_own_days(&mut self, id: &str) -> Result<Vec<String>> {
        self.registry.apply_to_own_days(id, &mut self.store)
    }

    pub fn set_itinerary(&mut self, mut itinerary: Vec<ItineraryDay>) -> Result<()> {
        let dates = self.store.dates();
        for entry in &itinerary {
            dates.resolve(DayKey::Index(entry.day))?;
            if entry.title.trim().is_empty() {
                return Err(QuotationError::validation(
                    "itinerary",
                    format!("Day {} needs a title", entry.day),
                ));
            }
        }
        itinerary.sort_by_key(|entry| entry.day);
        self.itinerary = itinerary;
        Ok(())
    }

    pub fn itinerary(&self) -> &[ItineraryDay] {
        &self.itinerary
    }

    pub fn begin_request(&self, action: &str) -> Result<RequestTicket> {
        self.requests.begin(action)
    }

    /// True when the response for `ticket` may still be applied.
    pub fn accept_response(&self, ticket: &RequestTicket) -> bool {
        self.requests.complete(ticket)
    }

    /// Recomputed only when the selections or the pricing changed.
    pub fn totals(&mut self, pricing: &PricingConfiguration) -> Totals {
        let revision = self.store.revision();
        if let Some(cached) = &self.cached {
            if cached.revision == revision && &cached.pricing == pricing {
                return cached.totals;
            }
        }
        let totals = PricingService::compute_totals(self.store.selections(), pricing);
        self.cached = Some(CachedTotals {
            revision,
            pricing: pricing.clone(),
            totals,
        });
        totals
    }

    /// Produces the persistable quotation. Only allowed from the review step.
    pub fn finalize(
        &mut self,
        agency_id: &str,
        created_by: Option<String>,
        pricing: &PricingConfiguration,
        now: DateTime<Utc>,
    ) -> Result<Quotation> {
        if !self.wizard.is_at_review() {
            return Err(QuotationError::invariant(
                "Review the quotation before saving it",
            ));
        }
        let destination = self.wizard.destination().ok_or_else(|| {
            QuotationError::invariant("Choose a destination before saving")
        })?;
        let location = self
            .wizard
            .location()
            .ok_or_else(|| QuotationError::invariant("Choose a location before saving"))?;

        let destination = DestinationRef {
            id: destination.meta.id.clone(),
            name: destination.name.clone(),
            region: destination.region,
        };
        let location = LocationRef {
            id: location.meta.id.clone(),
            name: location.name.clone(),
        };
        let days = self.store.ordered_days();
        if days.iter().all(DaySelection::is_empty) {
            return Err(QuotationError::invariant(
                "Add at least one hotel, meal, transport or activity before saving",
            ));
        }
        let items = flatten_items(&days);
        let totals = self.totals(pricing);

        Ok(Quotation {
            id: String::new(),
            agency_id: agency_id.to_string(),
            client_id: self.client_id.clone(),
            destination,
            location,
            dates: self.store.dates(),
            travelers: self.travelers,
            days,
            itinerary: self.itinerary.clone(),
            custom_activities: self.registry.list().to_vec(),
            items,
            pricing: pricing.clone(),
            totals,
            total_amount: totals.rounded().grand_total,
            created_by,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }
}

/// Flat service lines, one per room type, meal, transport and activity.
pub fn flatten_items(days: &[DaySelection]) -> Vec<QuotationItem> {
    let mut items = Vec::new();
    for day in days {
        let hotel_name = day
            .hotel
            .as_ref()
            .map(|hotel| hotel.name.as_str())
            .unwrap_or("hotel");

        for room in &day.room_selections {
            items.push(QuotationItem {
                day: day.day,
                service_type: ServiceType::Room,
                service_id: room.room.id.clone(),
                description: format!("{} room at {}", room.room.room_type, hotel_name),
                quantity: room.room_count,
                unit_price: room.room.base_price,
                total_price: room.total_price,
            });
        }
        for meal in &day.meals {
            items.push(QuotationItem {
                day: day.day,
                service_type: ServiceType::Meal,
                service_id: meal.meal_id.clone(),
                description: meal.name.clone(),
                quantity: meal.quantity,
                unit_price: meal.price,
                total_price: meal.total(),
            });
        }
        if let Some(transport) = &day.transport {
            let description = match &day.vehicle_type {
                Some(vehicle) => format!("{} ({})", transport.name, vehicle),
                None => transport.name.clone(),
            };
            items.push(QuotationItem {
                day: day.day,
                service_type: ServiceType::Transport,
                service_id: transport.transport_id.clone(),
                description,
                quantity: transport.vehicle_count,
                unit_price: transport.price_per_vehicle,
                total_price: transport.total(),
            });
        }
        for activity in &day.activities {
            items.push(QuotationItem {
                day: day.day,
                service_type: if activity.is_custom {
                    ServiceType::CustomActivity
                } else {
                    ServiceType::Activity
                },
                service_id: activity.source_id.clone(),
                description: activity.name.clone(),
                quantity: 1,
                unit_price: activity.price,
                total_price: activity.price,
            });
        }
    }
    items
}
