//! Catalog documents behind a submission's selections.
//!
//! Saved quotations are priced from the agency's catalog, never from the
//! prices a client sends back. Every referenced id must exist.

use std::collections::HashMap;

use crate::errors::{QuotationError, Result};
use crate::models::catalog::{Activity, CatalogEntity, Hotel, Meal, Transport};
use crate::models::day_selection::DaySelection;
use crate::services::catalog_service::CatalogService;

#[derive(Debug, Default)]
pub struct CatalogPrices {
    hotels: HashMap<String, Hotel>,
    meals: HashMap<String, Meal>,
    transports: HashMap<String, Transport>,
    activities: HashMap<String, Activity>,
}

async fn load<T: CatalogEntity>(
    catalog: &CatalogService,
    agency_id: &str,
    cache: &mut HashMap<String, T>,
    id: &str,
) -> Result<()> {
    if !cache.contains_key(id) {
        let entity: T = catalog.get(agency_id, id).await?;
        cache.insert(id.to_string(), entity);
    }
    Ok(())
}

fn lookup<'a, T: CatalogEntity>(cache: &'a HashMap<String, T>, id: &str) -> Result<&'a T> {
    cache
        .get(id)
        .ok_or_else(|| QuotationError::not_found(T::LABEL, id))
}

impl CatalogPrices {
    /// Fetches each distinct hotel, meal, transport and catalog activity once.
    pub async fn fetch(catalog: &CatalogService, agency_id: &str, days: &[DaySelection]) -> Result<Self> {
        let mut prices = Self::default();
        for day in days {
            if let Some(hotel) = &day.hotel {
                load(catalog, agency_id, &mut prices.hotels, &hotel.hotel_id).await?;
            }
            for meal in &day.meals {
                load(catalog, agency_id, &mut prices.meals, &meal.meal_id).await?;
            }
            if let Some(transport) = &day.transport {
                load(catalog, agency_id, &mut prices.transports, &transport.transport_id).await?;
            }
            for activity in day.activities.iter().filter(|activity| !activity.is_custom) {
                load(catalog, agency_id, &mut prices.activities, &activity.source_id).await?;
            }
        }
        Ok(prices)
    }

    pub fn with_hotel(mut self, hotel: Hotel) -> Self {
        self.hotels.insert(hotel.meta.id.clone(), hotel);
        self
    }

    pub fn with_meal(mut self, meal: Meal) -> Self {
        self.meals.insert(meal.meta.id.clone(), meal);
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transports.insert(transport.meta.id.clone(), transport);
        self
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.insert(activity.meta.id.clone(), activity);
        self
    }

    /// Overwrites names and prices in one day with the catalog's values.
    pub fn reprice(&self, day: &mut DaySelection) -> Result<()> {
        match &mut day.hotel {
            Some(selected) => {
                let hotel = lookup(&self.hotels, &selected.hotel_id)?;
                selected.name = hotel.name.clone();
                for selection in &mut day.room_selections {
                    let room = hotel
                        .rooms
                        .iter()
                        .find(|room| room.id == selection.room.id)
                        .ok_or_else(|| QuotationError::not_found("Room", &selection.room.id))?;
                    selection.room = room.clone();
                }
            }
            None if !day.room_selections.is_empty() => {
                return Err(QuotationError::validation(
                    "hotel",
                    format!("Day {} has rooms but no hotel", day.day),
                ));
            }
            None => {}
        }

        for selected in &mut day.meals {
            let meal = lookup(&self.meals, &selected.meal_id)?;
            selected.name = meal.name.clone();
            selected.meal_type = meal.meal_type;
            selected.price = meal.price;
        }

        if let Some(selected) = &mut day.transport {
            let transport = lookup(&self.transports, &selected.transport_id)?;
            let label = day.vehicle_type.as_deref().ok_or_else(|| {
                QuotationError::validation(
                    "vehicle_type",
                    format!("Choose a vehicle type for '{}'", transport.name),
                )
            })?;
            let vehicle = transport
                .vehicle_types
                .iter()
                .find(|vehicle| vehicle.label == label)
                .ok_or_else(|| QuotationError::not_found("Vehicle type", label))?;
            selected.name = transport.name.clone();
            selected.price_per_vehicle = vehicle.price_per_day;
        }

        for selected in &mut day.activities {
            if selected.is_custom {
                return Err(QuotationError::validation(
                    "activities",
                    "Custom activities are sent with custom_activities, not inside a day",
                ));
            }
            let activity = lookup(&self.activities, &selected.source_id)?;
            selected.name = activity.name.clone();
            selected.price = activity.price;
            selected.description = activity.description.clone();
            selected.duration_minutes = activity.duration_minutes;
            selected.category = activity.category.clone();
            selected.image_url = activity.image_url.clone();
        }
        Ok(())
    }
}
