use std::sync::Arc;

use rust_decimal::Decimal;

use crate::errors::{QuotationError, Result};
use crate::models::catalog::check_price;
use crate::models::custom_activity::{CustomActivity, NewCustomActivity};
use crate::models::day_selection::{DayKey, DayPatch};
use crate::services::id_generator::IdGenerator;
use crate::services::selection_store::DaySelectionStore;

/// Activities authored during one editing session. Registering an activity
/// does not place it on any day; see [`CustomActivityRegistry::apply_to_days`].
pub struct CustomActivityRegistry {
    ids: Arc<dyn IdGenerator>,
    activities: Vec<CustomActivity>,
}

impl CustomActivityRegistry {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ids,
            activities: Vec::new(),
        }
    }

    pub fn add_custom_activity(&mut self, data: NewCustomActivity) -> Result<CustomActivity> {
        validate(&data)?;
        let activity = CustomActivity::from_new(self.ids.next_id("custom"), data);
        self.activities.push(activity.clone());
        Ok(activity)
    }

    /// Replaces the registry record. Copies already placed on days keep
    /// their old values.
    pub fn update_custom_activity(&mut self, id: &str, data: NewCustomActivity) -> Result<CustomActivity> {
        validate(&data)?;
        let slot = self
            .activities
            .iter_mut()
            .find(|activity| activity.id == id)
            .ok_or_else(|| QuotationError::not_found("Custom activity", id))?;
        *slot = CustomActivity::from_new(id.to_string(), data);
        Ok(slot.clone())
    }

    pub fn get(&self, id: &str) -> Option<&CustomActivity> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    pub fn list(&self) -> &[CustomActivity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Appends a fresh copy of the activity to each day's list. Every copy
    /// gets its own entry id, so applying twice yields two entries.
    pub fn apply_to_days(
        &self,
        id: &str,
        days: &[DayKey],
        store: &mut DaySelectionStore,
    ) -> Result<Vec<String>> {
        let activity = self
            .get(id)
            .ok_or_else(|| QuotationError::not_found("Custom activity", id))?;

        // Every day must be in range and unlocked before the first write.
        for day in days {
            store.ensure_editable(*day)?;
        }

        let mut entry_ids = Vec::with_capacity(days.len());
        for day in days {
            let entry_id = self.ids.next_id("entry");
            let mut activities = store.get_day_selection(*day)?.activities;
            activities.push(activity.to_day_entry(entry_id.clone()));
            store.update_day_selection(*day, DayPatch::activities(activities))?;
            entry_ids.push(entry_id);
        }
        Ok(entry_ids)
    }

    /// Applies the activity to the days it was created for.
    pub fn apply_to_own_days(&self, id: &str, store: &mut DaySelectionStore) -> Result<Vec<String>> {
        let days = self
            .get(id)
            .map(|activity| activity.days.clone())
            .ok_or_else(|| QuotationError::not_found("Custom activity", id))?;
        self.apply_to_days(id, &days, store)
    }
}

fn validate(data: &NewCustomActivity) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(QuotationError::validation("name", "Activity name is required"));
    }
    if data.price <= Decimal::ZERO {
        return Err(QuotationError::validation(
            "price",
            "Activity price must be greater than zero",
        ));
    }
    check_price("price", data.price)
}
