//! Per-day selection store for a quotation being assembled.
//!
//! Days are addressed by [`DayKey`] and must fall inside the trip dates.
//! Every successful mutation bumps [`DaySelectionStore::revision`], which is
//! what cached totals are checked against.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::errors::{QuotationError, Result};
use crate::models::day_selection::{
    DayKey, DayListField, DayPatch, DaySelection, Occupancy, RoomSelection, TripDates,
};

#[derive(Debug, Clone)]
pub struct DaySelectionStore {
    dates: TripDates,
    days: BTreeMap<u32, DaySelection>,
    revision: u64,
}

impl DaySelectionStore {
    pub fn new(dates: TripDates) -> Self {
        Self {
            dates,
            days: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn dates(&self) -> TripDates {
        self.dates
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update_day_selection(&mut self, key: DayKey, mut patch: DayPatch) -> Result<&DaySelection> {
        let day = self.dates.resolve(key)?;
        self.ensure_unlocked(day)?;

        if let Some(rooms) = patch.room_selections.as_mut() {
            validate_rooms(rooms)?;
            for room in rooms.iter_mut() {
                room.recompute_total()?;
            }
        }
        if let Some(meals) = patch.meals.as_ref() {
            for meal in meals {
                meal.validate()?;
            }
        }
        if let Some(Some(transport)) = patch.transport.as_ref() {
            transport.validate()?;
        }
        if let Some(activities) = patch.activities.as_ref() {
            for activity in activities {
                activity.validate()?;
            }
            let mut seen = HashSet::new();
            if let Some(duplicate) = activities
                .iter()
                .find(|activity| !seen.insert(activity.entry_id.as_str()))
            {
                return Err(QuotationError::validation(
                    "activities",
                    format!("Activity entry '{}' was added twice", duplicate.entry_id),
                ));
            }
        }

        self.days
            .entry(day)
            .or_insert_with(|| DaySelection::empty(day))
            .apply(patch);
        self.touch();
        Ok(&self.days[&day])
    }

    pub fn get_day_selection(&self, key: DayKey) -> Result<DaySelection> {
        let day = self.dates.resolve(key)?;
        Ok(self
            .days
            .get(&day)
            .cloned()
            .unwrap_or_else(|| DaySelection::empty(day)))
    }

    /// Removes exactly one entry from a list field of one day.
    pub fn remove_from_day(&mut self, key: DayKey, field: DayListField, item_id: &str) -> Result<()> {
        let day = self.dates.resolve(key)?;
        self.ensure_unlocked(day)?;
        let selection = self
            .days
            .get_mut(&day)
            .ok_or_else(|| missing_item(day, field, item_id))?;

        let position = match field {
            DayListField::Activities => selection
                .activities
                .iter()
                .position(|activity| activity.entry_id == item_id),
            DayListField::Meals => selection
                .meals
                .iter()
                .position(|meal| meal.meal_id == item_id),
            DayListField::RoomSelections => selection
                .room_selections
                .iter()
                .position(|room| room.room.id == item_id),
        }
        .ok_or_else(|| missing_item(day, field, item_id))?;

        match field {
            DayListField::Activities => {
                selection.activities.remove(position);
            }
            DayListField::Meals => {
                selection.meals.remove(position);
            }
            DayListField::RoomSelections => {
                selection.room_selections.remove(position);
            }
        }
        self.touch();
        Ok(())
    }

    /// Changing occupancy reprices the room and withdraws its confirmation.
    pub fn update_room_occupancy(
        &mut self,
        key: DayKey,
        room_id: &str,
        room_count: u32,
        occupancy: Occupancy,
    ) -> Result<&RoomSelection> {
        let day = self.dates.resolve(key)?;
        self.ensure_unlocked(day)?;
        let room = self.room_mut(day, room_id)?;

        let mut updated = room.clone();
        updated.room_count = room_count;
        updated.occupancy = occupancy;
        updated.validate()?;
        updated.recompute_total()?;
        updated.confirmed = false;
        updated.confirmed_at = None;
        *room = updated;

        self.touch();
        self.room(day, room_id)
    }

    pub fn confirm_room(&mut self, key: DayKey, room_id: &str, at: DateTime<Utc>) -> Result<&RoomSelection> {
        let day = self.dates.resolve(key)?;
        self.ensure_unlocked(day)?;
        let room = self.room_mut(day, room_id)?;
        room.validate()?;
        room.recompute_total()?;
        room.confirmed = true;
        room.confirmed_at = Some(at);

        self.touch();
        self.room(day, room_id)
    }

    /// Locks a day. Needs a hotel or a transport, and every room confirmed.
    pub fn confirm_day(&mut self, key: DayKey) -> Result<()> {
        let day = self.dates.resolve(key)?;
        let selection = self.days.get_mut(&day).ok_or_else(|| {
            QuotationError::invariant(format!(
                "Day {} has nothing selected yet; choose a hotel or transport before confirming",
                day
            ))
        })?;

        if selection.hotel.is_none() && selection.transport.is_none() {
            return Err(QuotationError::invariant(format!(
                "Day {} needs a hotel or transport before it can be confirmed",
                day
            )));
        }
        if let Some(room) = selection.room_selections.iter().find(|room| !room.confirmed) {
            return Err(QuotationError::invariant(format!(
                "Confirm the '{}' rooms on day {} first",
                room.room.room_type, day
            )));
        }

        selection.confirmed = true;
        self.touch();
        Ok(())
    }

    pub fn unconfirm_day(&mut self, key: DayKey) -> Result<()> {
        let day = self.dates.resolve(key)?;
        if let Some(selection) = self.days.get_mut(&day) {
            if selection.confirmed {
                selection.confirmed = false;
                self.touch();
            }
        }
        Ok(())
    }

    /// Days that have been touched, in trip order.
    pub fn selections(&self) -> impl Iterator<Item = &DaySelection> {
        self.days.values()
    }

    /// One entry per trip day, empty where nothing was chosen.
    pub fn ordered_days(&self) -> Vec<DaySelection> {
        (1..=self.dates.day_count())
            .map(|day| {
                self.days
                    .get(&day)
                    .cloned()
                    .unwrap_or_else(|| DaySelection::empty(day))
            })
            .collect()
    }

    /// Resolves the key and fails if that day is confirmed.
    pub fn ensure_editable(&self, key: DayKey) -> Result<u32> {
        let day = self.dates.resolve(key)?;
        self.ensure_unlocked(day)?;
        Ok(day)
    }

    fn ensure_unlocked(&self, day: u32) -> Result<()> {
        match self.days.get(&day) {
            Some(selection) if selection.confirmed => Err(QuotationError::invariant(format!(
                "Day {} is confirmed; unlock it before making changes",
                day
            ))),
            _ => Ok(()),
        }
    }

    fn room(&self, day: u32, room_id: &str) -> Result<&RoomSelection> {
        self.days
            .get(&day)
            .and_then(|selection| {
                selection
                    .room_selections
                    .iter()
                    .find(|room| room.room.id == room_id)
            })
            .ok_or_else(|| missing_item(day, DayListField::RoomSelections, room_id))
    }

    fn room_mut(&mut self, day: u32, room_id: &str) -> Result<&mut RoomSelection> {
        self.days
            .get_mut(&day)
            .and_then(|selection| {
                selection
                    .room_selections
                    .iter_mut()
                    .find(|room| room.room.id == room_id)
            })
            .ok_or_else(|| missing_item(day, DayListField::RoomSelections, room_id))
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn validate_rooms(rooms: &[RoomSelection]) -> Result<()> {
    let mut seen = HashSet::new();
    for room in rooms {
        room.validate()?;
        if !seen.insert(room.room.id.as_str()) {
            return Err(QuotationError::validation(
                "room_selections",
                format!(
                    "Room '{}' is listed twice; change its count instead",
                    room.room.room_type
                ),
            ));
        }
    }
    Ok(())
}

fn missing_item(day: u32, field: DayListField, item_id: &str) -> QuotationError {
    let label = match field {
        DayListField::Activities => "activity",
        DayListField::Meals => "meal",
        DayListField::RoomSelections => "room",
    };
    QuotationError::invariant(format!("Day {} has no {} '{}'", day, label, item_id))
}
