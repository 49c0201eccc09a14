use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::catalog::{check_price, MealType, Room};
use crate::errors::{QuotationError, Result};

/// Inclusive start/end dates of a trip.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TripDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TripDates {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(QuotationError::validation(
                "end_date",
                "End date cannot be before the start date",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Resolves a key to its 1-based day index, rejecting days outside the trip.
    pub fn resolve(&self, key: DayKey) -> Result<u32> {
        match key {
            DayKey::Index(index) if index >= 1 && index <= self.day_count() => Ok(index),
            DayKey::Index(index) => Err(QuotationError::InvalidDayKey(format!(
                "day {} is outside a {}-day trip",
                index,
                self.day_count()
            ))),
            DayKey::Date(date) if date >= self.start && date <= self.end => {
                Ok((date - self.start).num_days() as u32 + 1)
            }
            DayKey::Date(date) => Err(QuotationError::InvalidDayKey(format!(
                "{} is outside the trip dates {} to {}",
                date, self.start, self.end
            ))),
        }
    }

    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start + chrono::Duration::days(i64::from(day.saturating_sub(1)))
    }
}

/// A trip day addressed either by position or by calendar date.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum DayKey {
    Index(u32),
    Date(NaiveDate),
}

impl From<u32> for DayKey {
    fn from(index: u32) -> Self {
        DayKey::Index(index)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey::Date(date)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectedHotel {
    pub hotel_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub adults_with_extra_bed: u32,
    #[serde(default)]
    pub children_with_bed: u32,
    #[serde(default)]
    pub children_without_bed: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RoomSelection {
    pub room: Room,
    pub room_count: u32,
    #[serde(default)]
    pub occupancy: Occupancy,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl RoomSelection {
    pub fn new(room: Room, room_count: u32, occupancy: Occupancy) -> Self {
        let mut selection = Self {
            room,
            room_count,
            occupancy,
            total_price: Decimal::ZERO,
            confirmed: false,
            confirmed_at: None,
        };
        // An overflowing total stays at zero until validate rejects it.
        if let Ok(total) = selection.priced_total() {
            selection.total_price = total;
        }
        selection
    }

    /// Base price per room covers the base occupancy; every extra bed or
    /// child is charged at the room's per-person rate.
    pub fn priced_total(&self) -> Result<Decimal> {
        let room = &self.room;
        let occupancy = &self.occupancy;
        let lines = [
            (self.room_count, room.base_price),
            (occupancy.adults_with_extra_bed, room.extra_bed_price),
            (occupancy.children_with_bed, room.child_with_bed_price),
            (occupancy.children_without_bed, room.child_without_bed_price),
        ];
        lines.iter().try_fold(Decimal::ZERO, |total, (count, price)| {
            line_total("room_selections", *count, *price)?
                .checked_add(total)
                .ok_or_else(|| overflow("room_selections"))
        })
    }

    pub fn recompute_total(&mut self) -> Result<()> {
        self.total_price = self.priced_total()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.room_count == 0 {
            return Err(QuotationError::validation(
                "room_count",
                format!("Select at least one '{}' room", self.room.room_type),
            ));
        }
        check_units("room_count", self.room_count)?;
        check_units("base_occupancy", self.room.base_occupancy)?;
        check_units("adults", self.occupancy.adults)?;
        check_units("adults_with_extra_bed", self.occupancy.adults_with_extra_bed)?;
        check_units("children_with_bed", self.occupancy.children_with_bed)?;
        check_units("children_without_bed", self.occupancy.children_without_bed)?;
        check_price("base_price", self.room.base_price)?;
        check_price("extra_bed_price", self.room.extra_bed_price)?;
        check_price("child_with_bed_price", self.room.child_with_bed_price)?;
        check_price("child_without_bed_price", self.room.child_without_bed_price)?;

        let capacity = self
            .room_count
            .checked_mul(self.room.base_occupancy)
            .ok_or_else(|| overflow("room_count"))?;
        if self.occupancy.adults > capacity {
            return Err(QuotationError::validation(
                "adults",
                format!(
                    "{} adults exceed the {} base beds of {} x '{}'; add extra beds instead",
                    self.occupancy.adults, capacity, self.room_count, self.room.room_type
                ),
            ));
        }
        Ok(())
    }
}

/// Largest count accepted for rooms, beds, meals or vehicles on one line.
pub const MAX_UNITS: u32 = 1_000;

/// Rejects anything above [`MAX_UNITS`]; zero is left to the caller.
pub fn check_units(field: &str, value: u32) -> Result<()> {
    if value > MAX_UNITS {
        return Err(QuotationError::validation(
            field,
            format!("At most {} can be booked on one line", MAX_UNITS),
        ));
    }
    Ok(())
}

fn check_count(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(QuotationError::validation(field, "Quantity must be at least 1"));
    }
    check_units(field, value)
}

fn line_total(field: &str, count: u32, price: Decimal) -> Result<Decimal> {
    Decimal::from(count)
        .checked_mul(price)
        .ok_or_else(|| overflow(field))
}

fn overflow(field: &str) -> QuotationError {
    QuotationError::validation(field, "Amount is too large")
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectedMeal {
    pub meal_id: String,
    pub name: String,
    pub meal_type: MealType,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl SelectedMeal {
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.price)
    }

    pub fn validate(&self) -> Result<()> {
        check_price("price", self.price)?;
        check_count("quantity", self.quantity)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectedTransport {
    pub transport_id: String,
    pub name: String,
    pub price_per_vehicle: Decimal,
    #[serde(default = "default_quantity")]
    pub vehicle_count: u32,
}

impl SelectedTransport {
    pub fn total(&self) -> Decimal {
        Decimal::from(self.vehicle_count).saturating_mul(self.price_per_vehicle)
    }

    pub fn validate(&self) -> Result<()> {
        check_price("price_per_vehicle", self.price_per_vehicle)?;
        check_count("vehicle_count", self.vehicle_count)
    }
}

/// An activity placed into a day. Custom activities are copies, not references.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectedActivity {
    /// Distinct per placement so the same activity can be added twice.
    pub entry_id: String,
    /// Catalog activity id, or the registry id for custom activities.
    pub source_id: String,
    #[serde(default)]
    pub is_custom: bool,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl SelectedActivity {
    pub fn validate(&self) -> Result<()> {
        check_price("price", self.price)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DaySelection {
    pub day: u32,
    #[serde(default)]
    pub hotel: Option<SelectedHotel>,
    #[serde(default)]
    pub meals: Vec<SelectedMeal>,
    #[serde(default)]
    pub activities: Vec<SelectedActivity>,
    #[serde(default)]
    pub transport: Option<SelectedTransport>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub room_selections: Vec<RoomSelection>,
    #[serde(default)]
    pub confirmed: bool,
}

impl DaySelection {
    pub fn empty(day: u32) -> Self {
        Self {
            day,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hotel.is_none()
            && self.transport.is_none()
            && self.meals.is_empty()
            && self.activities.is_empty()
            && self.room_selections.is_empty()
    }

    /// Shallow merge: every field present in the patch wins, lists are replaced.
    pub fn apply(&mut self, patch: DayPatch) {
        if let Some(hotel) = patch.hotel {
            self.hotel = hotel;
        }
        if let Some(meals) = patch.meals {
            self.meals = meals;
        }
        if let Some(activities) = patch.activities {
            self.activities = activities;
        }
        if let Some(transport) = patch.transport {
            self.transport = transport;
        }
        if let Some(vehicle_type) = patch.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(room_selections) = patch.room_selections {
            self.room_selections = room_selections;
        }
    }
}

// Distinguishes an absent field (None) from an explicit null (Some(None)).
fn deserialize_present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update for one day. `None` leaves a field untouched; for the
/// optional fields `Some(None)` clears the current value.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DayPatch {
    #[serde(default, deserialize_with = "deserialize_present", skip_serializing_if = "Option::is_none")]
    pub hotel: Option<Option<SelectedHotel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meals: Option<Vec<SelectedMeal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<SelectedActivity>>,
    #[serde(default, deserialize_with = "deserialize_present", skip_serializing_if = "Option::is_none")]
    pub transport: Option<Option<SelectedTransport>>,
    #[serde(default, deserialize_with = "deserialize_present", skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_selections: Option<Vec<RoomSelection>>,
}

impl DayPatch {
    pub fn hotel(hotel: SelectedHotel) -> Self {
        Self {
            hotel: Some(Some(hotel)),
            ..Default::default()
        }
    }

    pub fn meals(meals: Vec<SelectedMeal>) -> Self {
        Self {
            meals: Some(meals),
            ..Default::default()
        }
    }

    pub fn activities(activities: Vec<SelectedActivity>) -> Self {
        Self {
            activities: Some(activities),
            ..Default::default()
        }
    }

    pub fn transport(transport: SelectedTransport, vehicle_type: Option<String>) -> Self {
        Self {
            transport: Some(Some(transport)),
            vehicle_type: Some(vehicle_type),
            ..Default::default()
        }
    }

    pub fn room_selections(room_selections: Vec<RoomSelection>) -> Self {
        Self {
            room_selections: Some(room_selections),
            ..Default::default()
        }
    }

    /// Patch that reproduces every field of a full day.
    pub fn from_day(day: DaySelection) -> Self {
        Self {
            hotel: Some(day.hotel),
            meals: Some(day.meals),
            activities: Some(day.activities),
            transport: Some(day.transport),
            vehicle_type: Some(day.vehicle_type),
            room_selections: Some(day.room_selections),
        }
    }
}

/// List-valued fields of a day that support single-entry removal.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayListField {
    Activities,
    Meals,
    RoomSelections,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates() -> TripDates {
        TripDates::new(
            NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 23).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_trip_dates_resolve_index_and_date() {
        let trip = dates();
        assert_eq!(trip.day_count(), 4);
        assert_eq!(trip.resolve(DayKey::Index(4)).unwrap(), 4);
        assert_eq!(
            trip.resolve(DayKey::Date(NaiveDate::from_ymd_opt(2026, 12, 21).unwrap()))
                .unwrap(),
            2
        );
        assert_eq!(trip.date_of(3), NaiveDate::from_ymd_opt(2026, 12, 22).unwrap());
    }

    #[test]
    fn test_trip_dates_reject_outside_days() {
        let trip = dates();
        assert!(matches!(
            trip.resolve(DayKey::Index(0)),
            Err(QuotationError::InvalidDayKey(_))
        ));
        assert!(matches!(
            trip.resolve(DayKey::Index(5)),
            Err(QuotationError::InvalidDayKey(_))
        ));
        assert!(matches!(
            trip.resolve(DayKey::Date(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap())),
            Err(QuotationError::InvalidDayKey(_))
        ));
    }

    #[test]
    fn test_reversed_dates_are_rejected() {
        let result = TripDates::new(
            NaiveDate::from_ymd_opt(2026, 12, 23).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 20).unwrap(),
        );
        assert!(matches!(result, Err(QuotationError::Validation { .. })));
    }

    #[test]
    fn test_patch_distinguishes_missing_from_null() {
        let patch: DayPatch = serde_json::from_value(serde_json::json!({
            "hotel": null,
            "meals": []
        }))
        .unwrap();
        assert_eq!(patch.hotel, Some(None));
        assert_eq!(patch.meals, Some(vec![]));
        assert_eq!(patch.transport, None);
    }

    #[test]
    fn test_day_key_parses_index_or_date() {
        let index: DayKey = serde_json::from_value(serde_json::json!(2)).unwrap();
        let date: DayKey = serde_json::from_value(serde_json::json!("2026-12-21")).unwrap();
        assert_eq!(index, DayKey::Index(2));
        assert_eq!(date, DayKey::Date(NaiveDate::from_ymd_opt(2026, 12, 21).unwrap()));
    }

    fn room(base_price: Decimal) -> Room {
        Room {
            id: "room-1".to_string(),
            room_type: "Deluxe".to_string(),
            base_price,
            base_occupancy: 2,
            extra_bed_price: Decimal::from(1500),
            child_with_bed_price: Decimal::ZERO,
            child_without_bed_price: Decimal::ZERO,
        }
    }

    #[test]
    fn test_room_total_overflow_is_an_error() {
        let selection = RoomSelection::new(room(Decimal::MAX), 2, Occupancy::default());
        assert_eq!(selection.total_price, Decimal::ZERO);
        assert!(matches!(
            selection.priced_total(),
            Err(QuotationError::Validation { .. })
        ));
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_room_total_includes_extra_beds() {
        let selection = RoomSelection::new(
            room(Decimal::from(5000)),
            2,
            Occupancy {
                adults: 4,
                adults_with_extra_bed: 1,
                ..Default::default()
            },
        );
        assert!(selection.validate().is_ok());
        assert_eq!(selection.total_price, Decimal::from(11500));
    }
}
