use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::{QuotationError, Result};

/// Fields every agency-owned catalog document carries.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CatalogMeta {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub agency_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Domestic,
    International,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Destination {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub name: String,
    pub category: String,
    pub region: Region,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Location {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub destination_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Room {
    pub id: String,
    pub room_type: String,
    pub base_price: Decimal,
    /// Adults covered by the base price, per room.
    pub base_occupancy: u32,
    #[serde(default)]
    pub extra_bed_price: Decimal,
    #[serde(default)]
    pub child_with_bed_price: Decimal,
    #[serde(default)]
    pub child_without_bed_price: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Hotel {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub name: String,
    pub location_id: String,
    #[serde(default)]
    pub star_rating: Option<u8>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VehicleType {
    pub label: String,
    pub capacity: u32,
    pub price_per_day: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Transport {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub name: String,
    pub location_id: String,
    #[serde(default)]
    pub vehicle_types: Vec<VehicleType>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Meal {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub name: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub veg: bool,
    #[serde(default)]
    pub non_veg: bool,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Activity {
    #[serde(flatten)]
    pub meta: CatalogMeta,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A catalog document stored in its own agency-scoped collection.
pub trait CatalogEntity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    const LABEL: &'static str;

    fn meta(&self) -> &CatalogMeta;
    fn meta_mut(&mut self) -> &mut CatalogMeta;
    fn validate(&self) -> Result<()>;
}

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(QuotationError::validation("name", "Name is required"));
    }
    Ok(())
}

/// Highest unit price accepted anywhere, in the agency's currency.
pub const MAX_PRICE: i64 = 100_000_000;

pub fn check_price(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(QuotationError::validation(field, "Price cannot be negative"));
    }
    if value > Decimal::from(MAX_PRICE) {
        return Err(QuotationError::validation(
            field,
            format!("Price cannot exceed {}", MAX_PRICE),
        ));
    }
    Ok(())
}

impl CatalogEntity for Destination {
    const COLLECTION: &'static str = "Destinations";
    const LABEL: &'static str = "Destination";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        if self.category.trim().is_empty() {
            return Err(QuotationError::validation("category", "Category is required"));
        }
        Ok(())
    }
}

impl CatalogEntity for Location {
    const COLLECTION: &'static str = "Locations";
    const LABEL: &'static str = "Location";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        if self.destination_id.trim().is_empty() {
            return Err(QuotationError::validation(
                "destination_id",
                "A location must belong to a destination",
            ));
        }
        Ok(())
    }
}

impl CatalogEntity for Hotel {
    const COLLECTION: &'static str = "Hotels";
    const LABEL: &'static str = "Hotel";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        for room in &self.rooms {
            if room.room_type.trim().is_empty() {
                return Err(QuotationError::validation("room_type", "Room type is required"));
            }
            if room.base_occupancy == 0 {
                return Err(QuotationError::validation(
                    "base_occupancy",
                    format!("Room '{}' must sleep at least one adult", room.room_type),
                ));
            }
            check_price("base_price", room.base_price)?;
            check_price("extra_bed_price", room.extra_bed_price)?;
            check_price("child_with_bed_price", room.child_with_bed_price)?;
            check_price("child_without_bed_price", room.child_without_bed_price)?;
        }
        Ok(())
    }
}

impl CatalogEntity for Transport {
    const COLLECTION: &'static str = "Transports";
    const LABEL: &'static str = "Transport";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        for vehicle in &self.vehicle_types {
            if vehicle.label.trim().is_empty() {
                return Err(QuotationError::validation("vehicle_type", "Vehicle label is required"));
            }
            check_price("price_per_day", vehicle.price_per_day)?;
        }
        Ok(())
    }
}

impl CatalogEntity for Meal {
    const COLLECTION: &'static str = "Meals";
    const LABEL: &'static str = "Meal";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        if self.veg == self.non_veg {
            return Err(QuotationError::validation(
                "veg",
                "A meal must be either veg or non-veg",
            ));
        }
        check_price("price", self.price)
    }
}

impl CatalogEntity for Activity {
    const COLLECTION: &'static str = "Activities";
    const LABEL: &'static str = "Activity";

    fn meta(&self) -> &CatalogMeta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut CatalogMeta {
        &mut self.meta
    }
    fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        check_price("price", self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn meal(veg: bool, non_veg: bool) -> Meal {
        Meal {
            meta: CatalogMeta::default(),
            name: "Thali".to_string(),
            meal_type: MealType::Lunch,
            veg,
            non_veg,
            price: dec(350),
        }
    }

    #[test]
    fn test_meal_requires_exactly_one_diet() {
        assert!(meal(true, false).validate().is_ok());
        assert!(meal(false, true).validate().is_ok());
        assert!(meal(true, true).validate().is_err());
        assert!(meal(false, false).validate().is_err());
    }

    #[test]
    fn test_hotel_room_without_occupancy_is_rejected() {
        let hotel = Hotel {
            meta: CatalogMeta::default(),
            name: "Lake View".to_string(),
            location_id: "loc-1".to_string(),
            star_rating: Some(4),
            address: None,
            rooms: vec![Room {
                id: "r1".to_string(),
                room_type: "Deluxe".to_string(),
                base_price: dec(5000),
                base_occupancy: 0,
                extra_bed_price: dec(1200),
                child_with_bed_price: dec(800),
                child_without_bed_price: dec(0),
            }],
            images: vec![],
        };
        match hotel.validate() {
            Err(QuotationError::Validation { field, .. }) => assert_eq!(field, "base_occupancy"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_catalog_meta_flattens_mongo_id() {
        let json = serde_json::json!({
            "_id": "dest-1",
            "agency_id": "agency-1",
            "name": "Kerala",
            "category": "Backwaters",
            "region": "domestic"
        });
        let destination: Destination = serde_json::from_value(json).unwrap();
        assert_eq!(destination.meta.id, "dest-1");
        assert_eq!(destination.region, Region::Domestic);
        assert!(destination.validate().is_ok());
    }
}
