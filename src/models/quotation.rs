use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::Region;
use super::custom_activity::{CustomActivity, NewCustomActivity};
use super::day_selection::{check_units, DaySelection, TripDates};
use super::pricing::{PricingConfiguration, Totals};
use crate::errors::{QuotationError, Result};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct TravelerCounts {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl TravelerCounts {
    pub fn validate(&self) -> Result<()> {
        if self.adults == 0 {
            return Err(QuotationError::validation(
                "adults",
                "A quotation needs at least one adult traveler",
            ));
        }
        check_units("adults", self.adults)?;
        check_units("children", self.children)?;
        check_units("infants", self.infants)
    }

    pub fn paying(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DestinationRef {
    pub id: String,
    pub name: String,
    pub region: Region,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LocationRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Room,
    Meal,
    Transport,
    Activity,
    CustomActivity,
}

/// One flattened service line of a saved quotation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QuotationItem {
    pub day: u32,
    pub service_type: ServiceType,
    pub service_id: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Quotation {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub agency_id: String,
    pub client_id: String,
    pub destination: DestinationRef,
    pub location: LocationRef,
    pub dates: TripDates,
    pub travelers: TravelerCounts,
    pub days: Vec<DaySelection>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub custom_activities: Vec<CustomActivity>,
    pub items: Vec<QuotationItem>,
    pub pricing: PricingConfiguration,
    pub totals: Totals,
    pub total_amount: Decimal,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating or replacing a quotation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QuotationSubmission {
    pub client_id: String,
    pub destination_id: String,
    pub location_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub travelers: TravelerCounts,
    #[serde(default)]
    pub days: Vec<DaySelection>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub custom_activities: Vec<NewCustomActivity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traveler_counts_are_bounded() {
        let counts = TravelerCounts {
            adults: u32::MAX,
            children: u32::MAX,
            infants: 0,
        };
        assert_eq!(counts.paying(), u32::MAX);
        assert!(matches!(counts.validate(), Err(QuotationError::Validation { .. })));

        let family = TravelerCounts {
            adults: 2,
            children: 2,
            infants: 1,
        };
        assert!(family.validate().is_ok());
        assert_eq!(family.paying(), 4);
    }
}
