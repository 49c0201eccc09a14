use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::day_selection::{DayKey, SelectedActivity};

/// Form input for an ad-hoc activity.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NewCustomActivity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub days: Vec<DayKey>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CustomActivity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: Option<u32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub days: Vec<DayKey>,
}

impl CustomActivity {
    pub fn from_new(id: String, data: NewCustomActivity) -> Self {
        Self {
            id,
            name: data.name.trim().to_string(),
            description: data.description,
            price: data.price,
            duration_minutes: data.duration_minutes,
            category: data.category,
            image_url: data.image_url,
            days: data.days,
        }
    }

    /// Copy of this activity as it sits inside a day.
    pub fn to_day_entry(&self, entry_id: String) -> SelectedActivity {
        SelectedActivity {
            entry_id,
            source_id: self.id.clone(),
            is_custom: true,
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
            duration_minutes: self.duration_minutes,
            category: self.category.clone(),
            image_url: self.image_url.clone(),
        }
    }
}
