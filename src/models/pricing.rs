use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::catalog::check_price;
use crate::errors::{QuotationError, Result};

const MAX_MARKUP_PERCENTAGE: i64 = 1_000;

/// How a quotation's price is presented to the client.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubtotalBasis {
    #[default]
    Group,
    PerPerson,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PricingConfiguration {
    #[serde(default)]
    pub subtotal_basis: SubtotalBasis,
    pub markup_percentage: Decimal,
    pub gst_percentage: Decimal,
    pub discount_amount: Decimal,
}

impl Default for PricingConfiguration {
    /// 10% markup, 5% GST, no discount.
    fn default() -> Self {
        Self {
            subtotal_basis: SubtotalBasis::Group,
            markup_percentage: Decimal::from(10),
            gst_percentage: Decimal::from(5),
            discount_amount: Decimal::ZERO,
        }
    }
}

impl PricingConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.markup_percentage < Decimal::ZERO {
            return Err(QuotationError::validation(
                "markup_percentage",
                "Markup cannot be negative",
            ));
        }
        if self.markup_percentage > Decimal::from(MAX_MARKUP_PERCENTAGE) {
            return Err(QuotationError::validation(
                "markup_percentage",
                format!("Markup cannot exceed {} percent", MAX_MARKUP_PERCENTAGE),
            ));
        }
        if self.gst_percentage < Decimal::ZERO || self.gst_percentage > Decimal::ONE_HUNDRED {
            return Err(QuotationError::validation(
                "gst_percentage",
                "GST must be between 0 and 100 percent",
            ));
        }
        if self.discount_amount < Decimal::ZERO {
            return Err(QuotationError::validation(
                "discount_amount",
                "Discount cannot be negative",
            ));
        }
        check_price("discount_amount", self.discount_amount)
    }

    pub fn apply(&mut self, patch: PricingPatch) {
        if let Some(basis) = patch.subtotal_basis {
            self.subtotal_basis = basis;
        }
        if let Some(markup) = patch.markup_percentage {
            self.markup_percentage = markup;
        }
        if let Some(gst) = patch.gst_percentage {
            self.gst_percentage = gst;
        }
        if let Some(discount) = patch.discount_amount {
            self.discount_amount = discount;
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PricingPatch {
    pub subtotal_basis: Option<SubtotalBasis>,
    pub markup_percentage: Option<Decimal>,
    pub gst_percentage: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AgencySettings {
    pub agency_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub primary_color: String,
    pub currency: String,
    pub quotation_footer: String,
    pub pricing: PricingConfiguration,
}

impl Default for AgencySettings {
    fn default() -> Self {
        Self {
            agency_name: "My Travel Agency".to_string(),
            logo_url: None,
            contact_email: None,
            contact_phone: None,
            address: None,
            primary_color: "#1e40af".to_string(),
            currency: "INR".to_string(),
            quotation_footer: "Prices are subject to availability at the time of booking."
                .to_string(),
            pricing: PricingConfiguration::default(),
        }
    }
}

/// Branding fields only; pricing is updated through [`PricingPatch`].
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AgencySettingsPatch {
    pub agency_name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub primary_color: Option<String>,
    pub currency: Option<String>,
    pub quotation_footer: Option<String>,
}

impl AgencySettings {
    pub fn apply(&mut self, patch: AgencySettingsPatch) -> Result<()> {
        if let Some(name) = patch.agency_name {
            if name.trim().is_empty() {
                return Err(QuotationError::validation("agency_name", "Agency name is required"));
            }
            self.agency_name = name;
        }
        if let Some(logo_url) = patch.logo_url {
            self.logo_url = Some(logo_url);
        }
        if let Some(email) = patch.contact_email {
            self.contact_email = Some(email);
        }
        if let Some(phone) = patch.contact_phone {
            self.contact_phone = Some(phone);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        if let Some(color) = patch.primary_color {
            self.primary_color = color;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(footer) = patch.quotation_footer {
            self.quotation_footer = footer;
        }
        Ok(())
    }
}

/// Unrounded aggregate amounts. Round only for display.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub markup_amount: Decimal,
    pub gst_amount: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
}

pub fn round_for_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Totals {
    pub fn rounded(&self) -> Totals {
        Totals {
            subtotal: round_for_display(self.subtotal),
            markup_amount: round_for_display(self.markup_amount),
            gst_amount: round_for_display(self.gst_amount),
            discount_amount: round_for_display(self.discount_amount),
            grand_total: round_for_display(self.grand_total),
        }
    }

    /// Grand total split across paying travelers (infants excluded).
    pub fn per_person(&self, paying_travelers: u32) -> Option<Decimal> {
        if paying_travelers == 0 {
            return None;
        }
        Some(round_for_display(
            self.grand_total / Decimal::from(paying_travelers),
        ))
    }
}
