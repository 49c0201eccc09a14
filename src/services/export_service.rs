use std::fmt::{self, Write};

use crate::errors::{QuotationError, Result};
use crate::models::pricing::{round_for_display, AgencySettings, SubtotalBasis};
use crate::models::quotation::Quotation;

/// Rendered document, treated as an opaque download.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub trait DocumentExporter: Send + Sync {
    fn export(&self, title: &str, notes: &str) -> Result<ExportedDocument>;
}

pub struct PlainTextExporter;

impl DocumentExporter for PlainTextExporter {
    fn export(&self, title: &str, notes: &str) -> Result<ExportedDocument> {
        if title.trim().is_empty() {
            return Err(QuotationError::validation("title", "A document needs a title"));
        }
        let slug: String = title
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let body = format!("{}\n{}\n\n{}\n", title, "=".repeat(title.chars().count()), notes);
        Ok(ExportedDocument {
            file_name: format!("{}.txt", slug.trim_matches('-')),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: body.into_bytes(),
        })
    }
}

pub fn quotation_title(quotation: &Quotation) -> String {
    format!(
        "{} - {} ({} to {})",
        quotation.destination.name, quotation.location.name, quotation.dates.start, quotation.dates.end
    )
}

/// Free-text summary handed to the exporter along with the title.
pub fn quotation_notes(quotation: &Quotation, settings: &AgencySettings) -> Result<String> {
    let mut notes = String::new();
    write_notes(&mut notes, quotation, settings)
        .map_err(|e| QuotationError::Export(format!("could not render notes: {}", e)))?;
    Ok(notes)
}

fn write_notes(out: &mut impl Write, quotation: &Quotation, settings: &AgencySettings) -> fmt::Result {
    let currency = &settings.currency;
    let totals = quotation.totals.rounded();

    writeln!(out, "Prepared by {}", settings.agency_name)?;
    writeln!(
        out,
        "Travelers: {} adults, {} children, {} infants",
        quotation.travelers.adults, quotation.travelers.children, quotation.travelers.infants
    )?;
    writeln!(out)?;

    for day in &quotation.days {
        let date = quotation.dates.date_of(day.day);
        let title = quotation
            .itinerary
            .iter()
            .find(|entry| entry.day == day.day)
            .map(|entry| entry.title.as_str())
            .unwrap_or("Free day");
        writeln!(out, "Day {} ({}): {}", day.day, date, title)?;
        for item in quotation.items.iter().filter(|item| item.day == day.day) {
            writeln!(
                out,
                "  - {} x{}: {} {}",
                item.description,
                item.quantity,
                currency,
                round_for_display(item.total_price)
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Subtotal: {} {}", currency, totals.subtotal)?;
    writeln!(out, "Markup: {} {}", currency, totals.markup_amount)?;
    writeln!(out, "GST: {} {}", currency, totals.gst_amount)?;
    if !totals.discount_amount.is_zero() {
        writeln!(out, "Discount: -{} {}", currency, totals.discount_amount)?;
    }
    writeln!(out, "Total: {} {}", currency, totals.grand_total)?;
    if settings.pricing.subtotal_basis == SubtotalBasis::PerPerson {
        if let Some(share) = quotation.totals.per_person(quotation.travelers.paying()) {
            writeln!(out, "Per person: {} {}", currency, share)?;
        }
    }
    writeln!(out)?;
    write!(out, "{}", settings.quotation_footer)
}
