pub mod catalog;
pub mod custom_activity;
pub mod day_selection;
pub mod envelope;
pub mod pricing;
pub mod quotation;
