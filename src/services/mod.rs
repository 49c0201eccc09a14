pub mod agency_settings;
pub mod catalog_prices;
pub mod catalog_service;
pub mod custom_activity_registry;
pub mod export_service;
pub mod id_generator;
pub mod pricing_service;
pub mod quotation_draft;
pub mod quotation_service;
pub mod request_guard;
pub mod selection_store;
pub mod wizard;
