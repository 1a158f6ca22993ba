pub mod activities;
pub mod admin;
pub mod analytics;
pub mod campaigns;
pub mod clients;
pub mod contracts;
pub mod deals;
pub mod goals;
pub mod health;
pub mod insights;
pub mod metrics;
pub mod notes;
pub mod organizations;
pub mod projects;
pub mod public_report;
pub mod tasks;
