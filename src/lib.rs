//! locmap - Geocode addresses with LocationIQ and print or map the results

pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod present;
