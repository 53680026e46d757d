// Library for tests to access modules

pub mod aggregation;
pub mod cache;
pub mod collectors;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod models;
pub mod parse;
pub mod routes;
pub mod scraper;
pub mod trace;
pub mod version;
