pub mod aggregate;
pub mod chart;
pub mod error;
pub mod generator;
pub mod logging;
pub mod notice;
pub mod report;
pub mod store;
pub mod timing;
pub mod tui;
pub mod types;
pub mod web;
