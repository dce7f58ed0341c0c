//! Terminal stock watchlist: tracked symbols persist between sessions, quotes
//! and price history come from a backend HTTP API, and the chart panel can
//! overlay a 7-day prediction on the history.

pub mod api;
pub mod app;
pub mod chart;
pub mod config;
pub mod input;
pub mod logging;
pub mod period;
pub mod store;
pub mod ui;
pub mod watchlist;
