//! Kiosk daemon: polls the ticket and booking backend, tracks redeployments of
//! the display assets, and serves the resulting state to the display as JSON.
#![forbid(unsafe_code)]

pub mod bookings;
pub mod config;
pub mod driver;
pub mod feed;
pub mod http;
pub mod source;
pub mod watchdog;
