//! Typed extraction of member, role, training and hierarchy data from the
//! Compass membership portal.
//!
//! The tab parsers in [`tabs`] are pure functions of page bytes; the
//! [`PeopleScraper`] and [`HierarchyScraper`] orchestrators fetch pages
//! through a [`PortalClient`] and feed them in.

pub mod address;
pub mod client;
pub mod coerce;
pub mod config;
pub mod duration;
pub mod error;
pub mod hierarchy;
pub mod html;
pub mod people;
pub mod status;
pub mod tabs;
pub mod types;

pub use address::Address;
pub use client::PortalClient;
pub use config::CompassConfig;
pub use duration::{membership_duration, reduce_date_ranges, DateRange, DAYS_PER_YEAR};
pub use error::{CompassError, Result};
pub use hierarchy::{compass_restify, HierarchyLevel, HierarchyScraper, HierarchyUnit};
pub use people::PeopleScraper;
pub use tabs::{ProfileTab, RolesOptions};
pub use types::*;
