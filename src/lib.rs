//! Terminal dashboard for pandemic statistics.
//!
//! The library holds the data pipeline (normalization, ordering, marker
//! projection, formatting), the region selection controller that owns all
//! mutable state, and the terminal renderers that draw its view-models.

pub mod api;
pub mod app;
pub mod braille;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod logging;
pub mod map;
pub mod stats;
pub mod ui;
pub mod view;
