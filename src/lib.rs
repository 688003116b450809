//! Binsight - fill forecasting and route prioritization for smart e-waste bins.
//!
//! # Overview
//!
//! Binsight tracks a fleet of smart collection bins and the recycling
//! transactions flowing through them, and serves an admin reporting API.
//! Its core is a heuristic fleet forecaster: from each bin's current fill
//! level and the time since it was last emptied, it extrapolates an hourly
//! fill rate, predicts when the bin will reach capacity, and ranks bins by
//! urgency so collection routes can be planned soonest-overflow-first.
//!
//! Forecasting and aggregation are pure functions over materialized
//! snapshots: they take an explicit evaluation instant, never read the wall
//! clock, and are safe to invoke concurrently.
//!
//! # Modules
//!
//! - [`model`]: Domain types for bins, transactions, and derived forecasts
//! - [`storage`]: SQLite storage layer
//! - [`forecast`]: Fill-rate estimation and priority ranking
//! - [`activity`]: Daily activity bucketing for dashboard charts
//! - [`stats`]: Admin report and route plan assembly
//! - [`api`]: HTTP API handlers

pub mod activity;
pub mod api;
pub mod forecast;
pub mod model;
pub mod stats;
pub mod storage;
