//! busdash: a headless bus-transport operations dashboard.
//!
//! The [`dashboard::Dashboard`] controller owns the session, navigation and
//! the metric refresh loop. Time is virtual and only moves when the caller
//! advances it, which keeps every transition deterministic under test.

pub mod activity;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod metrics;
pub mod scheduler;
pub mod view;
