//! Staybnb - A short-term rental marketplace
//!
//! Users list spots, review them and book them for date ranges. The
//! `policy` module holds the booking conflict and authorization rules;
//! everything else is the storage and REST surface around them.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod policy;
pub mod services;
