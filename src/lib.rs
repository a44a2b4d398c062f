//! Billhook - Paddle billing-webhook ingestion service
//!
//! This library provides the core functionality for the Billhook service:
//! the webhook receiver, the Paddle payload mapper, and the SQLite-backed
//! upsert store with its migrations.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payments;
