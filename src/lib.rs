//! # Hackabot
//!
//! Telegram bot and public API for the Hacka* network of hacker meetups.
//!
//! ## Features
//! - Webhook handling for group membership, activity and poll answers
//! - Profile commands over direct messages
//! - Weekly attendance polls, event reminders and a weekly summary
//! - Meetup photos uploaded by hashtag and served to hacka.network
//! - Read-only JSON API for the website

/// Webhook update types, update handlers and DM commands
pub mod bot;
/// Configuration from environment variables
pub mod config;
/// Database connection, models and migrations
pub mod database;
/// HTTP routes, the worker and the Telegram client
pub mod services;
/// Text, markdown, datetime, validation and logging helpers
pub mod utils;
