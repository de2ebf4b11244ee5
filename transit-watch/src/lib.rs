//! Commute route watcher.
//!
//! Polls a transport.rest instance for the itineraries of configured
//! routes, works out delays, transfer risk and better alternatives, and
//! announces what matters through notifications, events and an HTTP API.

pub mod alerts;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod entity;
pub mod poller;
pub mod transport;
pub mod web;
