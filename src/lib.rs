//! Kodilink Library
//!
//! Core modules for the Kodilink media-center control bridge.

pub mod config;
pub mod connection;
pub mod error;
pub mod fuzzy;
pub mod intents;
pub mod media;
pub mod notifier;
pub mod orchestrator;
pub mod registry;
pub mod rpc;
pub mod supervisor;
pub mod triggers;
