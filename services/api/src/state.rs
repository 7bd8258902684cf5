//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the single progress
//! controller and the loaded configuration.

use crate::config::Config;
use rise_core::ProgressController;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub controller: ProgressController,
    pub config: Arc<Config>,
}
