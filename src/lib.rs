//! Crate entrypoint wiring together the webhook API, the solvers, and the
//! Selectel DNS client.

pub mod api;
pub mod config;
pub mod dns;
pub mod error;
pub mod provider;
pub mod secrets;
pub mod selectel;
pub mod solver;
pub mod validation;

use solver::Solver;

use std::sync::Arc;

/// Complete application dependencies shared across handlers.
pub struct AppState {
    /// API group the webhook is registered under, e.g. `acme.example.com`.
    pub group_name: String,
    pub solvers: Vec<Arc<dyn Solver>>,
}

impl AppState {
    pub fn solver(&self, name: &str) -> Option<&Arc<dyn Solver>> {
        self.solvers.iter().find(|s| s.name() == name)
    }
}

/// Arc-wrapped version of `AppState` passed into Axum extensions.
pub type SharedState = Arc<AppState>;
