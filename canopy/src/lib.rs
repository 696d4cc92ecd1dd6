//! Client core for taxonomy graph management.
//!
//! Canopy talks to an upstream taxonomy REST API and turns its flat
//! node+link graph exports into rooted trees ready for a virtualized
//! renderer, with a session-scoped export cache, an explicit selection state
//! machine, and a non-mutating search/filter view.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod selection;
pub mod services;
pub mod session;
pub mod tree;

pub use cache::ExportCache;
pub use client::{NodeQuery, TaxonomyApiClient};
pub use config::{ApiConfig, Config};
pub use error::{CanopyError, Result};
pub use selection::{SelectionCoordinator, SelectionEffect, SelectionEvent};
pub use services::TaxonomyService;
pub use session::{TaxonomySession, UrlState};
pub use tree::{materialize, FilteredView, TreeFilter, TreeNode};
