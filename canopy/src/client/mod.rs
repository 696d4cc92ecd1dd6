mod api;

pub use api::{NodeQuery, TaxonomyApiClient};
