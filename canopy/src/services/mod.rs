mod taxonomy;

pub use taxonomy::TaxonomyService;
