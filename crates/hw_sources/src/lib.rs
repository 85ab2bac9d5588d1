pub mod eventregistry;

pub use eventregistry::{resolve_api_key, EventRegistrySource, DEFAULT_BASE_URL};

pub mod prelude {
    pub use super::eventregistry::EventRegistrySource;
    pub use hw_core::{Article, ArticleSource, Error, FetchOutcome, FetchRequest, Result};
}
