mod oauth;
pub mod twitter;

pub use twitter::{TwitterCredentials, TwitterPoster, DEFAULT_API_URL};

pub mod prelude {
    pub use super::twitter::{TwitterCredentials, TwitterPoster};
    pub use hw_core::{Error, Poster, Result};
}
