pub mod awesome_api;
pub mod caching;

pub use awesome_api::AwesomeApiProvider;
pub use caching::CachingQuoteProvider;
