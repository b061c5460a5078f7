pub mod browser;
pub mod extract;
pub mod lookup;
pub mod network;
pub mod query;
pub mod session;
pub mod streeteasy;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::ChromeBrowser;
pub use lookup::ReferenceData;
pub use query::QueryTranslator;
pub use streeteasy::StreetEasyScout;
pub use traits::{ListingSource, SearchReport};
pub use types::FilterInput;
