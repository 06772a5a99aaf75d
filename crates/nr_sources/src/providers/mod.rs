pub mod newsapi;
pub mod sportsdb;

pub use newsapi::NewsApiSource;
pub use sportsdb::SportsDbSource;
