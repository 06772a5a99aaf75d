pub mod cli;
pub mod collector;
pub mod extract;
pub mod fetcher;
pub mod providers;

pub use cli::{handle_command, SourceArgs, SourceCommands};
pub use collector::ArticleCollector;
pub use fetcher::HtmlArticleFetcher;
pub use providers::{NewsApiSource, SportsDbSource};

pub mod prelude {
    pub use super::{ArticleCollector, HtmlArticleFetcher, NewsApiSource, SportsDbSource};
    pub use nr_core::{Article, ArticleFetcher, Error, NewsSource, Result, TeamSource};
}
