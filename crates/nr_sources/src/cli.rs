use clap::{Args, Subcommand};
use nr_core::{ArticleFetcher, NewsSource, Result, Settings, TeamSource};
use crate::fetcher::HtmlArticleFetcher;
use crate::providers::{NewsApiSource, SportsDbSource};

#[derive(Args, Debug)]
pub struct SourceArgs {
    #[command(subcommand)]
    pub command: SourceCommands,
}

#[derive(Subcommand, Debug)]
pub enum SourceCommands {
    /// Search news articles through NewsAPI
    News {
        /// Search query
        query: String,
        /// Number of articles to request
        #[arg(short, long)]
        page_size: Option<usize>,
    },
    /// List the teams of a league from TheSportsDB
    Teams {
        /// League name (e.g. NBA)
        league: String,
    },
    /// Download a page and print the extracted article text
    Text {
        url: String,
    },
}

pub async fn handle_command(args: SourceArgs, settings: &Settings) -> Result<()> {
    match args.command {
        SourceCommands::News { query, page_size } => {
            let source = NewsApiSource::from_settings(settings)?;
            let page_size = page_size.unwrap_or(settings.default_news_page_size);
            let articles = source.fetch_articles(&query, page_size).await?;
            println!("Found {} articles", articles.len());
            for article in articles {
                println!("📰 {} ({}) - {}", article.title, article.source_name, article.url);
            }
        }
        SourceCommands::Teams { league } => {
            let source = SportsDbSource::from_settings(settings)?;
            let teams = source.fetch_teams(&league).await;
            println!("Found {} teams", teams.len());
            for team in teams {
                println!(
                    "🏟️ {} [{}] venue: {}",
                    team.name,
                    team.id,
                    team.venue.as_deref().unwrap_or("-")
                );
            }
        }
        SourceCommands::Text { url } => {
            let fetcher = HtmlArticleFetcher::from_settings(settings)?;
            match fetcher.fetch_full_text(&url).await {
                Some(text) => println!("{}", text),
                None => eprintln!("No readable text found at {}", url),
            }
        }
    }
    Ok(())
}
