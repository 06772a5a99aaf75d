use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use nr_core::{Result, Settings, Team, TeamSource};

#[derive(Deserialize)]
struct TeamsResponse {
    teams: Option<Vec<SportsDbTeam>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SportsDbTeam {
    id_team: Option<String>,
    str_team: Option<String>,
    str_location: Option<String>,
    str_stadium: Option<String>,
    str_league: Option<String>,
}

impl SportsDbTeam {
    fn into_team(self) -> Option<Team> {
        let name = non_empty(self.str_team)?;
        Some(Team {
            id: non_empty(self.id_team).unwrap_or_else(|| name.clone()),
            name,
            location: non_empty(self.str_location),
            venue: non_empty(self.str_stadium),
            league: non_empty(self.str_league),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// TheSportsDB team directory.
#[derive(Debug, Clone)]
pub struct SportsDbSource {
    client: Client,
    base_url: String,
}

impl SportsDbSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.sports_db_url.clone(), settings.request_timeout())
    }

    async fn search_all_teams(&self, league: &str) -> Result<Vec<Team>> {
        let url = Url::parse_with_params(
            &format!("{}/search_all_teams.php", self.base_url),
            &[("l", league)],
        )
        .map_err(|e| nr_core::Error::InvalidConfig(format!("Invalid SportsDB url: {}", e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<TeamsResponse>()
            .await?;

        Ok(response
            .teams
            .unwrap_or_default()
            .into_iter()
            .filter_map(SportsDbTeam::into_team)
            .collect())
    }
}

#[async_trait]
impl TeamSource for SportsDbSource {
    async fn fetch_teams(&self, league: &str) -> Vec<Team> {
        match self.search_all_teams(league).await {
            Ok(teams) => {
                tracing::info!("🏟️ Loaded {} teams for league '{}'", teams.len(), league);
                teams
            }
            Err(e) => {
                tracing::error!("Error fetching sports data for '{}': {}", league, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_team_without_name_is_skipped() {
        let team = SportsDbTeam {
            id_team: Some("1".to_string()),
            str_team: Some("  ".to_string()),
            str_location: None,
            str_stadium: None,
            str_league: None,
        };
        assert!(team.into_team().is_none());
    }

    #[tokio::test]
    async fn test_fetch_teams() {
        let app = Router::new().route(
            "/search_all_teams.php",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("l").map(String::as_str), Some("NBA"));
                Json(serde_json::json!({
                    "teams": [
                        {"idTeam": "134860", "strTeam": "Boston Celtics", "strLocation": "Boston",
                         "strStadium": "TD Garden", "strLeague": "NBA"},
                        {"idTeam": "134867", "strTeam": "Los Angeles Lakers", "strLocation": "Los Angeles",
                         "strStadium": "", "strLeague": "NBA"}
                    ]
                }))
            }),
        );
        let source = SportsDbSource::new(serve(app).await, Duration::from_secs(5)).unwrap();

        let teams = source.fetch_teams("NBA").await;
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].venue.as_deref(), Some("TD Garden"));
        assert_eq!(teams[1].venue, None);
    }

    #[tokio::test]
    async fn test_null_teams_is_empty() {
        let app = Router::new().route(
            "/search_all_teams.php",
            get(|| async { Json(serde_json::json!({"teams": null})) }),
        );
        let source = SportsDbSource::new(serve(app).await, Duration::from_secs(5)).unwrap();
        assert!(source.fetch_teams("Unknown League").await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_empty() {
        let source = SportsDbSource::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        assert!(source.fetch_teams("NBA").await.is_empty());
    }
}
