use serde::Deserialize;

/// Application configuration loaded from environment variables
///
/// Both credentials are optional: without a YouTube API key the pipeline
/// still produces count-only statistics, and without a Data Portability
/// access token only file-based import is available.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// YouTube Data API v3 key used for video/channel enrichment
    #[serde(default)]
    pub youtube_api_key: Option<String>,

    /// OAuth bearer token for the Data Portability API download flow
    #[serde(default)]
    pub google_access_token: Option<String>,

    /// YouTube Data API base URL
    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,

    /// Data Portability API base URL
    #[serde(default = "default_portability_api_url")]
    pub portability_api_url: String,
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_portability_api_url() -> String {
    "https://dataportability.googleapis.com/v1".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_urls() {
        assert_eq!(
            default_youtube_api_url(),
            "https://www.googleapis.com/youtube/v3"
        );
        assert_eq!(
            default_portability_api_url(),
            "https://dataportability.googleapis.com/v1"
        );
    }
}
