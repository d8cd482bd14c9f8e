use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub read_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub upstream_timeout_secs: u64,
    pub session: SessionConfig,
    pub tmdb: TmdbConfig,
    pub youtube: YouTubeConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://trailerbox.db".into());
        let session = SessionConfig {
            ttl_minutes: session_ttl(parse_env("SESSION_TTL_MINUTES"))?,
            cookie_secure: parse_env("COOKIE_SECURE").unwrap_or(true),
        };
        let tmdb = TmdbConfig {
            base_url: std::env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".into()),
            api_key: non_empty_env("TMDB_API_KEY"),
            read_token: non_empty_env("TMDB_READ_TOKEN"),
        };
        let youtube = YouTubeConfig {
            base_url: std::env::var("YOUTUBE_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".into()),
            api_key: non_empty_env("YOUTUBE_API_KEY"),
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("APP_PORT").unwrap_or(8080),
            upstream_timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS").unwrap_or(10),
            session,
            tmdb,
            youtube,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn session_ttl(raw: Option<i64>) -> anyhow::Result<i64> {
    match raw.unwrap_or(60) {
        ttl if ttl > 0 => Ok(ttl),
        ttl => anyhow::bail!("SESSION_TTL_MINUTES must be positive, got {ttl}"),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_garbage() {
        std::env::set_var("TRAILERBOX_TEST_TTL", "sixty");
        assert_eq!(parse_env::<i64>("TRAILERBOX_TEST_TTL"), None);
        std::env::set_var("TRAILERBOX_TEST_TTL", " 45 ");
        assert_eq!(parse_env::<i64>("TRAILERBOX_TEST_TTL"), Some(45));
    }

    #[test]
    fn session_ttl_defaults_to_an_hour_and_rejects_non_positive() {
        assert_eq!(session_ttl(None).unwrap(), 60);
        assert_eq!(session_ttl(Some(15)).unwrap(), 15);
        assert!(session_ttl(Some(0)).is_err());
        assert!(session_ttl(Some(-5)).is_err());
    }

    #[test]
    fn blank_keys_count_as_missing() {
        std::env::set_var("TRAILERBOX_TEST_KEY", "   ");
        assert_eq!(non_empty_env("TRAILERBOX_TEST_KEY"), None);
    }
}
