use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub recommendation: RecommendationConfig,
    pub ratings: RatingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .host
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Predicted score a film must strictly exceed to be recommended.
    pub threshold: f64,
    /// How many popular films to offer when nothing can be predicted.
    pub fallback_count: usize,
    pub default_count: usize,
    /// 0 disables the timeout.
    pub compute_timeout_ms: u64,
    /// Most recent ratings kept per user before computing; 0 keeps all.
    pub max_ratings_per_user: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsConfig {
    pub min_rating: i32,
    pub max_rating: i32,
}

impl RatingsConfig {
    pub fn contains(&self, rating: i32) -> bool {
        (self.min_rating..=self.max_rating).contains(&rating)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: num_cpus::get(),
            },
            recommendation: RecommendationConfig {
                threshold: 5.0,
                fallback_count: 10,
                default_count: 10,
                compute_timeout_ms: 5000,
                max_ratings_per_user: 0,
            },
            ratings: RatingsConfig {
                min_rating: 1,
                max_rating: 10,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;
        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("FILMREC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::info!("Config file {} not found, using default configuration", path);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rating_bounds() {
        let config = Config::default();
        assert!(config.ratings.contains(1));
        assert!(config.ratings.contains(10));
        assert!(!config.ratings.contains(0));
        assert!(!config.ratings.contains(11));
    }

    #[test]
    fn test_socket_addr() {
        let mut server = Config::default().server;
        server.host = "127.0.0.1".to_string();
        server.port = 9000;
        assert_eq!(server.socket_addr().to_string(), "127.0.0.1:9000");
    }

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let file_name = format!("filmrec-{}-{}.toml", name, std::process::id());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_partial_file_layers_over_defaults() {
        let path = write_config("partial", "[recommendation]\nthreshold = 6.5\n");
        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.recommendation.threshold, 6.5);
        assert_eq!(config.recommendation.fallback_count, 10);
        assert_eq!(config.recommendation.compute_timeout_ms, 5000);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ratings.max_rating, 10);
    }

    #[test]
    fn test_file_overrides_several_sections() {
        let path = write_config(
            "sections",
            "[server]\nport = 9090\n\n[ratings]\nmin_rating = 0\nmax_rating = 5\n",
        );
        let config = Config::load_or_default(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.ratings.contains(0));
        assert!(!config.ratings.contains(6));
        assert_eq!(config.recommendation.threshold, 5.0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("filmrec-does-not-exist.toml");
        let config = Config::load_or_default(path.to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.recommendation.threshold, 5.0);
        assert_eq!(config.recommendation.max_ratings_per_user, 0);
    }
}
