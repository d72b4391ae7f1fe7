use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid listen address {0:?}")]
    ListenAddr(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub listen_addr: String,
    pub database_url: String,
    pub max_connections: u32,
    /// Comma separated origins, `*` allows any.
    pub cors_origins: String,
}

impl Settings {
    /// Defaults, then an optional `trivia.toml`, then `TRIVIA_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let settings: Settings = Self::builder()?
            .add_source(config::File::with_name("trivia").required(false))
            .add_source(config::Environment::with_prefix("TRIVIA"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("database_url", "sqlite:trivia.db")?
            .set_default("max_connections", 5)?
            .set_default("cors_origins", "*")?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|_| ConfigError::ListenAddr(self.listen_addr.clone()))?;
        Ok(())
    }

    /// `None` means any origin.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Settings {
        Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let settings = defaults();
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
        assert_eq!(settings.max_connections, 5);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.cors_origins(), None);
    }

    #[test]
    fn parses_origin_list() {
        let settings = Settings {
            cors_origins: "http://localhost:3000, https://trivia.example ,".to_owned(),
            ..defaults()
        };
        assert_eq!(
            settings.cors_origins(),
            Some(vec![
                "http://localhost:3000".to_owned(),
                "https://trivia.example".to_owned()
            ])
        );
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let settings = Settings {
            listen_addr: "localhost".to_owned(),
            ..defaults()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ListenAddr(_))
        ));
    }
}
