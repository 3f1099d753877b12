//! TOML configuration file loading

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::FederatedDelivery;
use crate::types::SchemaId;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./mockify.toml",
    "~/.config/mockify/config.toml",
    "/etc/mockify/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            let Ok(home) = std::env::var("HOME") else {
                continue;
            };
            PathBuf::from(path_str.replacen('~', &home, 1))
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(jwt) = config.jwt {
        if let Some(secret) = jwt.secret {
            builder = builder.jwt_secret(secret);
        }
        if let Some(ms) = jwt.access_expiration_ms {
            builder = builder.access_token_ttl(Duration::from_millis(ms));
        }
        if let Some(ms) = jwt.refresh_expiration_ms {
            builder = builder.refresh_token_ttl(Duration::from_millis(ms));
        }
        if let Some(issuer) = jwt.issuer {
            builder = builder.issuer(issuer);
        }
        if let Some(audience) = jwt.audience {
            builder = builder.audience(audience);
        }
        if let Some(secs) = jwt.leeway_secs {
            builder = builder.leeway(Duration::from_secs(secs));
        }
    }

    if let Some(oauth2) = config.oauth2 {
        if let Some(url_str) = oauth2.frontend_url {
            let url = Url::parse(&url_str)
                .map_err(|e| crate::Error::Config(format!("Invalid frontend URL: {e}")))?;
            builder = builder.frontend_url(url);
        }
        if let Some(mode) = oauth2.delivery {
            let delivery: FederatedDelivery = mode.parse().unwrap_or_default();
            builder = builder.delivery(delivery);
        }
        if let Some(secure) = oauth2.secure_cookie {
            builder = builder.secure_cookie(secure);
        }
    }

    if let Some(http) = config.http {
        if let Some(host_str) = http.host
            && let Ok(host) = host_str.parse::<IpAddr>()
        {
            builder = builder.http_host(host);
        }
        if let Some(port) = http.port {
            builder = builder.http_port(port);
        }
        if let Some(origin) = http.cors_origin {
            builder = builder.cors_origin(Some(origin));
        }
    }

    if let Some(public) = config.public
        && let Some(ids) = public.schema_ids
    {
        builder = builder.public_schema_ids(ids);
    }

    if let Some(obs) = config.observability {
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }
        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    jwt: Option<JwtFileConfig>,
    oauth2: Option<OAuth2FileConfig>,
    http: Option<HttpFileConfig>,
    public: Option<PublicFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct JwtFileConfig {
    secret: Option<String>,
    access_expiration_ms: Option<u64>,
    refresh_expiration_ms: Option<u64>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAuth2FileConfig {
    frontend_url: Option<String>,
    delivery: Option<String>,
    secure_cookie: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct HttpFileConfig {
    host: Option<String>,
    port: Option<u16>,
    cors_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicFileConfig {
    schema_ids: Option<Vec<SchemaId>>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[jwt]
secret = "file-secret"
access_expiration_ms = 900000
refresh_expiration_ms = 604800000
issuer = "mockify-api"
audience = "mockify-web"

[oauth2]
frontend_url = "https://app.mockify.dev"
delivery = "redirect"

[http]
host = "0.0.0.0"
port = 9090

[public]
schema_ids = [1, 2, 5]

[observability]
log_level = "debug"
json_logs = true
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();
        assert!(config.jwt.is_some());
        assert!(config.oauth2.is_some());
        assert!(config.http.is_some());
        assert!(config.public.is_some());
        assert!(config.observability.is_some());

        let jwt = config.jwt.unwrap();
        assert_eq!(jwt.secret.as_deref(), Some("file-secret"));
        assert_eq!(jwt.access_expiration_ms, Some(900_000));
    }

    #[test]
    fn test_load_from_file_success() {
        let temp_file = create_temp_config(
            r#"
[jwt]
secret = "file-secret"
access_expiration_ms = 120000
leeway_secs = 5

[oauth2]
frontend_url = "https://app.mockify.dev"
delivery = "json"
secure_cookie = false
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.jwt.secret, "file-secret");
        assert_eq!(config.jwt.access_token_ttl, Duration::from_secs(120));
        assert_eq!(config.jwt.leeway, Duration::from_secs(5));
        assert_eq!(config.federated.frontend_url.host_str(), Some("app.mockify.dev"));
        assert_eq!(config.federated.delivery, FederatedDelivery::Json);
        assert!(!config.federated.secure_cookie);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(
            Path::new("/nonexistent/path/config.toml"),
            ConfigBuilder::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_invalid_frontend_url() {
        let temp_file = create_temp_config(
            r#"
[oauth2]
frontend_url = "not a valid url"
"#,
        );
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Invalid frontend URL"));
    }

    #[test]
    fn test_load_http_and_public_sections() {
        let temp_file = create_temp_config(
            r#"
[jwt]
secret = "s"

[http]
host = "192.168.1.1"
port = 8888
cors_origin = "http://localhost:3000"

[public]
schema_ids = [10]
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.http.host, "192.168.1.1".parse::<IpAddr>().unwrap());
        assert_eq!(config.http.port, 8888);
        assert_eq!(config.http.cors_origin.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.public.schema_ids, BTreeSet::from([10]));
    }

    #[test]
    fn test_load_invalid_http_host_ignored() {
        let temp_file = create_temp_config(
            r#"
[jwt]
secret = "s"

[http]
host = "not_an_ip"
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.http.host, "127.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_load_observability_config() {
        let temp_file = create_temp_config(
            r#"
[jwt]
secret = "s"

[observability]
log_level = "trace"
json_logs = true
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.telemetry.log_level, "trace");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_empty_config_file() {
        let temp_file = create_temp_config("");
        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_find_config_file_not_found() {
        let result = find_config_file();
        assert!(result.is_none() || result.unwrap().exists());
    }
}
