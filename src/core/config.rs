use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::shared::constants::DEFAULT_FILE_FIELD_TYPES;

#[derive(Debug, Clone)]
pub struct Config {
    pub core_api: CoreApiConfig,
    pub worker: WorkerConfig,
    pub log: LogConfig,
    pub minio: MinIOConfig,
}

/// Upstream ("core") service location, route prefixes and service account
#[derive(Clone)]
pub struct CoreApiConfig {
    pub base_url: String,
    pub auth_route: String,
    pub report_route: String,
    pub store_route: String,
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    /// Directory holding rendered artifacts between render and upload
    pub temp_dir: PathBuf,
    /// Field types whose value is a comma-separated list of stored object ids
    pub file_field_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub directory: PathBuf,
}

/// MinIO/S3 storage configuration for report artifacts
#[derive(Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL used for unsigned links (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix for uploaded report artifacts
    pub report_prefix: String,
    /// Return plain public URLs instead of presigned ones
    pub public_links: bool,
    pub presigned_url_expiry_secs: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            core_api: CoreApiConfig::from_env()?,
            worker: WorkerConfig::from_env()?,
            log: LogConfig::from_env(),
            minio: MinIOConfig::from_env()?,
        })
    }
}

impl CoreApiConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("CORE_URL")
            .map_err(|_| "CORE_URL environment variable is required".to_string())?
            .trim_end_matches('/')
            .to_string();

        let auth_route = env::var("ROUTE_OF_CORE_FOR_AUTH").unwrap_or_else(|_| "/auth".to_string());
        let report_route =
            env::var("ROUTE_OF_CORE_FOR_REPORT").unwrap_or_else(|_| "/reports".to_string());
        let store_route =
            env::var("ROUTE_OF_CORE_FOR_STORE").unwrap_or_else(|_| "/stores".to_string());

        let username = env::var("SYS_USERNAME")
            .map_err(|_| "SYS_USERNAME environment variable is required".to_string())?;
        let password = env::var("SYS_PASSWORD")
            .map_err(|_| "SYS_PASSWORD environment variable is required".to_string())?;

        let request_timeout_secs = env::var("CORE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "CORE_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            base_url,
            auth_route,
            report_route,
            store_route,
            username,
            password,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Join the base URL, a route prefix and an endpoint path
    pub fn endpoint(&self, route: &str, path: &str) -> String {
        format!("{}{}{}", self.base_url, route, path)
    }
}

// Keep the service password out of debug output.
impl std::fmt::Debug for CoreApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreApiConfig")
            .field("base_url", &self.base_url)
            .field("auth_route", &self.auth_route)
            .field("report_route", &self.report_route)
            .field("store_route", &self.store_route)
            .field("username", &self.username)
            .field("password", &"***")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl WorkerConfig {
    const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "POLL_INTERVAL_SECS must be a valid number".to_string())?;

        let temp_dir = env::var("TEMP_DIRECTORY").unwrap_or_else(|_| "./temp".to_string());

        let file_field_types = parse_list(
            &env::var("FILE_FIELD_TYPES").unwrap_or_else(|_| DEFAULT_FILE_FIELD_TYPES.to_string()),
        );

        Ok(Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            temp_dir: PathBuf::from(temp_dir),
            file_field_types,
        })
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let directory = env::var("LOG_DIRECTORY").unwrap_or_else(|_| "./logs".to_string());
        Self {
            directory: PathBuf::from(directory),
        }
    }
}

impl MinIOConfig {
    // S3 SigV4 presigned URLs cannot outlive 7 days
    const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u32 = 604_800;

    pub fn from_env() -> Result<Self, String> {
        let endpoint = env::var("MINIO_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:9000".to_string())
            .trim_end_matches('/')
            .to_string();

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint = env::var("MINIO_PUBLIC_ENDPOINT")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "reports".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let report_prefix = env::var("MINIO_REPORT_PREFIX")
            .unwrap_or_else(|_| "reports".to_string())
            .trim_matches('/')
            .to_string();

        let public_links = parse_bool(
            "MINIO_PUBLIC_LINKS",
            &env::var("MINIO_PUBLIC_LINKS").unwrap_or_else(|_| "false".to_string()),
        )?;

        let presigned_url_expiry_secs = env::var("MINIO_PRESIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PRESIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "MINIO_PRESIGNED_URL_EXPIRY_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            report_prefix,
            public_links,
            presigned_url_expiry_secs,
        })
    }
}

impl std::fmt::Debug for MinIOConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinIOConfig")
            .field("endpoint", &self.endpoint)
            .field("public_endpoint", &self.public_endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("report_prefix", &self.report_prefix)
            .field("public_links", &self.public_links)
            .field("presigned_url_expiry_secs", &self.presigned_url_expiry_secs)
            .finish_non_exhaustive()
    }
}

/// Split a comma-separated list, trimming and lowercasing entries
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!("{} must be a boolean", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_normalizes_entries() {
        assert_eq!(
            parse_list(" File, IMAGE ,,signature"),
            vec!["file", "image", "signature"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("X", "true"), Ok(true));
        assert_eq!(parse_bool("X", " Yes "), Ok(true));
        assert_eq!(parse_bool("X", "0"), Ok(false));
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn test_core_endpoint_joins_route_and_path() {
        let config = CoreApiConfig {
            base_url: "http://core.local/api".to_string(),
            auth_route: "/auth".to_string(),
            report_route: "/reports".to_string(),
            store_route: "/stores".to_string(),
            username: "runner".to_string(),
            password: "secret".to_string(),
            request_timeout: Duration::from_secs(5),
        };
        assert_eq!(
            config.endpoint(&config.report_route, "/not-delivered"),
            "http://core.local/api/reports/not-delivered"
        );
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
