use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub create_tables: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving audit reports and bound contracts
    pub uploads_dir: PathBuf,
    /// Contract template; never modified by the pipeline
    pub contract_path: PathBuf,
    /// Validator program and leading arguments; the bound contract path is appended
    pub validator_command: Vec<String>,
    /// Maximum concurrent validator processes
    pub validator_workers: usize,
    /// Unbounded when None
    pub validation_timeout_secs: Option<u64>,
    pub forward_url: String,
    pub forward_timeout_secs: u64,
    /// Append a random suffix to timestamp-derived audit names
    pub unique_audit_names: bool,
}

impl PipelineConfig {
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    pub fn validation_timeout(&self) -> Option<Duration> {
        self.validation_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("DATAPRODUCT_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_CREATE_TABLES") {
            self.database.create_tables = v.parse().unwrap_or(self.database.create_tables);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Pipeline overrides
        if let Ok(v) = env::var("PIPELINE_UPLOADS_DIR") {
            self.pipeline.uploads_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PIPELINE_CONTRACT_PATH") {
            self.pipeline.contract_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("PIPELINE_VALIDATOR_COMMAND") {
            let command: Vec<String> = v.split_whitespace().map(str::to_string).collect();
            if !command.is_empty() {
                self.pipeline.validator_command = command;
            }
        }
        if let Ok(v) = env::var("PIPELINE_VALIDATOR_WORKERS") {
            self.pipeline.validator_workers = v.parse().unwrap_or(self.pipeline.validator_workers);
        }
        if let Ok(v) = env::var("PIPELINE_VALIDATION_TIMEOUT_SECS") {
            self.pipeline.validation_timeout_secs = v.parse().ok();
        }
        if let Ok(v) = env::var("PIPELINE_FORWARD_URL") {
            self.pipeline.forward_url = v;
        }
        if let Ok(v) = env::var("PIPELINE_FORWARD_TIMEOUT_SECS") {
            self.pipeline.forward_timeout_secs = v.parse().unwrap_or(self.pipeline.forward_timeout_secs);
        }
        if let Ok(v) = env::var("PIPELINE_UNIQUE_AUDIT_NAMES") {
            self.pipeline.unique_audit_names = v.parse().unwrap_or(self.pipeline.unique_audit_names);
        }

        self
    }

    fn pipeline_defaults(forward_url: &str) -> PipelineConfig {
        PipelineConfig {
            uploads_dir: PathBuf::from("uploads"),
            contract_path: PathBuf::from("contracts/datacontract.yaml"),
            validator_command: vec!["datacontract".to_string(), "test".to_string()],
            validator_workers: 1,
            validation_timeout_secs: None,
            forward_url: forward_url.to_string(),
            forward_timeout_secs: 10,
            unique_audit_names: true,
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 8000 },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                create_tables: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
            pipeline: Self::pipeline_defaults("http://localhost:8080/api/dashboard"),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8000 },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                create_tables: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            pipeline: PipelineConfig {
                validation_timeout_secs: Some(300),
                ..Self::pipeline_defaults("https://staging.example.com/api/dashboard")
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8000 },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                create_tables: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            pipeline: PipelineConfig {
                validation_timeout_secs: Some(300),
                ..Self::pipeline_defaults("https://app.example.com/api/dashboard")
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
