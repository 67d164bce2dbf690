#[cfg(test)]
mod config_tests {
    use crate::config::{
        default_carts_table, default_catalog_path, default_host, default_log_level,
        default_max_request_size, default_port, default_region, default_service_name,
        default_storage_backend, default_storage_dir, default_timeout, Config, ConfigError,
        ServerConfig, StorageBackend, StorageConfig,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_env_map(HashMap::new()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.server.max_request_size, 1024 * 1024);
        assert_eq!(config.catalog.catalog_path, "data/Category.csv");
        assert_eq!(config.storage.backend().unwrap(), StorageBackend::Memory);
        assert_eq!(config.storage.storage_dir, "data/carts");
        assert_eq!(config.storage.carts_table_name, "FarmTradeCarts");
        assert_eq!(config.storage.region, "us-west-2");
        assert_eq!(config.observability.service_name, "farmtrade-rs");
        assert_eq!(config.observability.otlp_endpoint, None);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.enable_json_logging);
    }

    #[test]
    fn test_config_from_env_map() {
        let config = Config::from_env_map(vars(&[
            ("FARMTRADE_HOST", "127.0.0.1"),
            ("FARMTRADE_PORT", "9000"),
            ("FARMTRADE_REQUEST_TIMEOUT_SECONDS", "5"),
            ("FARMTRADE_CATALOG_PATH", "/srv/Category.csv"),
            ("FARMTRADE_STORAGE_BACKEND", "file"),
            ("FARMTRADE_STORAGE_DIR", "/var/lib/carts"),
            ("FARMTRADE_SERVICE_NAME", "test-service"),
            ("FARMTRADE_OTLP_ENDPOINT", "http://collector:4317"),
            ("FARMTRADE_LOG_LEVEL", "debug"),
            ("FARMTRADE_ENABLE_JSON_LOGGING", "true"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.catalog.catalog_path, "/srv/Category.csv");
        assert_eq!(config.storage.backend().unwrap(), StorageBackend::File);
        assert_eq!(config.storage.storage_dir, "/var/lib/carts");
        assert_eq!(config.observability.service_name, "test-service");
        assert_eq!(
            config.observability.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.enable_json_logging);
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let result = Config::from_env_map(vars(&[("FARMTRADE_PORT", "0")]));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = Config::from_env_map(vars(&[("FARMTRADE_REQUEST_TIMEOUT_SECONDS", "0")]));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_empty_catalog_path_is_rejected() {
        let result = Config::from_env_map(vars(&[("FARMTRADE_CATALOG_PATH", "  ")]));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result = Config::from_env_map(vars(&[("FARMTRADE_STORAGE_BACKEND", "redis")]));
        match result {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains("redis"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamodb_backend_requires_table_name() {
        let result = Config::from_env_map(vars(&[
            ("FARMTRADE_STORAGE_BACKEND", "dynamodb"),
            ("FARMTRADE_CARTS_TABLE_NAME", ""),
        ]));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));

        let config = Config::from_env_map(vars(&[("FARMTRADE_STORAGE_BACKEND", "DynamoDB")]))
            .unwrap();
        assert_eq!(config.storage.backend().unwrap(), StorageBackend::DynamoDb);
    }

    #[test]
    fn test_non_numeric_port_fails_to_load() {
        let result = Config::from_env_map(vars(&[("FARMTRADE_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::LoadError { .. })));
    }

    #[test]
    fn test_server_config_request_timeout() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 8080,
            request_timeout_seconds: 45,
            max_request_size: 1024,
        };

        assert_eq!(config.request_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_storage_backend_display_and_parse() {
        for backend in [
            StorageBackend::Memory,
            StorageBackend::File,
            StorageBackend::DynamoDb,
        ] {
            assert_eq!(backend.to_string().parse::<StorageBackend>(), Ok(backend));
        }
        assert!("sqlite".parse::<StorageBackend>().is_err());

        let storage = StorageConfig {
            storage_backend: "FILE".to_string(),
            storage_dir: "carts".to_string(),
            carts_table_name: "t".to_string(),
            region: "r".to_string(),
        };
        assert_eq!(storage.backend().unwrap(), StorageBackend::File);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_max_request_size(), 1024 * 1024);
        assert_eq!(default_catalog_path(), "data/Category.csv");
        assert_eq!(default_storage_backend(), "memory");
        assert_eq!(default_storage_dir(), "data/carts");
        assert_eq!(default_carts_table(), "FarmTradeCarts");
        assert_eq!(default_region(), "us-west-2");
        assert_eq!(default_service_name(), "farmtrade-rs");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::ValidationError {
            message: "Server port cannot be 0".to_string(),
        };
        assert_eq!(error.to_string(), "Validation error: Server port cannot be 0");
    }
}
