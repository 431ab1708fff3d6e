//! Offline tests for vitrine-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use vitrine_core::{AppConfig, Environment};
use vitrine_db::{BannerWrite, DbError, PoolConfig, ProductFilter};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        seed_path: PathBuf::from("./config/catalog.yaml"),
        api_key_hash_salt: "salt".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        rate_limit_per_minute: 120,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn default_product_filter_is_public_and_unbounded() {
    let filter = ProductFilter::default();

    assert!(!filter.include_inactive);
    assert!(filter.price.is_unbounded());
    assert!(filter.limit.is_none());
    assert!(filter.search.is_none());
}

#[test]
fn default_banner_write_changes_nothing() {
    let write = BannerWrite::default();
    assert!(write.image.is_none());
    assert!(write.image_mobile.is_none());
    assert!(write.sort_order.is_none());
}

#[test]
fn not_found_displays_plain_message() {
    assert_eq!(DbError::NotFound.to_string(), "record not found");
}
