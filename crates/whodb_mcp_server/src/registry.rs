//! Built-in plugin registration. Each driver sits behind a feature so
//! minimal builds can drop engines they never talk to.

use std::sync::Arc;
use whodb_core::Engine;

pub fn build_engine() -> Engine {
    let mut engine = Engine::new();

    #[cfg(feature = "postgres")]
    engine.register(Arc::new(whodb_driver_postgres::PostgresPlugin::new()));

    #[cfg(feature = "mysql")]
    {
        use whodb_core::DatabaseType;
        engine.register(Arc::new(whodb_driver_mysql::MySqlPlugin::new(
            DatabaseType::MySql,
        )));
        engine.register(Arc::new(whodb_driver_mysql::MySqlPlugin::new(
            DatabaseType::MariaDb,
        )));
    }

    #[cfg(feature = "sqlite")]
    engine.register(Arc::new(whodb_driver_sqlite::SqlitePlugin::new()));

    #[cfg(feature = "clickhouse")]
    engine.register(Arc::new(whodb_driver_clickhouse::ClickHousePlugin::new()));

    #[cfg(feature = "mongodb")]
    engine.register(Arc::new(whodb_driver_mongodb::MongoDbPlugin::new()));

    #[cfg(feature = "redis")]
    engine.register(Arc::new(whodb_driver_redis::RedisPlugin::new()));

    #[cfg(feature = "elasticsearch")]
    engine.register(Arc::new(whodb_driver_elasticsearch::ElasticSearchPlugin::new()));

    engine.run_post_init_hooks();
    engine
}
