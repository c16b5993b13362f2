use log::info;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod crud;
pub mod memory;
pub mod model;

pub use model::*;

use crate::config::DatabaseOptions;

pub type Database = PgPool;

pub async fn init_db(opts: &DatabaseOptions) -> Result<Database, sqlx::Error> {
    info!(
        "初始化数据库连接: {}@{}:{}/{}",
        opts.db_user, opts.db_host, opts.db_port, opts.db_name
    );

    let options = PgConnectOptions::new()
        .host(&opts.db_host)
        .port(opts.db_port)
        .database(&opts.db_name)
        .username(&opts.db_user)
        .password(&opts.db_password);

    let pool = PgPoolOptions::new().max_connections(opts.max_connections).connect_with(options).await?;

    info!("检查人脸表: {}", opts.population);
    crud::create_population(&pool, &opts.population).await?;

    Ok(pool)
}
