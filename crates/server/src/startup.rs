use std::{future::Future, net::SocketAddr, sync::Arc};

use configs::AppConfig;
use models::validation::CustomerValidator;
use service::customer::{repo::SeaOrmCustomerRepository, CustomerInput, CustomerService};
use tokio::{net::TcpListener, sync::watch};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::grpc;
use crate::routes;
use crate::state::{AppState, Customers};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(host: &str, port: u16) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("{host}:{port}: {e}")))
}

/// Connect the store, apply migrations, seed demo data and wrap it all in the
/// customer service.
pub async fn build_customers(cfg: &AppConfig) -> anyhow::Result<Customers> {
    common::env::ensure_sqlite_dir(&cfg.database.url).await?;
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.run_migrations {
        models::db::migrate(&db).await?;
        info!("migrations applied");
    }

    let validator = Arc::new(CustomerValidator::new()?);
    let service = CustomerService::new(Arc::new(SeaOrmCustomerRepository::new(db)), validator);

    if cfg.seed.enabled {
        let records = cfg
            .seed
            .customers
            .iter()
            .map(|c| CustomerInput::new(c.name.clone(), c.email.clone()))
            .collect::<Vec<_>>();
        let created = service.seed(records).await?;
        info!(created, "seed finished");
    }
    Ok(Arc::new(service))
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Serve HTTP (REST, GraphQL, SOAP) and gRPC until `shutdown` resolves or
/// either listener fails.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let customers = build_customers(&cfg).await?;

    let http_addr = bind_addr(&cfg.server.host, cfg.server.port)?;
    let grpc_addr = bind_addr(&cfg.server.host, cfg.server.grpc_port())?;

    let state = AppState::new(Arc::clone(&customers));
    let app = routes::build_router(state, build_cors());
    let listener = TcpListener::bind(http_addr)
        .await
        .map_err(|source| StartupError::Bind { addr: http_addr.to_string(), source })?;
    info!(%http_addr, %grpc_addr, "starting server crate");

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown.await;
        let _ = tx.send(true);
    });

    let http = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(stopped(rx.clone()))
            .await
            .map_err(StartupError::Http)
    };
    let grpc = grpc::serve_grpc(grpc_addr, customers, stopped(rx.clone()));
    tokio::try_join!(http, grpc)?;
    info!("listeners stopped");
    Ok(())
}

/// Public entry: run until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    run_until(cfg, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::customer::CustomerOperations;

    #[test]
    fn bind_addr_rejects_hostnames() {
        assert!(bind_addr("127.0.0.1", 8080).is_ok());
        assert!(matches!(bind_addr("not a host", 8080), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn build_customers_seeds_in_memory_store() -> anyhow::Result<()> {
        let mut cfg = AppConfig::default();
        cfg.database.url = "sqlite::memory:".into();
        let customers = build_customers(&cfg).await?;
        let all = customers.list().await?;
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["momo", "moha", "zakia", "ali"]);
        Ok(())
    }
}
