use std::{process, sync::Arc};

use compito::{
    application::tasks::TaskService,
    config,
    infra::{
        auth::StaticTokenValidator,
        cache::RedisTaskCache,
        db::PostgresTaskStore,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_startup_error(&error);
        process::exit(1);
    }
}

fn report_startup_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "startup error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "startup error");
    });
}

async fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), InfraError> {
    let pool = PostgresTaskStore::connect(&settings.database)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresTaskStore::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    let store = PostgresTaskStore::new(pool);

    let cache = RedisTaskCache::connect(&settings.cache)
        .await
        .map_err(|err| InfraError::cache(err.to_string()))?;

    let state = AppState {
        tasks: Arc::new(TaskService::new(
            Arc::new(store.clone()),
            Arc::new(cache),
        )),
        auth: Arc::new(StaticTokenValidator::new(&settings.auth.tokens)),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr())
        .await
        .map_err(InfraError::Io)?;

    info!(
        target: "compito::serve",
        addr = %settings.server.bind_addr(),
        cache_ttl_secs = settings.cache.ttl.as_secs(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InfraError::Io)?;

    // Release backend connections; don't let a wedged checkout stall exit.
    if tokio::time::timeout(settings.server.graceful_shutdown, store.close())
        .await
        .is_err()
    {
        error!(target: "compito::serve", "database pool did not close in time");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "compito::serve", error = %err, "failed to listen for shutdown signal");
    }
}
