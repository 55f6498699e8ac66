use std::{future::IntoFuture, process, sync::Arc};

use taskdeck::{
    application::error::AppError,
    application::repos::{TasksRepo, TasksWriteRepo},
    application::tasks::TaskService,
    cache::{ItemCache, TaggedCache},
    config,
    infra::{
        cache::build_cache_client,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(args) => run_seed(settings, args).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let tasks = build_task_service(repositories.clone(), &settings)?;
    let state = AppState::new(tasks, repositories);

    serve_http(&settings, state).await
}

async fn run_seed(settings: config::Settings, args: config::SeedArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let tasks = build_task_service(repositories, &settings)?;

    let created = tasks
        .seed(args.count)
        .await
        .map_err(|err| AppError::unexpected(format!("seeding failed: {err}")))?;

    info!(
        target = "taskdeck::seed",
        count = created.len(),
        "Seeded placeholder tasks"
    );
    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "taskdeck::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::store(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::store(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_task_service(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<TaskService, AppError> {
    let client = build_cache_client(&settings.cache)?;
    let reader: Arc<dyn TasksRepo> = repositories.clone();
    let writer: Arc<dyn TasksWriteRepo> = repositories;

    Ok(TaskService::new(
        reader,
        writer,
        ItemCache::new(client.clone()),
        TaggedCache::new(client),
    ))
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "taskdeck::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        _ = tokio::signal::ctrl_c() => {
            info!(target = "taskdeck::http", "Shutdown requested; draining connections");
            shutdown.notify_one();
        }
    }

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        Err(_) => {
            warn!(
                target = "taskdeck::http",
                timeout = ?settings.server.graceful_shutdown,
                "Graceful shutdown timed out"
            );
            Ok(())
        }
    }
}
