use std::{
    future::IntoFuture,
    io::{self, BufRead},
    process,
    sync::Arc,
};

use clap::Parser;
use taproom::{
    application::{
        Repositories,
        auth::{AdminCredentials, SessionManager, hash_password},
        error::AppError,
        forms::FormRelay,
        media::{DisabledMediaStore, MediaService, MediaStore},
    },
    config::{self, CliArgs, Command, HashPasswordArgs, Settings},
    infra::{
        cloudinary::CloudinaryStore,
        db::PostgresRepositories,
        error::InfraError,
        forms::HttpFormRelay,
        http::{self, RouterState},
        telemetry,
        uploads::LocalMediaStore,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SOURCE: &str = "taproom::main";

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
    let _ = dotenvy::dotenv();
    let cli_args = CliArgs::parse();

    // Hashing needs no configuration, so it must work before any is written.
    if let Some(Command::HashPassword(args)) = &cli_args.command {
        return run_hash_password(args);
    }

    let settings = config::load(&cli_args)
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;
    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Some(Command::Migrate(_)) => run_migrate(&settings).await,
        Some(Command::Serve(_)) | None => run_serve(settings).await,
        Some(Command::HashPassword(_)) => Ok(()),
    }
}

fn run_hash_password(args: &HashPasswordArgs) -> Result<(), AppError> {
    let password = match args.password.clone() {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|err| AppError::from(InfraError::Io(err)))?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }

    let hash = hash_password(&password).map_err(|err| AppError::unexpected(err.to_string()))?;
    println!("{hash}");
    Ok(())
}

async fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let pool = PostgresRepositories::connect(&settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = SOURCE, "migrations applied");
    Ok(())
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let pool = PostgresRepositories::connect(&settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    let repositories = Repositories::from_shared(Arc::new(PostgresRepositories::new(pool)));

    let media = build_media_service(&settings)?;
    let relay = build_form_relay(&settings)?;

    let credentials = Arc::new(AdminCredentials::new(
        settings.admin.username.clone(),
        settings.admin.password_hash.clone(),
        settings.admin.dev_password.clone(),
    ));
    if settings.security.is_production() && settings.admin.password_hash.is_none() {
        warn!(
            target = SOURCE,
            mode = credentials.mode(),
            "production deployment without admin.password_hash"
        );
    }
    let sessions = Arc::new(SessionManager::new(
        &settings.security.secret_key,
        settings.security.is_production(),
    ));

    let state = RouterState::new(
        &repositories,
        media,
        relay,
        sessions,
        credentials.clone(),
        settings.integrations.google_maps_api_key.clone(),
    );
    let upload_body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .unwrap_or(usize::MAX);
    let router = http::build_router(state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = SOURCE,
        addr = %settings.server.addr,
        environment = %settings.security.environment,
        admin_auth = credentials.mode(),
        "listening"
    );

    serve_until_shutdown(listener, router, settings.server.graceful_shutdown).await
}

fn build_media_service(settings: &Settings) -> Result<MediaService, AppError> {
    let local = Arc::new(
        LocalMediaStore::new(settings.uploads.media_root.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let cloud: Arc<dyn MediaStore> = match settings.cloud_storage.as_ref() {
        Some(cloud) => Arc::new(CloudinaryStore::new(cloud).map_err(AppError::from)?),
        None => Arc::new(DisabledMediaStore),
    };
    info!(
        target = SOURCE,
        backend = cloud.backend(),
        media_root = %settings.uploads.media_root.display(),
        "media storage ready"
    );
    Ok(MediaService::new(cloud, local))
}

fn build_form_relay(settings: &Settings) -> Result<Arc<dyn FormRelay>, AppError> {
    let relay = HttpFormRelay::new(&settings.forms).map_err(AppError::from)?;
    if !relay.is_configured() {
        info!(target = SOURCE, "no form relay endpoints configured");
    }
    Ok(Arc::new(relay))
}

/// Serve until ctrl-c or SIGTERM, then give in-flight requests `grace` to finish.
async fn serve_until_shutdown(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    grace: std::time::Duration,
) -> Result<(), AppError> {
    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let stop = stop.clone();
            async move { stop.notified().await }
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        () = shutdown_signal() => {}
    }

    info!(target = SOURCE, grace_secs = grace.as_secs(), "shutting down");
    stop.notify_one();
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(target = SOURCE, "graceful shutdown timed out; dropping open connections");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = SOURCE, error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = SOURCE, error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
