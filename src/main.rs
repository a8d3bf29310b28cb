use std::process;
use std::sync::Arc;

use dailypoet::{
    application::{
        analytics::AnalyticsService,
        collections::CollectionService,
        comments::CommentService,
        engagement::EngagementService,
        error::AppError,
        follows::FollowService,
        notifications::NotificationService,
        posts::PostService,
        profiles::ProfileService,
        repos::{
            AnalyticsRepo, CollectionsRepo, CommentsRepo, EngagementRepo, FollowsRepo,
            NotificationsRepo, PostsRepo, SessionsRepo, TagsRepo, UsersRepo,
        },
        search::SearchService,
        sessions::SessionService,
        users::UserService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiRateLimiter, ApiState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!(target = "dailypoet::migrate", "migrations applied");
    Ok(())
}

async fn connect(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect(settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApiState, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let engagement_repo: Arc<dyn EngagementRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let collections_repo: Arc<dyn CollectionsRepo> = repositories.clone();
    let notifications_repo: Arc<dyn NotificationsRepo> = repositories.clone();
    let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );

    let session_ttl = time::Duration::seconds(settings.sessions.ttl.as_secs() as i64);
    let sessions = SessionService::new(sessions_repo, users_repo.clone(), session_ttl);
    let users = UserService::new(users_repo.clone());
    let notifications = NotificationService::new(notifications_repo);
    let posts = PostService::new(posts_repo.clone(), tags_repo.clone());
    let comments = CommentService::new(
        comments_repo.clone(),
        posts_repo.clone(),
        notifications.clone(),
    );
    let engagement = EngagementService::new(
        engagement_repo,
        posts_repo.clone(),
        comments_repo,
        notifications.clone(),
    );
    let follows = FollowService::new(
        follows_repo.clone(),
        users_repo.clone(),
        notifications.clone(),
    );
    let profiles = ProfileService::new(
        users_repo.clone(),
        posts_repo.clone(),
        follows_repo,
        posts.clone(),
    );
    let collections = CollectionService::new(
        collections_repo.clone(),
        posts_repo.clone(),
        posts.clone(),
    );
    let search = SearchService::new(
        posts_repo,
        users_repo,
        tags_repo,
        collections_repo,
        posts.clone(),
    );
    let analytics = AnalyticsService::new(analytics_repo);

    let rate_limiter = Arc::new(ApiRateLimiter::new(
        std::time::Duration::from_secs(settings.api_rate_limit.window_seconds.get() as u64),
        settings.api_rate_limit.max_requests.get(),
    ));

    Ok(ApiState {
        sessions,
        users,
        profiles,
        posts,
        comments,
        engagement,
        follows,
        collections,
        notifications,
        search,
        analytics,
        db: repositories,
        upload_storage,
        rate_limiter,
        secure_cookies: settings.sessions.secure_cookies,
        upload_limit_bytes: settings.uploads.max_request_bytes.get(),
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "dailypoet::server",
        addr = %settings.server.addr,
        "listening"
    );

    let drain = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(drain))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal(drain: std::time::Duration) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!(
        target = "dailypoet::server",
        drain_secs = drain.as_secs(),
        "shutdown signal received, draining connections"
    );
}
