use axum::{
    routing::{get, post},
    Router,
};
use quiz_master_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth::{require_admin, require_bearer_auth},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);
    app_state
        .user_service
        .seed_admin(&config.admin_username, &config.admin_password)
        .await?;

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            let queue = state.export_queue_service.clone();
            loop {
                match queue.run_once(&state).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(750)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Export worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state.notification_service.run_once().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Notification worker error");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });
    }

    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create scheduler: {}", e))?;

    {
        let state = app_state.clone();
        let job = Job::new_async("0 0 18 * * *", move |_id, _sched| {
            let state = state.clone();
            Box::pin(async move {
                if let Err(e) = state.notification_service.send_daily_reminders().await {
                    tracing::error!(error = ?e, "Daily reminder job failed");
                }
            })
        })
        .map_err(|e| anyhow::anyhow!("Invalid reminder schedule: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to schedule reminders: {}", e))?;
    }

    {
        let state = app_state.clone();
        let job = Job::new_async("0 0 6 1 * *", move |_id, _sched| {
            let state = state.clone();
            Box::pin(async move {
                let queue = &state.export_queue_service;
                if let Err(e) = queue
                    .enqueue(
                        quiz_master_backend::services::export_queue_service::KIND_MONTHLY_REPORTS,
                        None,
                    )
                    .await
                {
                    tracing::error!(error = ?e, "Monthly report job failed");
                }
            })
        })
        .map_err(|e| anyhow::anyhow!("Invalid report schedule: {}", e))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to schedule reports: {}", e))?;
    }

    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start scheduler: {}", e))?;

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login));

    let user_api = Router::new()
        .route(
            "/api/auth/profile",
            get(routes::auth::get_profile).put(routes::auth::update_profile),
        )
        .route("/api/auth/change-password", post(routes::auth::change_password))
        .route("/api/subjects", get(routes::quiz::list_subjects))
        .route("/api/subjects/:id", get(routes::quiz::get_subject))
        .route("/api/chapters", get(routes::quiz::list_chapters))
        .route("/api/quizzes", get(routes::quiz::list_quizzes))
        .route("/api/quizzes/:id", get(routes::quiz::get_quiz))
        .route("/api/quiz/:quiz_id/attempt", get(routes::quiz::attempt_quiz))
        .route("/api/quiz/:quiz_id/submit", post(routes::quiz::submit_quiz))
        .route("/api/quiz/:quiz_id/answers", get(routes::quiz::view_answers))
        .route("/api/history/scores", get(routes::history::get_user_scores))
        .route("/api/history/stats", get(routes::history::get_user_stats))
        .route("/api/history/progress", get(routes::history::get_user_progress))
        .route(
            "/api/activity/leaderboard/quiz/:quiz_id",
            get(routes::activity::quiz_leaderboard),
        )
        .route(
            "/api/activity/leaderboard/global",
            get(routes::activity::global_leaderboard),
        )
        .route("/api/export/user-quiz-data", post(routes::export::start_user_export))
        .route("/api/export/status/:task_id", get(routes::export::export_status))
        .route("/api/export/download/:file_key", get(routes::export::download_export))
        .route(
            "/api/export/reports/monthly/:user_id",
            get(routes::export::get_monthly_report),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    let admin_api = Router::new()
        .route("/api/admin/dashboard", get(routes::admin::dashboard))
        .route("/api/admin/report", get(routes::admin::report))
        .route("/api/admin/users", get(routes::admin::list_users))
        .route(
            "/api/admin/users/:id",
            get(routes::admin::get_user).delete(routes::admin::delete_user),
        )
        .route("/api/admin/scores", get(routes::admin::all_scores))
        .route("/api/admin/subjects", post(routes::admin::create_subject))
        .route(
            "/api/admin/subjects/:id",
            axum::routing::put(routes::admin::update_subject).delete(routes::admin::delete_subject),
        )
        .route("/api/admin/chapters", post(routes::admin::create_chapter))
        .route(
            "/api/admin/chapters/:id",
            axum::routing::put(routes::admin::update_chapter).delete(routes::admin::delete_chapter),
        )
        .route(
            "/api/admin/quizzes",
            get(routes::admin::list_quizzes).post(routes::admin::create_quiz),
        )
        .route(
            "/api/admin/quizzes/:id",
            axum::routing::put(routes::admin::update_quiz).delete(routes::admin::delete_quiz),
        )
        .route(
            "/api/admin/questions",
            get(routes::admin::list_questions).post(routes::admin::create_question),
        )
        .route(
            "/api/admin/questions/:id",
            get(routes::admin::get_question)
                .put(routes::admin::update_question)
                .delete(routes::admin::delete_question),
        )
        .route("/api/admin/import/:entity", post(routes::admin::import_csv))
        .route(
            "/api/admin/trigger-daily-reminders",
            post(routes::admin::trigger_daily_reminders),
        )
        .route(
            "/api/admin/trigger-monthly-reports",
            post(routes::admin::trigger_monthly_reports),
        )
        .route(
            "/api/export/admin/users-data",
            post(routes::export::start_admin_export),
        )
        .route(
            "/api/export/reports/generate-monthly",
            post(routes::export::generate_monthly_reports),
        )
        .layer(axum::middleware::from_fn(require_admin));

    let app = public_api
        .merge(user_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
