use {
    reg_pay::{
        AppState,
        adapters::{http, pelecard::PelecardClient, sumit::SumitClient},
        config::AppConfig,
        infra::scratch_store::ScratchStore,
    },
    std::sync::Arc,
    tokio::signal,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let gateway = PelecardClient::new(config.pelecard.clone(), config.public_base_url.clone())
        .expect("failed to build gateway client");
    let accounting =
        SumitClient::new(config.sumit.clone()).expect("failed to build accounting client");
    let store = ScratchStore::new(config.data_dir.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        config: Arc::new(config),
        gateway,
        accounting,
        store,
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
