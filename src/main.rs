//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use salad_shop_inventory::{
    app::build_app,
    config::{AppState, Settings},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Filtro via RUST_LOG; padrão: info para o serviço e para o tower-http.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("salad_shop_inventory=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();
    let app_state = AppState::new(settings).await?;

    let app = build_app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
