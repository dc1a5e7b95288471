use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("afterhours=info,game_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Entry point - delegate to game core
    if let Err(e) = game_core::run() {
        tracing::error!("game error: {}", e);
    }
}
