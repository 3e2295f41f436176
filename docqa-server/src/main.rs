//! `docqa-server` binary: serve the HTTP API with backends from the environment.

use docqa_rag::RagConfig;
use docqa_server::{BackendConfig, ServerConfig, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docqa_telemetry::init_telemetry("info,tower_http=debug")?;

    let backends = BackendConfig::from_env();
    let pipeline = backends.build_pipeline(RagConfig::default())?;

    run_server(ServerConfig::from_env(), pipeline).await
}
