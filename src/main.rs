use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vigor_analytics::config::{AppConfig, RequestConfig, load_config};
use vigor_analytics::presenter::{ConsolePresenter, Presenter};
use vigor_analytics::provider::{JsonFileProvider, SceneProvider, SceneQuery};
use vigor_analytics::{AnalysisReport, AnalysisRequest, AnalyticsFacade};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());

    // Load configuration from file
    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let facade = match AnalyticsFacade::new(config.analytics.clone()) {
        Ok(f) => Arc::new(f),
        Err(e) => {
            error!("Invalid analytics config: {}", e);
            return;
        }
    };
    let provider = JsonFileProvider::new(&config.data_file);

    info!("Requests to process: {}", config.requests.len());

    // Process all requests concurrently
    let tasks: Vec<_> = config
        .requests
        .iter()
        .map(|request| process_request(request, &provider, facade.clone()))
        .collect();
    let results = join_all(tasks).await;

    let stdout = std::io::stdout();
    let mut presenter = ConsolePresenter::new(stdout.lock());
    let mut failures = 0;
    for (request, result) in config.requests.iter().zip(results) {
        match result {
            Some(report) => {
                if let Err(e) = presenter.present(&request.entity_id, &report) {
                    warn!("Failed to present {}: {}", request.entity_id, e);
                    failures += 1;
                }
            }
            None => failures += 1,
        }
    }

    info!(
        "Finished: {} reports, {} failed",
        config.requests.len() - failures,
        failures
    );
}

/// Fetches the current (and optional reference) series and runs the analytics.
async fn process_request(
    request: &RequestConfig,
    provider: &dyn SceneProvider,
    facade: Arc<AnalyticsFacade>,
) -> Option<AnalysisReport> {
    info!("Processing {} {}", request.entity_id, request.index_type);

    let current_query = SceneQuery {
        entity_id: request.entity_id.clone(),
        index_type: request.index_type,
        start: request.current_start,
        end: request.current_end,
        resolution: request.resolution,
    };
    let current = match provider.fetch(&current_query).await {
        Ok(scenes) => scenes,
        Err(e) => {
            warn!("Fetch error for {}: {}", request.entity_id, e);
            return None;
        }
    };

    let reference = match request.reference_range() {
        Some((start, end)) => {
            let query = SceneQuery {
                start,
                end,
                ..current_query.clone()
            };
            match provider.fetch(&query).await {
                Ok(scenes) => Some(scenes),
                Err(e) => {
                    warn!("Reference fetch error for {}: {}", request.entity_id, e);
                    None
                }
            }
        }
        None => None,
    };

    let analysis = AnalysisRequest {
        index_type: request.index_type,
        current,
        reference,
        samples: None,
    };

    // Analytics are synchronous
    let result = tokio::task::spawn_blocking(move || facade.analyze(&analysis)).await;
    match result {
        Ok(Ok(report)) => Some(report),
        Ok(Err(e)) => {
            warn!("Analysis error for {}: {}", request.entity_id, e);
            None
        }
        Err(e) => {
            error!("Analysis task for {} failed: {}", request.entity_id, e);
            None
        }
    }
}
