use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::web;
use tracing_subscriber::EnvFilter;

use crate::application::HealthPipeline;
use crate::domain::error::Result;
use crate::infrastructure::config::{AppConfig, SourceKind};
use crate::infrastructure::sources::{FileSource, GoogleSheetSource, RecordSource};
use crate::infrastructure::writer::{AppsScriptWriter, RecordWriter};
use crate::interfaces::http::{add_log, start_server, HttpState, LogEntry};

pub fn run() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(2);
        }
    };

    if let Err(e) = actix_web::rt::System::new().block_on(serve(config)) {
        tracing::error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

fn build_source(config: &AppConfig) -> Result<Arc<dyn RecordSource + Send + Sync>> {
    let source = &config.source;
    let built: Arc<dyn RecordSource + Send + Sync> = match source.kind {
        SourceKind::GoogleSheet => Arc::new(GoogleSheetSource::new(
            source.sheet_id.as_deref().unwrap_or_default(),
            source.gid.as_deref(),
            source.timeout_secs,
            &source.user_agent,
        )?),
        SourceKind::File => Arc::new(FileSource::new(source.path.clone().unwrap_or_default())),
    };
    Ok(built)
}

fn build_writer(config: &AppConfig) -> Result<Option<Arc<dyn RecordWriter + Send + Sync>>> {
    match &config.writer.url {
        Some(url) => {
            let writer = AppsScriptWriter::new(url, config.writer.timeout_secs)?;
            Ok(Some(Arc::new(writer)))
        }
        None => Ok(None),
    }
}

/// Periodic cycles; a tick that lands on a running cycle is skipped
fn spawn_refresh(pipeline: Arc<HealthPipeline>, logs: Arc<Mutex<Vec<LogEntry>>>, every: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match pipeline.run_cycle().await {
                Ok(outcome) if outcome.is_skipped() => {
                    tracing::debug!("Refresh tick skipped, cycle in flight");
                }
                Ok(_) => {}
                Err(e) => add_log(&logs, "WARN", "Refresh", &format!("Refresh failed: {}", e)),
            }
        }
    });
}

async fn serve(config: AppConfig) -> std::io::Result<()> {
    let to_io = |e: crate::domain::error::AppError| std::io::Error::new(std::io::ErrorKind::Other, e);

    let source = build_source(&config).map_err(to_io)?;
    let writer = build_writer(&config).map_err(to_io)?;
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    add_log(&logs, "INFO", "App", &format!("Reading records from {}", source.describe()));
    if writer.is_none() {
        add_log(&logs, "INFO", "App", "No write endpoint configured, map is read-only");
    }

    let pipeline = Arc::new(HealthPipeline::new(source, config.pipeline.clone()));

    if let Err(e) = pipeline.run_cycle().await {
        add_log(&logs, "WARN", "App", &format!("Initial cycle failed: {}", e));
    }

    if config.pipeline.refresh_interval_secs > 0 {
        spawn_refresh(
            pipeline.clone(),
            logs.clone(),
            Duration::from_secs(config.pipeline.refresh_interval_secs),
        );
    }

    let state = web::Data::new(HttpState {
        pipeline,
        writer,
        logs: logs.clone(),
    });

    add_log(
        &logs,
        "INFO",
        "App",
        &format!("Listening on http://{}:{}", config.server.host, config.server.port),
    );
    start_server(state, &config.server.host, config.server.port)?.await
}
