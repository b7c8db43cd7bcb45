use crate::application::HealthPipeline;
use crate::domain::error::AppError;
use crate::domain::health::RecordDraft;
use crate::infrastructure::response::ApiResponse;
use crate::infrastructure::writer::{RecordWriter, WriteResponse};
use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, http::StatusCode, post, put, web, App, HttpResponse, HttpServer,
    Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub pipeline: Arc<HealthPipeline>,
    /// Absent when no write endpoint is configured; writes answer 503
    pub writer: Option<Arc<dyn RecordWriter + Send + Sync>>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    fn log(&self, level: &str, message: &str) {
        let limit = self.pipeline.config().max_log_entries;
        add_log_entry(&self.logs, limit, level, "HttpApi", message);
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) | AppError::InvalidRow(_) => StatusCode::BAD_REQUEST,
        AppError::WriteRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    HttpResponse::build(status_for(err)).json(ApiResponse::error(err.to_string()))
}

#[get("/data")]
async fn get_data(data: web::Data<HttpState>) -> impl Responder {
    let report = match data.pipeline.run_cycle().await {
        Ok(outcome) => match outcome.report() {
            Some(report) => Ok(report),
            None => data.pipeline.wait_for_latest().await,
        },
        Err(e) => Err(e),
    };

    match report {
        Ok(report) => {
            let message = match report.empty_reason {
                Some(reason) => reason.to_string(),
                None => format!("{} records", report.records.len()),
            };
            HttpResponse::Ok().json(ApiResponse::ok(message, &*report))
        }
        Err(e) => {
            data.log("ERROR", &format!("Loading data failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/stats")]
async fn get_stats(data: web::Data<HttpState>) -> impl Responder {
    match data.pipeline.latest_or_run().await {
        Ok(report) => HttpResponse::Ok().json(ApiResponse::ok("stats", report.stats)),
        Err(e) => {
            data.log("ERROR", &format!("Loading stats failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs.clone(),
        Err(_) => Vec::new(),
    };
    HttpResponse::Ok().json(logs)
}

enum WriteCommand<'a> {
    Add(&'a RecordDraft),
    Update(&'a str, &'a RecordDraft),
    Delete(&'a str),
}

/// Validate, forward to the write endpoint, then refresh the map
async fn forward_write(data: &HttpState, command: WriteCommand<'_>) -> HttpResponse {
    let draft = match &command {
        WriteCommand::Add(draft) | WriteCommand::Update(_, draft) => Some(*draft),
        WriteCommand::Delete(_) => None,
    };
    if let Some(draft) = draft {
        if let Err(e) = draft.validate() {
            let err = AppError::from(e);
            data.log("WARN", &format!("Rejected draft: {}", err));
            return error_response(&err);
        }
    }

    let Some(writer) = data.writer.as_ref() else {
        return HttpResponse::ServiceUnavailable()
            .json(ApiResponse::error("Write endpoint is not configured"));
    };

    let result: Result<WriteResponse, AppError> = match command {
        WriteCommand::Add(draft) => writer.add(draft).await,
        WriteCommand::Update(id, draft) => writer.update(id, draft).await,
        WriteCommand::Delete(id) => writer.delete(id).await,
    };

    match result {
        Ok(response) => {
            data.log("INFO", &format!("Write accepted: {}", response.message));
            if let Err(e) = data.pipeline.refresh().await {
                data.log("WARN", &format!("Refresh after write failed: {}", e));
            }
            HttpResponse::Ok().json(ApiResponse::ok(response.message, response.data))
        }
        Err(e) => {
            data.log("ERROR", &format!("Write failed: {}", e));
            error_response(&e)
        }
    }
}

#[post("/data")]
async fn add_record(data: web::Data<HttpState>, req: web::Json<RecordDraft>) -> impl Responder {
    forward_write(&data, WriteCommand::Add(&req)).await
}

#[put("/data/{id}")]
async fn update_record(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    req: web::Json<RecordDraft>,
) -> impl Responder {
    forward_write(&data, WriteCommand::Update(&path, &req)).await
}

#[delete("/data/{id}")]
async fn delete_record(data: web::Data<HttpState>, path: web::Path<String>) -> impl Responder {
    forward_write(&data, WriteCommand::Delete(&path)).await
}

/// Register every `/api` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_data)
            .service(get_stats)
            .service(get_logs)
            .service(add_record)
            .service(update_record)
            .service(delete_record),
    );
}

/// Append to the in-memory ring (oldest entries dropped past `limit`) and
/// mirror the entry to tracing
pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    limit: usize,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };

    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    if let Ok(mut logs) = logs.lock() {
        logs.push(entry.clone());
        if logs.len() > limit {
            let overflow = logs.len() - limit;
            logs.drain(..overflow);
        }
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, 100, level, source, message);
}

pub fn start_server(state: web::Data<HttpState>, host: &str, port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Browser map is served from anywhere

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::{PipelineConfig, SourceTable};
    use crate::infrastructure::sources::testing::{FailingSource, StaticSource};
    use crate::infrastructure::sources::RecordSource;
    use crate::infrastructure::writer::testing::RecordingWriter;
    use crate::infrastructure::writer::WriteAction;
    use actix_web::test;

    fn table() -> SourceTable {
        SourceTable::from_cells(
            vec![
                "id".to_string(),
                "GA".to_string(),
                "weight".to_string(),
                "latitude".to_string(),
                "longitude".to_string(),
            ],
            vec![
                vec!["1", "38", "", "13.7563", "100.5018"],
                vec!["2", "", "2300", "14.98", "102.10"],
                vec!["3", "", "3200", "18.79", "98.99"],
                vec!["4", "", "3200", "999", "98.99"],
            ],
        )
    }

    fn state(
        source: Arc<dyn RecordSource + Send + Sync>,
        writer: Option<Arc<RecordingWriter>>,
    ) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            pipeline: Arc::new(HealthPipeline::new(source, PipelineConfig::default())),
            writer: writer.map(|w| w as Arc<dyn RecordWriter + Send + Sync>),
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[actix_web::test]
    async fn test_get_data_returns_markers_and_stats() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(StaticSource::new(table())), None))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/data").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["markers"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["stats"]["total"], 3);
        assert_eq!(body["data"]["stats"]["lowWeight"], 1);
        assert_eq!(body["data"]["droppedRows"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_source_failure_is_bad_gateway() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(FailingSource), None))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_write_requires_configured_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(StaticSource::new(table())), None))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::delete().uri("/api/data/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_invalid_draft_is_rejected_before_forwarding() {
        let writer = Arc::new(RecordingWriter::default());
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(StaticSource::new(table())), Some(writer.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/data")
            .set_json(serde_json::json!({"mother_name": "ทดสอบ", "latitude": 999, "longitude": 100}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(writer.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_update_is_forwarded_with_id() {
        let writer = Arc::new(RecordingWriter::default());
        let app = test::init_service(
            App::new()
                .app_data(state(Arc::new(StaticSource::new(table())), Some(writer.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/data/2")
            .set_json(serde_json::json!({"weight": "2600", "latitude": "14.98", "longitude": "102.10"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(WriteAction::UpdateRecord, Some("2".to_string()))]);
    }

    #[actix_web::test]
    async fn test_write_refreshes_the_map() {
        let source = Arc::new(StaticSource::new(table()));
        let writer = Arc::new(RecordingWriter::default());
        let app = test::init_service(
            App::new()
                .app_data(state(source.clone(), Some(writer.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total"], 3);

        let mut remaining = table();
        remaining.rows.truncate(1);
        source.replace(remaining);

        let req = test::TestRequest::delete().uri("/api/data/2").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["pregnant"], 1);
    }

    #[actix_web::test]
    async fn test_log_ring_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..5 {
            add_log_entry(&logs, 3, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].message, "entry 2");
    }
}
