use std::{io::ErrorKind, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::aggregator::sink::append_csv_row;
use crate::models::{
    reading::parse_leading_integer,
    record::{is_plain_field, LABEL_CSV_HEADER},
    LabelRecord, Reading,
};

use super::error::ApiError;
use super::state::ServerState;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "server";

use crate::{log_error, log_info, log_warn};

pub const NO_LOGS_BODY: &str = "No logs yet.";

type AppState = State<Arc<ServerState>>;

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LabelQuery {
    value: Option<String>,
    label: Option<String>,
}

/// Missing and empty are the same thing to these endpoints.
fn present(param: Option<String>) -> Option<String> {
    param.filter(|value| !value.is_empty())
}

/// `GET /read`: relay the device body unchanged.
pub async fn read_device(State(state): AppState) -> Result<Response, ApiError> {
    let raw = state.device.read_raw().await.map_err(|err| {
        log_warn!("device read failed: {err:?}");
        ApiError::Upstream(err.to_string())
    })?;

    let content_type = raw
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], raw.body).into_response())
}

/// `GET /set_baseline?value=N`
pub async fn set_baseline(
    State(state): AppState,
    Query(query): Query<ValueQuery>,
) -> Result<Json<Value>, ApiError> {
    let raw = present(query.value).ok_or(ApiError::BadRequest("Missing value"))?;
    let baseline = parse_leading_integer(&raw).ok_or(ApiError::BadRequest("Invalid value"))?;

    state.set_baseline(baseline);
    log_info!("baseline set to {baseline}");
    Ok(Json(json!({ "baseline": baseline })))
}

/// `GET /get_baseline`
pub async fn get_baseline(State(state): AppState) -> Json<Value> {
    Json(json!({ "baseline": state.baseline() }))
}

/// `GET /log?value=&label=`: one labelled row in the label CSV.
pub async fn log_label(
    State(state): AppState,
    Query(query): Query<LabelQuery>,
) -> Result<Json<Value>, ApiError> {
    let (Some(value), Some(label)) = (present(query.value), present(query.label)) else {
        return Err(ApiError::BadRequest("Missing data"));
    };
    // One call, one row: separators would split or widen it.
    if !is_plain_field(&value) || !is_plain_field(&label) {
        log_warn!("rejected label row with CSV separators: {value:?},{label:?}");
        return Err(ApiError::BadRequest("Invalid data"));
    }

    let record = LabelRecord {
        timestamp: Utc::now(),
        value,
        label,
    };
    let path = state.label_log_path.clone();
    let row = record.to_csv_row();

    tokio::task::spawn_blocking(move || append_csv_row(&path, LABEL_CSV_HEADER, &row))
        .await
        .map_err(|err| ApiError::Storage(err.to_string()))?
        .map_err(|err| {
            log_error!("failed to append label row: {err:?}");
            ApiError::Storage(err.to_string())
        })?;

    Ok(Json(json!({
        "status": "logged",
        "value": record.value,
        "label": record.label,
    })))
}

/// `POST /log`: buffer one reading; the aggregator decides when to write.
pub async fn log_sample(State(state): AppState, Json(reading): Json<Reading>) -> Json<Value> {
    state.ingest(reading).await;
    Json(json!({ "message": "Logged!" }))
}

/// `GET /logs`: the aggregate CSV as stored.
pub async fn get_logs(State(state): AppState) -> Result<Response, ApiError> {
    match tokio::fs::read(&state.aggregate_log_path).await {
        Ok(contents) => Ok((
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            contents,
        )
            .into_response()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Ok((StatusCode::OK, NO_LOGS_BODY).into_response())
        }
        Err(err) => {
            log_error!("failed to read {}: {err}", state.aggregate_log_path.display());
            Err(ApiError::Storage(err.to_string()))
        }
    }
}
