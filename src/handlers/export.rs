//! Reporting and maintenance handlers.
//!
//! Exports read whatever is stored inside a date window, render it to the
//! requested format and optionally push the spreadsheet to Google Drive.
//! Retention cleanup lives here too since it shares the same date math.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use utoipa::IntoParams;

use crate::drive::DriveClient;
use crate::error::{ApiError, validation_error};
use crate::export;
use crate::extractors::Platform;
use crate::repositories::{EventFilter, WebhookEventRepository};
use crate::server::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Date-window and output options shared by the export endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Look back this many days from now. Ignored when explicit dates are set.
    pub days: Option<u32>,
    /// Inclusive window start, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive window end, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Restrict to a single platform slug.
    pub platform: Option<String>,
    /// One worksheet per platform (default) or a single combined sheet.
    pub split_sheets: Option<bool>,
    /// Upload the rendered spreadsheet to Google Drive instead of
    /// downloading it.
    pub upload_drive: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RetentionQuery {
    /// Delete events stored more than this many days ago.
    pub days: Option<u32>,
}

/// Aggregate statistics over the selected window.
#[utoipa::path(
    get,
    path = "/export/stats",
    tag = "export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Aggregate statistics"),
        (status = 400, description = "Invalid window", body = ApiError)
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<Value>, ApiError> {
    let (start, end) = resolve_window(&state, &query)?;

    let repo = WebhookEventRepository::new(&state.db);
    let platforms = repo.platform_stats(start, end).await?;
    let event_types = repo.event_type_stats(start, end).await?;

    let total_events: i64 = platforms.iter().map(|p| p.event_count).sum();
    let total_amount: f64 = platforms.iter().filter_map(|p| p.total_amount).sum();

    // platforms with only amount-less events report zero, not null
    let platforms: Vec<Value> = platforms
        .iter()
        .map(|p| {
            json!({
                "platform": p.platform,
                "event_count": p.event_count,
                "total_amount": p.total_amount.unwrap_or(0.0),
            })
        })
        .collect();

    Ok(Json(json!({
        "period": {
            "start": start.map(|s| s.to_rfc3339()),
            "end": end.map(|e| e.to_rfc3339()),
        },
        "total_events": total_events,
        "total_amount": total_amount,
        "platforms": platforms,
        "event_types": event_types,
    })))
}

/// Download an Excel report, optionally uploading it to Drive as well.
#[utoipa::path(
    get,
    path = "/export/excel",
    tag = "export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Workbook download", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid window", body = ApiError)
    )
)]
pub async fn excel(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let events = load_events(&state, &query).await?;
    let bytes = export::build_workbook(&events, query.split_sheets.unwrap_or(true))?;

    let file_name = format!("webhook_report_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));

    // With upload_drive the caller wants the folder updated, not a download.
    // An upload failure is reported in the body, never as an error status.
    if query.upload_drive.unwrap_or(false) {
        let body = match upload_to_drive(&state, &file_name, bytes).await {
            Ok(file_id) => json!({
                "status": "ok",
                "file_name": file_name,
                "uploaded": true,
                "drive_file_id": file_id,
            }),
            Err(err) => {
                warn!(error = %err, "drive upload failed");
                json!({
                    "status": "ok",
                    "file_name": file_name,
                    "uploaded": false,
                    "error": err.to_string(),
                })
            }
        };
        return Ok(Json(body).into_response());
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_header(&file_name)?,
    );

    Ok((headers, bytes).into_response())
}

/// Download a CSV report.
#[utoipa::path(
    get,
    path = "/export/csv",
    tag = "export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv"),
        (status = 400, description = "Invalid window", body = ApiError)
    )
)]
pub async fn csv(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let events = load_events(&state, &query).await?;
    let bytes = export::build_csv(&events)?;

    let file_name = format!("webhook_report_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_header(&file_name)?,
    );

    Ok((headers, bytes))
}

/// Delete events stored before the retention cutoff.
#[utoipa::path(
    delete,
    path = "/admin/retention",
    tag = "admin",
    params(RetentionQuery),
    responses(
        (status = 200, description = "Cleanup summary"),
        (status = 400, description = "Missing or invalid days parameter", body = ApiError)
    )
)]
pub async fn retention(
    State(state): State<AppState>,
    Query(query): Query<RetentionQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = match query.days {
        Some(days) if days >= 1 => days,
        _ => {
            return Err(validation_error(
                "days must be a positive integer",
                json!({"days": "required, >= 1"}),
            ));
        }
    };

    let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
    let repo = WebhookEventRepository::new(&state.db);
    let deleted = repo.purge_older_than(cutoff).await?;

    info!(days, deleted, "retention cleanup finished");

    Ok(Json(json!({
        "status": "ok",
        "deleted": deleted,
        "cutoff": cutoff.to_rfc3339(),
    })))
}

async fn load_events(
    state: &AppState,
    query: &ExportQuery,
) -> Result<Vec<crate::models::WebhookEvent>, ApiError> {
    let (start, end) = resolve_window(state, query)?;

    let platform = match query.platform.as_deref() {
        Some(slug) => Some(slug.parse::<Platform>().map_err(|_| {
            validation_error(
                "unknown platform",
                json!({"platform": slug}),
            )
        })?),
        None => None,
    };

    let repo = WebhookEventRepository::new(&state.db);
    let events = repo
        .list(EventFilter {
            platform,
            start,
            end,
            limit: Some(state.config.export_max_rows),
        })
        .await?;

    Ok(events)
}

/// Resolve the requested date window. Explicit dates win over the rolling
/// `days` window; the end date is inclusive.
fn resolve_window(
    state: &AppState,
    query: &ExportQuery,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ApiError> {
    if query.start_date.is_some() || query.end_date.is_some() {
        let start = query
            .start_date
            .as_deref()
            .map(|raw| parse_day(raw, "start_date"))
            .transpose()?
            .map(day_start);

        let end = query
            .end_date
            .as_deref()
            .map(|raw| parse_day(raw, "end_date"))
            .transpose()?
            .map(|day| day_start(day.checked_add_days(Days::new(1)).unwrap_or(day)));

        if let (Some(start), Some(end)) = (start, end)
            && start >= end
        {
            return Err(validation_error(
                "start_date must not be after end_date",
                json!({"start_date": &query.start_date, "end_date": &query.end_date}),
            ));
        }

        return Ok((start, end));
    }

    let days = query.days.unwrap_or(state.config.export_default_days);
    if days == 0 {
        return Ok((None, None));
    }

    let start = Utc::now() - chrono::Duration::days(i64::from(days));
    Ok((Some(start), None))
}

fn parse_day(raw: &str, field: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        validation_error(
            "dates must use the YYYY-MM-DD format",
            json!({field: raw}),
        )
    })
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(day.and_time(NaiveTime::MIN), Utc)
}

fn attachment_header(file_name: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|err| anyhow::Error::new(err).into())
}

async fn upload_to_drive(
    state: &AppState,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, crate::drive::DriveError> {
    let client = DriveClient::connect(&state.config.drive).await?;
    client.upload_report(file_name, XLSX_MIME, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_parsing_accepts_iso_dates_only() {
        assert!(parse_day("2026-05-10", "start_date").is_ok());
        assert!(parse_day("10/05/2026", "start_date").is_err());
        assert!(parse_day("2026-13-40", "start_date").is_err());
    }

    #[test]
    fn end_of_window_is_exclusive_next_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let start = day_start(day);
        assert_eq!(start.to_rfc3339(), "2026-05-10T00:00:00+00:00");
    }
}
