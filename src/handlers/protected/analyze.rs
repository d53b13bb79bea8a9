use axum::extract::Multipart;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::analyzer::DocumentAnalyzer;
use crate::config;
use crate::error::ApiError;
use crate::extract::{self, DocumentKind};
use crate::middleware::AuthUser;
use crate::services::{AnalysisService, NewAnalysis};
use crate::usage::UsageStatus;

use super::usage::production_meter;

struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// POST /api/analyze - Upload a document, extract its text, run the AI
/// analysis, persist the result, and consume one unit of monthly quota
///
/// The quota check precedes the analysis and a denial is a hard stop that
/// carries current/limit/plan_name for the upgrade prompt. In the default
/// (soft) mode consumption is recorded after the analysis succeeds; with
/// USAGE_STRICT_ENFORCEMENT the unit is reserved up front with an atomic
/// compare-and-increment, making the monthly cap hard.
pub async fn analyze(
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let meter = production_meter().await?;
    let strict = config::config().usage.strict_enforcement;

    // Gate before doing any work; in strict mode this already consumes the unit
    let status: UsageStatus = if strict {
        meter.try_record(auth.user_id).await?
    } else {
        meter.check(auth.user_id).await?
    };

    if !status.allowed {
        info!(user_id = %auth.user_id, current = status.current, limit = status.limit,
              "analysis denied: monthly limit reached");
        return Err(ApiError::quota_exceeded(&status));
    }

    let upload = read_upload(multipart).await?;

    let max_bytes = config::config().api.max_upload_bytes;
    if upload.bytes.len() > max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "File size exceeds {}MB limit",
            max_bytes / (1024 * 1024)
        )));
    }

    let kind = DocumentKind::from_mime(&upload.content_type)
        .ok_or_else(|| ApiError::bad_request("Invalid file type. Only DOCX and TXT files are allowed."))?;

    let text = extract::extract_text(kind, &upload.bytes)?;
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("No text found in document"));
    }

    let stats = extract::document_stats(&text);

    let analyzer = DocumentAnalyzer::from_config()?;
    let analysis = analyzer.analyze(&text).await?;

    info!(user_id = %auth.user_id, filename = %upload.filename,
          words = stats.words, "document analyzed");

    // Persist best-effort: the caller still gets their analysis if the
    // insert fails
    let service = AnalysisService::new().await?;
    let saved_id = match service
        .save(NewAnalysis {
            user_id: auth.user_id,
            filename: upload.filename.clone(),
            file_type: upload.content_type.clone(),
            file_size: upload.bytes.len() as i64,
            word_count: stats.words as i64,
            char_count: stats.characters as i64,
            summary: analysis.summary.clone(),
            keywords: analysis.keywords.clone(),
            key_points: analysis.key_points.clone(),
            action_items: analysis.action_items.clone(),
        })
        .await
    {
        Ok(saved) => Some(saved.id),
        Err(e) => {
            error!("Failed to persist analysis: {}", e);
            None
        }
    };

    // Soft mode: record consumption now that the analysis has been
    // delivered. A failed increment is logged but never rolls back or
    // retries the analysis.
    let usage = if strict {
        json!({ "current": status.current, "limit": status.limit })
    } else {
        if let Err(e) = meter.record(auth.user_id).await {
            error!(user_id = %auth.user_id, "failed to record usage: {}", e);
        }
        json!({ "current": status.current + 1, "limit": status.limit })
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "filename": upload.filename,
            "stats": stats,
            "analysis": analysis,
            "saved_id": saved_id,
            "usage": usage,
        }
    })))
}

/// Pull the "file" part out of the multipart body
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::bad_request("No file provided"))
}
