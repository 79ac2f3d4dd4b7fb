//! Stage 1 — Profile Analyzer.
//!
//! Decomposes a free-form target-employee record into a `HardFilterSpec`
//! (mechanically checkable) and a `SoftCriteriaSpec` (ranking context only)
//! via one structured-JSON LLM call. The minted `search_id` is the caller's
//! handle for the later stages; the server keeps no session state.

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_gateway::{send_json, ChatMessage, LlmGateway};
use crate::search::models::{AnalysisResult, AnalyzeResponse, Language};
use crate::search::prompts;

/// Near-deterministic: the same profile should yield the same filters.
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Checks the raw target object before any LLM call is made.
/// Returns the target's employee id on success.
pub fn validate_target(target: &Value) -> Result<&str, AppError> {
    let obj = target.as_object().ok_or_else(|| {
        AppError::Validation("target_employee must be an object".to_string())
    })?;
    if obj.is_empty() {
        return Err(AppError::Validation(
            "target_employee is required and cannot be empty".to_string(),
        ));
    }
    match obj.get("employee_id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(AppError::Validation(
            "target_employee must contain employee_id".to_string(),
        )),
    }
}

pub async fn analyze_target(
    llm: &dyn LlmGateway,
    target: &Value,
    language: Language,
) -> Result<AnalyzeResponse, AppError> {
    let target_id = validate_target(target)?;
    let search_id = Uuid::new_v4().to_string();
    info!("Analyzing target employee {target_id} (search {search_id})");

    let target_json =
        serde_json::to_string_pretty(target).unwrap_or_else(|_| target.to_string());
    let (system, user_template) = match language {
        Language::En => (prompts::ANALYSIS_SYSTEM_EN, prompts::ANALYSIS_USER_EN),
        Language::Ja => (prompts::ANALYSIS_SYSTEM_JA, prompts::ANALYSIS_USER_JA),
    };
    let messages = [
        ChatMessage::system(system),
        ChatMessage::user(user_template.replace("{target_json}", &target_json)),
    ];

    let mut result: AnalysisResult = send_json(llm, &messages, ANALYSIS_TEMPERATURE).await?;
    if result.thinking_text.is_empty() {
        result.thinking_text = match language {
            Language::En => "Analysis complete.".to_string(),
            Language::Ja => "分析が完了しました。".to_string(),
        };
    }

    Ok(AnalyzeResponse {
        search_id,
        stage: "analysis".to_string(),
        thinking_text: result.thinking_text.clone(),
        analysis_result: result,
    })
}
