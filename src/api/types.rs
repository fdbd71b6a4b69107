//! Backend Wire Types
//!
//! Request and response shapes for the verification service endpoints. Raw
//! responses are duck-typed on the wire (`ok` flags, optional verification
//! blocks, `auto_verified` markers); each raw type decodes exactly once into
//! a tagged outcome enum, so nothing downstream re-inspects optional fields.

use super::confidence::{ConfidenceLevel, ConfidenceValue};
use super::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chart formalism tag. The two systems are opaque to this crate: independent
/// text, result and upload state, distinguished only by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bazi,
    Ziwei,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Bazi, ChartKind::Ziwei];

    /// Wire tag used in request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bazi => "bazi",
            ChartKind::Ziwei => "ziwei",
        }
    }

    /// User-facing name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Bazi => "八字",
            ChartKind::Ziwei => "紫微",
        }
    }

    pub fn other(&self) -> ChartKind {
        match self {
            ChartKind::Bazi => ChartKind::Ziwei,
            ChartKind::Ziwei => ChartKind::Bazi,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a conversation history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One conversation history entry as sent to the chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// Parsed chart fields returned by the preview endpoint. Chart-specific keys
/// beyond the common ones are preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedChart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_star: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// AI verification block: confidence plus evidence lists and a summary.
///
/// Wire names follow the backend (`birth_time_confidence`,
/// `key_supporting_evidence`, `key_conflicts`); the rule-based fallback path
/// uses `key_matches`/`key_mismatches`, accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiVerification {
    #[serde(rename = "birth_time_confidence", alias = "confidence", default)]
    pub confidence: ConfidenceValue,

    #[serde(rename = "key_supporting_evidence", alias = "key_matches", default)]
    pub supporting_evidence: Vec<String>,

    #[serde(rename = "key_conflicts", alias = "key_mismatches", default)]
    pub conflicts: Vec<String>,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl AiVerification {
    pub fn level(&self) -> ConfidenceLevel {
        self.confidence.level()
    }
}

/// Decoded verification payload stored per chart kind in a slot.
///
/// A call carries either a numeric score or an AI verification block; a slot
/// result may later gain the block through [`ChartResult::merge_verification`]
/// without losing previously parsed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedChart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_verification: Option<AiVerification>,
}

impl ChartResult {
    /// Field-preserving addition of an AI verification block. Parsed fields
    /// and the legacy score stay; only the block itself is replaced.
    pub fn merge_verification(&mut self, verification: AiVerification) {
        self.ai_verification = Some(verification);
    }

    /// Confidence level for display: the AI block wins over the legacy score.
    pub fn confidence(&self) -> Option<ConfidenceLevel> {
        if let Some(v) = &self.ai_verification {
            return Some(v.level());
        }
        self.score.map(ConfidenceLevel::from_score)
    }
}

// ---------------------------------------------------------------------------
// /verify/api/preview
// ---------------------------------------------------------------------------

/// Request body for the preview (upload-and-verify) endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PreviewRequest {
    pub raw_text: String,

    /// Wizard questionnaire answers; an empty object when none collected yet
    pub wizard: serde_json::Value,

    pub notes: String,

    /// Manually corrected fields; an empty object when none
    pub manual: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_ai: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_events: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,
}

impl PreviewRequest {
    pub fn new(raw_text: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            raw_text: raw_text.into(),
            wizard: serde_json::json!({}),
            notes: String::new(),
            manual: serde_json::json!({}),
            use_ai: Some(false),
            chart_type: Some(kind),
            life_events: None,
            user_id: None,
            group_index: None,
        }
    }
}

/// Raw preview response as received; decode with [`RawPreviewResponse::into_outcome`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawPreviewResponse {
    pub ok: bool,

    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub parsed: Option<ParsedChart>,

    #[serde(default)]
    pub toast: Option<String>,

    #[serde(default)]
    pub auto_verified: bool,

    #[serde(default)]
    pub ai_verification: Option<AiVerification>,

    #[serde(default)]
    pub bazi_verification: Option<AiVerification>,

    #[serde(default)]
    pub ziwei_verification: Option<AiVerification>,
}

/// Decoded preview outcome
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// Only the uploaded kind was verified
    Single {
        result: ChartResult,
        toast: Option<String>,
    },

    /// The backend inferred confidence for both charts from one upload
    Dual {
        result: ChartResult,
        bazi: AiVerification,
        ziwei: AiVerification,
        toast: Option<String>,
    },
}

impl RawPreviewResponse {
    pub fn into_outcome(self) -> Result<PreviewOutcome, ApiError> {
        if !self.ok {
            return Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "验证失败".to_string()),
            ));
        }

        let result = ChartResult {
            parsed: self.parsed,
            score: self.score,
            ai_verification: self.ai_verification,
        };

        // The dual shape requires the explicit marker AND both blocks; a
        // partial pair degrades to the single shape.
        match (self.auto_verified, self.bazi_verification, self.ziwei_verification) {
            (true, Some(bazi), Some(ziwei)) => Ok(PreviewOutcome::Dual {
                result,
                bazi,
                ziwei,
                toast: self.toast,
            }),
            _ => Ok(PreviewOutcome::Single {
                result,
                toast: self.toast,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// /verify/api/submit
// ---------------------------------------------------------------------------

/// Request body for the submit (save record) endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub user_id: String,
    pub raw_text: String,
    pub wizard: serde_json::Value,
    pub notes: String,
    pub manual: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubmitResponse {
    pub ok: bool,
    #[serde(default)]
    pub record_id: Option<i64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Acknowledged save
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAck {
    pub record_id: Option<i64>,
    pub score: Option<f64>,
    pub toast: Option<String>,
}

impl RawSubmitResponse {
    pub fn into_ack(self) -> Result<SubmitAck, ApiError> {
        if !self.ok {
            return Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "保存失败".to_string()),
            ));
        }
        Ok(SubmitAck {
            record_id: self.record_id,
            score: self.score,
            toast: self.toast,
        })
    }
}

// ---------------------------------------------------------------------------
// /verify/api/chat
// ---------------------------------------------------------------------------

/// Request body for the companion chat endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub history: Vec<ChatTurn>,
    pub chart_uploaded: bool,
    pub group_index: usize,
    pub life_events: String,
    pub parsed_chart: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_locked: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChatResponse {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ai_name: Option<String>,
    #[serde(default)]
    pub verification_triggered: bool,
    #[serde(default)]
    pub bazi_verification: Option<AiVerification>,
    #[serde(default)]
    pub ziwei_verification: Option<AiVerification>,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Verification blocks for both chart kinds, delivered in one response
#[derive(Debug, Clone, PartialEq)]
pub struct DualVerification {
    pub bazi: AiVerification,
    pub ziwei: AiVerification,
}

/// Decoded chat reply
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub ai_name: Option<String>,
    /// Present when the server signaled `verification_triggered` with both blocks
    pub verification: Option<DualVerification>,
}

impl RawChatResponse {
    pub fn into_reply(self) -> Result<ChatReply, ApiError> {
        if !self.ok {
            let reason = self
                .message
                .or(self.toast)
                .unwrap_or_else(|| "AI回复失败".to_string());
            return Err(ApiError::Rejected(reason));
        }

        let verification = match (
            self.verification_triggered,
            self.bazi_verification,
            self.ziwei_verification,
        ) {
            (true, Some(bazi), Some(ziwei)) => Some(DualVerification { bazi, ziwei }),
            _ => None,
        };

        Ok(ChatReply {
            message: self.message.unwrap_or_default(),
            ai_name: self.ai_name,
            verification,
        })
    }
}

// ---------------------------------------------------------------------------
// /verify/api/ocr
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RawOcrResponse {
    pub ok: bool,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Decoded OCR outcome: a failed recognition may still carry partial text.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    Recognized { text: String },
    Failed { partial: Option<String>, reason: String },
}

impl RawOcrResponse {
    pub fn into_outcome(self) -> OcrOutcome {
        if self.ok {
            match self.raw_text {
                Some(text) if !text.trim().is_empty() => OcrOutcome::Recognized { text },
                _ => OcrOutcome::Failed {
                    partial: None,
                    reason: self.toast.unwrap_or_else(|| "识别结果为空".to_string()),
                },
            }
        } else {
            OcrOutcome::Failed {
                partial: self.raw_text.filter(|t| !t.trim().is_empty()),
                reason: self.toast.unwrap_or_else(|| "OCR 识别失败".to_string()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// /verify/api/confirm_true_chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmTrueChartRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfirmResponse {
    pub ok: bool,
    #[serde(default)]
    pub chart_locked: bool,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Acknowledged true-chart confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmAck {
    pub toast: Option<String>,
}

impl RawConfirmResponse {
    pub fn into_ack(self) -> Result<ConfirmAck, ApiError> {
        if !self.ok {
            return Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "确认真命盘失败".to_string()),
            ));
        }
        Ok(ConfirmAck { toast: self.toast })
    }
}

// ---------------------------------------------------------------------------
// /verify/api/validation_log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ValidationLogRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<i64>,
    pub click_data: String,
    pub ai_statement: String,
    pub source_ai: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawValidationLogResponse {
    pub ok: bool,
    #[serde(default)]
    pub toast: Option<String>,
    #[serde(default)]
    pub log_id: Option<i64>,
    #[serde(default)]
    pub ai_verification: Option<AiVerification>,
}

/// Acknowledged validation click, possibly with a fresh AI verification
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationAck {
    pub log_id: Option<i64>,
    pub ai_verification: Option<AiVerification>,
    pub toast: Option<String>,
}

impl RawValidationLogResponse {
    pub fn into_ack(self) -> Result<ValidationAck, ApiError> {
        if !self.ok {
            return Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "记录验证结果失败".to_string()),
            ));
        }
        Ok(ValidationAck {
            log_id: self.log_id,
            ai_verification: self.ai_verification,
            toast: self.toast,
        })
    }
}

// ---------------------------------------------------------------------------
// /verify/api/run_full_chart_ai and SOP templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FullChartRequest {
    /// Always "full_chart"
    pub mode: &'static str,
    pub sop_template_id: String,
    pub bazi_chart: serde_json::Value,
    pub ziwei_chart: serde_json::Value,
    pub user_id: String,
    pub lang: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFullChartResponse {
    pub ok: bool,
    #[serde(default)]
    pub data: Option<FullChartData>,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Full-chart comparison payload; the per-system analyses stay opaque.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FullChartData {
    #[serde(default)]
    pub bazi_analysis: serde_json::Value,
    #[serde(default)]
    pub ziwei_analysis: serde_json::Value,
    #[serde(default)]
    pub primary_ai_summary: serde_json::Value,
    #[serde(default)]
    pub consistency_score: Option<f64>,
    #[serde(default)]
    pub log_id: Option<i64>,
}

/// Completed Mode B analysis
#[derive(Debug, Clone, PartialEq)]
pub struct FullChartAck {
    pub data: FullChartData,
    pub toast: Option<String>,
}

impl RawFullChartResponse {
    pub fn into_ack(self) -> Result<FullChartAck, ApiError> {
        if !self.ok {
            return Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "分析失败".to_string()),
            ));
        }
        Ok(FullChartAck {
            data: self.data.unwrap_or_default(),
            toast: self.toast,
        })
    }
}

/// One selectable SOP analysis template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopTemplate {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSopTemplatesResponse {
    pub ok: bool,
    #[serde(default)]
    pub templates: Vec<SopTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUploadSopResponse {
    pub ok: bool,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub toast: Option<String>,
}

/// Acknowledged custom template upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSopAck {
    pub template_id: String,
    pub toast: Option<String>,
}

impl RawUploadSopResponse {
    pub fn into_ack(self) -> Result<UploadSopAck, ApiError> {
        match (self.ok, self.template_id) {
            (true, Some(template_id)) => Ok(UploadSopAck {
                template_id,
                toast: self.toast,
            }),
            _ => Err(ApiError::Rejected(
                self.toast.unwrap_or_else(|| "模板上传失败".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification(summary: &str) -> AiVerification {
        AiVerification {
            confidence: ConfidenceValue::Label("高".to_string()),
            supporting_evidence: vec!["evidence".to_string()],
            conflicts: vec![],
            summary: summary.to_string(),
            score: None,
        }
    }

    #[test]
    fn test_chart_kind_other() {
        assert_eq!(ChartKind::Bazi.other(), ChartKind::Ziwei);
        assert_eq!(ChartKind::Ziwei.other(), ChartKind::Bazi);
        assert_eq!(ChartKind::Bazi.as_str(), "bazi");
        assert_eq!(ChartKind::Ziwei.display_name(), "紫微");
    }

    #[test]
    fn test_preview_single_shape() {
        let raw: RawPreviewResponse = serde_json::from_value(serde_json::json!({
            "ok": true,
            "score": 0.82,
            "parsed": {"name": "张三", "gender": "男", "birth_time": "1990-01-01 子时"},
            "toast": "识别成功！匹配评分：0.82"
        }))
        .expect("single shape decodes");

        match raw.into_outcome().expect("ok outcome") {
            PreviewOutcome::Single { result, toast } => {
                assert_eq!(result.score, Some(0.82));
                assert_eq!(
                    result.parsed.as_ref().and_then(|p| p.name.as_deref()),
                    Some("张三")
                );
                assert!(result.ai_verification.is_none());
                assert!(toast.is_some());
            }
            other => panic!("expected single outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_dual_shape_requires_marker_and_both_blocks() {
        let raw: RawPreviewResponse = serde_json::from_value(serde_json::json!({
            "ok": true,
            "auto_verified": true,
            "parsed": {"name": "张三"},
            "bazi_verification": {"birth_time_confidence": "高", "summary": "八字吻合"},
            "ziwei_verification": {"birth_time_confidence": 0.5, "summary": "紫微部分吻合"}
        }))
        .expect("dual shape decodes");

        match raw.into_outcome().expect("ok outcome") {
            PreviewOutcome::Dual { bazi, ziwei, .. } => {
                assert_eq!(bazi.level(), ConfidenceLevel::High);
                assert_eq!(ziwei.level(), ConfidenceLevel::Medium);
            }
            other => panic!("expected dual outcome, got {other:?}"),
        }

        // Marker without both blocks degrades to single
        let partial: RawPreviewResponse = serde_json::from_value(serde_json::json!({
            "ok": true,
            "auto_verified": true,
            "bazi_verification": {"birth_time_confidence": "高"}
        }))
        .expect("partial shape decodes");
        assert!(matches!(
            partial.into_outcome().expect("ok outcome"),
            PreviewOutcome::Single { .. }
        ));
    }

    #[test]
    fn test_preview_rejection_carries_toast() {
        let raw: RawPreviewResponse = serde_json::from_value(serde_json::json!({
            "ok": false,
            "toast": "请先输入或上传命盘文本"
        }))
        .expect("rejection decodes");
        match raw.into_outcome() {
            Err(ApiError::Rejected(reason)) => assert_eq!(reason, "请先输入或上传命盘文本"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_parsed_chart_keeps_extra_fields() {
        let parsed: ParsedChart = serde_json::from_value(serde_json::json!({
            "name": "张三",
            "main_star": "紫微",
            "wealth_palace": "财帛宫"
        }))
        .expect("parsed decodes");
        assert_eq!(parsed.main_star.as_deref(), Some("紫微"));
        assert_eq!(
            parsed.extra.get("wealth_palace").and_then(|v| v.as_str()),
            Some("财帛宫")
        );
    }

    #[test]
    fn test_merge_verification_preserves_parsed_fields() {
        let mut result = ChartResult {
            parsed: Some(ParsedChart {
                name: Some("张三".to_string()),
                ..Default::default()
            }),
            score: Some(0.9),
            ai_verification: None,
        };
        result.merge_verification(verification("后来补充的验证"));
        assert_eq!(result.parsed.as_ref().and_then(|p| p.name.as_deref()), Some("张三"));
        assert_eq!(result.score, Some(0.9));
        assert_eq!(
            result.ai_verification.as_ref().map(|v| v.summary.as_str()),
            Some("后来补充的验证")
        );
    }

    #[test]
    fn test_chart_result_confidence_prefers_ai_block() {
        let mut result = ChartResult {
            parsed: None,
            score: Some(0.1),
            ai_verification: None,
        };
        assert_eq!(result.confidence(), Some(ConfidenceLevel::Low));

        result.merge_verification(verification("块优先"));
        assert_eq!(result.confidence(), Some(ConfidenceLevel::High));
    }

    #[test]
    fn test_chat_reply_verification_needs_both_blocks() {
        let raw: RawChatResponse = serde_json::from_value(serde_json::json!({
            "ok": true,
            "message": "验证完成",
            "ai_name": "灵伴",
            "verification_triggered": true,
            "bazi_verification": {"birth_time_confidence": "中高"},
            "ziwei_verification": {"birth_time_confidence": "中"}
        }))
        .expect("chat response decodes");
        let reply = raw.into_reply().expect("ok reply");
        assert!(reply.verification.is_some());

        let raw: RawChatResponse = serde_json::from_value(serde_json::json!({
            "ok": true,
            "message": "还在聊",
            "verification_triggered": true,
            "bazi_verification": {"birth_time_confidence": "中高"}
        }))
        .expect("chat response decodes");
        assert!(raw.into_reply().expect("ok reply").verification.is_none());
    }

    #[test]
    fn test_ocr_failure_keeps_partial_text() {
        let raw = RawOcrResponse {
            ok: false,
            raw_text: Some("甲子年 丙寅月".to_string()),
            toast: Some("图片过暗，识别不完整".to_string()),
        };
        match raw.into_outcome() {
            OcrOutcome::Failed { partial, reason } => {
                assert_eq!(partial.as_deref(), Some("甲子年 丙寅月"));
                assert!(reason.contains("识别不完整"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_ai_verification_accepts_fallback_aliases() {
        let v: AiVerification = serde_json::from_value(serde_json::json!({
            "score": 0.3,
            "key_matches": ["命盘包含姓名信息"],
            "key_mismatches": ["命盘缺少出生时间"],
            "notes": "基于规则的基础验证"
        }))
        .expect("fallback shape decodes");
        assert_eq!(v.supporting_evidence, vec!["命盘包含姓名信息"]);
        assert_eq!(v.conflicts, vec!["命盘缺少出生时间"]);
        // No confidence field: defaults to the lowest level
        assert_eq!(v.level(), ConfidenceLevel::Low);
    }
}
