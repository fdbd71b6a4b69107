//! Shared test backend: an in-memory [`VerifyBackend`] with scriptable
//! responses and a call log, so wizard flows run without a network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use truechart::api::{
    AiVerification, ApiError, ChartResult, ChatReply, ChatRequest, ConfidenceValue, ConfirmAck,
    ConfirmTrueChartRequest, FullChartAck, FullChartData, FullChartRequest, OcrOutcome,
    ParsedChart, PreviewOutcome, PreviewRequest, Result, SopTemplate, SubmitAck, SubmitRequest,
    UploadSopAck, ValidationAck, ValidationLogRequest, VerifyBackend,
};

pub fn sample_verification(summary: &str, confidence: &str) -> AiVerification {
    AiVerification {
        confidence: ConfidenceValue::Label(confidence.to_string()),
        supporting_evidence: vec!["与讲述一致".to_string()],
        conflicts: vec![],
        summary: summary.to_string(),
        score: None,
    }
}

pub fn single_outcome(score: f64, name: &str) -> PreviewOutcome {
    PreviewOutcome::Single {
        result: ChartResult {
            parsed: Some(ParsedChart {
                name: Some(name.to_string()),
                gender: Some("男".to_string()),
                birth_time: Some("1990-01-01 子时".to_string()),
                ..Default::default()
            }),
            score: Some(score),
            ai_verification: None,
        },
        toast: None,
    }
}

pub fn dual_outcome(score: f64) -> PreviewOutcome {
    PreviewOutcome::Dual {
        result: ChartResult {
            parsed: Some(ParsedChart::default()),
            score: Some(score),
            ai_verification: None,
        },
        bazi: sample_verification("八字与事件吻合", "高"),
        ziwei: sample_verification("紫微与事件部分吻合", "中"),
        toast: Some("AI自动验证完成".to_string()),
    }
}

pub fn plain_reply(message: &str) -> ChatReply {
    ChatReply {
        message: message.to_string(),
        ai_name: Some("灵伴".to_string()),
        verification: None,
    }
}

/// Scriptable in-memory backend. Queued responses are consumed first; when a
/// queue is empty a benign default is returned. Every call is recorded.
#[derive(Default)]
pub struct StubBackend {
    pub calls: Mutex<Vec<String>>,
    pub preview_queue: Mutex<VecDeque<Result<PreviewOutcome>>>,
    pub chat_queue: Mutex<VecDeque<Result<ChatReply>>>,
    pub ocr_queue: Mutex<VecDeque<Result<OcrOutcome>>>,
    pub submit_queue: Mutex<VecDeque<Result<SubmitAck>>>,
    pub confirm_queue: Mutex<VecDeque<Result<ConfirmAck>>>,
    pub validation_queue: Mutex<VecDeque<Result<ValidationAck>>>,
    pub full_chart_queue: Mutex<VecDeque<Result<FullChartAck>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("call log lock").push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log lock").clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn queue_preview(&self, outcome: Result<PreviewOutcome>) {
        self.preview_queue
            .lock()
            .expect("preview queue lock")
            .push_back(outcome);
    }

    pub fn queue_chat(&self, reply: Result<ChatReply>) {
        self.chat_queue
            .lock()
            .expect("chat queue lock")
            .push_back(reply);
    }

    pub fn queue_ocr(&self, outcome: Result<OcrOutcome>) {
        self.ocr_queue
            .lock()
            .expect("ocr queue lock")
            .push_back(outcome);
    }

    pub fn queue_confirm(&self, ack: Result<ConfirmAck>) {
        self.confirm_queue
            .lock()
            .expect("confirm queue lock")
            .push_back(ack);
    }

    pub fn queue_full_chart(&self, ack: Result<FullChartAck>) {
        self.full_chart_queue
            .lock()
            .expect("full chart queue lock")
            .push_back(ack);
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T>>>) -> Option<Result<T>> {
        queue.lock().expect("queue lock").pop_front()
    }
}

#[async_trait]
impl VerifyBackend for StubBackend {
    async fn preview(&self, request: PreviewRequest) -> Result<PreviewOutcome> {
        let kind = request
            .chart_type
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| "none".to_string());
        self.record(format!("preview:{kind}"));
        Self::pop(&self.preview_queue).unwrap_or_else(|| Ok(single_outcome(0.9, "张三")))
    }

    async fn submit(&self, request: SubmitRequest) -> Result<SubmitAck> {
        self.record(format!("submit:{}", request.user_id));
        Self::pop(&self.submit_queue).unwrap_or(Ok(SubmitAck {
            record_id: Some(7),
            score: Some(0.88),
            toast: None,
        }))
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        self.record(format!("chat:{}", request.message));
        Self::pop(&self.chat_queue).unwrap_or_else(|| Ok(plain_reply("我收到你的消息了。")))
    }

    async fn ocr(&self, file_name: String, _mime: String, _bytes: Vec<u8>) -> Result<OcrOutcome> {
        self.record(format!("ocr:{file_name}"));
        Self::pop(&self.ocr_queue).unwrap_or(Ok(OcrOutcome::Recognized {
            text: "甲子年 丙寅月 戊午日 庚申时".to_string(),
        }))
    }

    async fn confirm_true_chart(&self, request: ConfirmTrueChartRequest) -> Result<ConfirmAck> {
        self.record(format!("confirm:{}", request.user_id));
        Self::pop(&self.confirm_queue).unwrap_or(Ok(ConfirmAck { toast: None }))
    }

    async fn validation_log(&self, request: ValidationLogRequest) -> Result<ValidationAck> {
        self.record(format!("validation:{}", request.click_data));
        Self::pop(&self.validation_queue).unwrap_or_else(|| {
            Ok(ValidationAck {
                log_id: Some(1),
                ai_verification: Some(sample_verification("断语与命盘相符", "中高")),
                toast: None,
            })
        })
    }

    async fn run_full_chart_ai(&self, request: FullChartRequest) -> Result<FullChartAck> {
        self.record(format!("full_chart:{}", request.sop_template_id));
        Self::pop(&self.full_chart_queue).unwrap_or(Ok(FullChartAck {
            data: FullChartData {
                consistency_score: Some(85.0),
                ..Default::default()
            },
            toast: Some("全盘验证完成！一致性评分: 85/100".to_string()),
        }))
    }

    async fn sop_templates(&self) -> Result<Vec<SopTemplate>> {
        self.record("sop_templates");
        Ok(vec![])
    }

    async fn upload_sop(&self, file_name: String, _bytes: Vec<u8>) -> Result<UploadSopAck> {
        self.record(format!("upload_sop:{file_name}"));
        Ok(UploadSopAck {
            template_id: "custom_v1".to_string(),
            toast: None,
        })
    }
}

// Keep the unused-helper lint quiet across test binaries that use subsets.
#[allow(dead_code)]
pub fn rejected(reason: &str) -> ApiError {
    ApiError::Rejected(reason.to_string())
}
