//! Mode B Full-Chart Analysis
//!
//! The companion-led full-chart comparison flow, parallel to the per-chart
//! verification path. Activates when the current slot has both charts
//! uploaded, requires an SOP template selection, and guards its run against
//! double submission: the guard is set synchronously before the network call
//! and cleared only on failure, so a completed run cannot be repeated without
//! a fresh activation.

use super::events::{emit, EventSink, WizardEvent};
use super::store::ChartSlot;
use crate::api::{ChartKind, FullChartAck, FullChartRequest, SopTemplate, VerifyBackend};

/// Readiness ladder for the action button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeBReadiness {
    NeedsCharts,
    NeedsTemplate,
    Ready,
}

impl ModeBReadiness {
    /// Button label naming the unmet precondition.
    pub fn label(&self) -> &'static str {
        match self {
            ModeBReadiness::NeedsCharts => "请先上传两份命盘",
            ModeBReadiness::NeedsTemplate => "请选择分析模板",
            ModeBReadiness::Ready => "开始全盘分析",
        }
    }
}

/// Controller for the optional full-chart comparison
#[derive(Debug)]
pub struct ModeBController {
    events: EventSink,
    active: bool,
    template_id: Option<String>,
    submitted: bool,
}

impl ModeBController {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            active: false,
            template_id: None,
            submitted: false,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    /// Recompute activation from the current slot. Deactivating (slot
    /// switched away or charts gone) clears the submission guard so a fresh
    /// activation can run again.
    pub fn sync_activation(&mut self, slot: &ChartSlot) {
        let now_active = slot.both_uploaded();
        if self.active && !now_active {
            self.submitted = false;
        }
        if self.active != now_active {
            self.active = now_active;
            emit(
                &self.events,
                WizardEvent::ModeBReadiness(self.readiness()),
            );
        }
    }

    pub fn select_template(&mut self, template_id: impl Into<String>) {
        self.template_id = Some(template_id.into());
        emit(
            &self.events,
            WizardEvent::ModeBReadiness(self.readiness()),
        );
    }

    pub fn readiness(&self) -> ModeBReadiness {
        if !self.active {
            ModeBReadiness::NeedsCharts
        } else if self.template_id.is_none() {
            ModeBReadiness::NeedsTemplate
        } else {
            ModeBReadiness::Ready
        }
    }

    /// Run the full-chart analysis. The re-entry guard is set before the
    /// request is sent; a second call while one is in flight (or after a
    /// completed run) performs no network call and returns `None`.
    pub async fn run(
        &mut self,
        backend: &dyn VerifyBackend,
        slot: &ChartSlot,
        user_id: &str,
    ) -> Option<FullChartAck> {
        match self.readiness() {
            ModeBReadiness::Ready => {}
            not_ready => {
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(not_ready.label().to_string()),
                );
                return None;
            }
        }
        if self.submitted {
            return None;
        }
        self.submitted = true;

        let chart_value = |kind: ChartKind| {
            slot.entry(kind)
                .result
                .as_ref()
                .and_then(|r| r.parsed.as_ref())
                .and_then(|p| serde_json::to_value(p).ok())
                .unwrap_or(serde_json::Value::Null)
        };

        let request = FullChartRequest {
            mode: "full_chart",
            sop_template_id: self
                .template_id
                .clone()
                .unwrap_or_else(|| "standard_v1".to_string()),
            bazi_chart: chart_value(ChartKind::Bazi),
            ziwei_chart: chart_value(ChartKind::Ziwei),
            user_id: user_id.to_string(),
            lang: "zh".to_string(),
        };

        match backend.run_full_chart_ai(request).await {
            Ok(ack) => {
                if let Some(toast) = &ack.toast {
                    emit(&self.events, WizardEvent::SystemNote(toast.clone()));
                }
                Some(ack)
            }
            Err(err) => {
                tracing::warn!("Full-chart analysis failed: {err}");
                // Allow a retry after failure
                self.submitted = false;
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!("分析失败：{}", err.user_message())),
                );
                None
            }
        }
    }

    /// Fetch the selectable SOP templates, falling back to the built-in set
    /// when the server has none configured.
    pub async fn list_templates(&self, backend: &dyn VerifyBackend) -> Vec<SopTemplate> {
        match backend.sop_templates().await {
            Ok(templates) if !templates.is_empty() => templates,
            Ok(_) => default_templates(),
            Err(err) => {
                tracing::warn!("Template listing failed: {err}");
                default_templates()
            }
        }
    }

    /// Upload a custom SOP template and select it on success.
    pub async fn upload_template(
        &mut self,
        backend: &dyn VerifyBackend,
        file_name: String,
        bytes: Vec<u8>,
    ) -> bool {
        match backend.upload_sop(file_name, bytes).await {
            Ok(ack) => {
                if let Some(toast) = ack.toast {
                    emit(&self.events, WizardEvent::SystemNote(toast));
                }
                self.select_template(ack.template_id);
                true
            }
            Err(err) => {
                emit(
                    &self.events,
                    WizardEvent::ErrorBubble(format!("上传失败：{}", err.user_message())),
                );
                false
            }
        }
    }
}

fn default_templates() -> Vec<SopTemplate> {
    vec![
        SopTemplate {
            id: "standard_v1".to_string(),
            name: "标准全盘分析 v1.0".to_string(),
        },
        SopTemplate {
            id: "career_focused_v1".to_string(),
            name: "事业重点分析 v1.0".to_string(),
        },
        SopTemplate {
            id: "relationship_focused_v1".to_string(),
            name: "感情重点分析 v1.0".to_string(),
        },
    ]
}
