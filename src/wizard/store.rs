//! Chart Slot Store
//!
//! Holds the per-group chart data for the three parallel candidate-birth-time
//! groups, plus the editor buffers that mirror what the user currently sees.
//! Switching groups persists the editor buffers into the outgoing slot before
//! activating the new one, so no typed text is ever lost.
//!
//! Verification responses are applied through request tokens: each slot/kind
//! pair has a monotonically increasing generation, and only the response for
//! the latest issued generation may mutate the slot. A slow response that was
//! overtaken by a newer upload is discarded.

use crate::api::{AiVerification, ChartKind, ChartResult};

/// Number of parallel candidate-birth-time groups
pub const GROUP_COUNT: usize = 3;

/// Per-kind data within one slot
#[derive(Debug, Clone, Default)]
pub struct SlotEntry {
    /// User-visible/edited chart text
    pub raw_text: String,

    /// Data-URL reference to an uploaded image, kept for preview only
    pub image_ref: Option<String>,

    /// Last successful verification payload
    pub result: Option<ChartResult>,

    /// True once this kind was successfully verified in this slot
    pub uploaded: bool,

    /// Additive statement-validation blocks (Ziwei panel extras)
    pub validations: Vec<AiVerification>,
}

/// One candidate-birth-time group
#[derive(Debug, Clone, Default)]
pub struct ChartSlot {
    bazi: SlotEntry,
    ziwei: SlotEntry,
}

impl ChartSlot {
    pub fn entry(&self, kind: ChartKind) -> &SlotEntry {
        match kind {
            ChartKind::Bazi => &self.bazi,
            ChartKind::Ziwei => &self.ziwei,
        }
    }

    pub fn entry_mut(&mut self, kind: ChartKind) -> &mut SlotEntry {
        match kind {
            ChartKind::Bazi => &mut self.bazi,
            ChartKind::Ziwei => &mut self.ziwei,
        }
    }

    pub fn both_uploaded(&self) -> bool {
        self.bazi.uploaded && self.ziwei.uploaded
    }
}

/// Token identifying one in-flight verification request.
///
/// Only the latest token per slot/kind commits; see [`ChartSlotStore::commit_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    slot: usize,
    kind: ChartKind,
    generation: u64,
}

impl RequestToken {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }
}

/// Store owning all slot data. The verification coordinator is the only
/// writer of `result`/`uploaded`; everything else stages text or reads.
#[derive(Debug)]
pub struct ChartSlotStore {
    slots: [ChartSlot; GROUP_COUNT],
    active: usize,
    /// Editor buffers mirroring the on-screen text fields, per kind
    editor: [String; 2],
    /// Latest issued request generation per slot and kind
    generations: [[u64; 2]; GROUP_COUNT],
}

fn kind_index(kind: ChartKind) -> usize {
    match kind {
        ChartKind::Bazi => 0,
        ChartKind::Ziwei => 1,
    }
}

impl ChartSlotStore {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            active: 0,
            editor: Default::default(),
            generations: [[0; 2]; GROUP_COUNT],
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn current(&self) -> &ChartSlot {
        &self.slots[self.active]
    }

    pub fn slot(&self, index: usize) -> Option<&ChartSlot> {
        self.slots.get(index)
    }

    /// Text currently shown in the editor for this kind.
    pub fn editor_text(&self, kind: ChartKind) -> &str {
        &self.editor[kind_index(kind)]
    }

    /// Stage text into the editor (typing, pasting, file load, OCR result).
    pub fn set_editor_text(&mut self, kind: ChartKind, text: impl Into<String>) {
        self.editor[kind_index(kind)] = text.into();
    }

    /// Switch the active group. Persists the editor buffers into the outgoing
    /// slot first, then loads the incoming slot's text into the editor.
    /// Out-of-range indices are a no-op returning false.
    pub fn switch_to(&mut self, index: usize) -> bool {
        if index >= GROUP_COUNT {
            return false;
        }

        // Read-before-switch: never lose what is on screen.
        let outgoing = &mut self.slots[self.active];
        outgoing.bazi.raw_text = self.editor[0].clone();
        outgoing.ziwei.raw_text = self.editor[1].clone();

        self.active = index;

        let incoming = &self.slots[self.active];
        self.editor[0] = incoming.bazi.raw_text.clone();
        self.editor[1] = incoming.ziwei.raw_text.clone();
        true
    }

    /// Issue a request token for the active slot and the given kind,
    /// invalidating any older in-flight request for that pair.
    pub fn begin_request(&mut self, kind: ChartKind) -> RequestToken {
        let generation = &mut self.generations[self.active][kind_index(kind)];
        *generation += 1;
        RequestToken {
            slot: self.active,
            kind,
            generation: *generation,
        }
    }

    /// Whether this token is still the latest issued for its slot/kind.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.generations[token.slot][kind_index(token.kind)] == token.generation
    }

    /// Apply a verification result for the request identified by `token`.
    /// Stale tokens are rejected and nothing is mutated. The result lands in
    /// the slot that issued the request, even if another slot is active now.
    pub fn commit_result(
        &mut self,
        token: RequestToken,
        text: String,
        result: ChartResult,
    ) -> bool {
        if !self.is_current(token) {
            tracing::debug!(
                "Discarding stale verification response: slot={} kind={}",
                token.slot,
                token.kind
            );
            return false;
        }

        let entry = self.slots[token.slot].entry_mut(token.kind);
        entry.raw_text = text.clone();
        entry.result = Some(result);
        entry.uploaded = true;
        if token.slot == self.active {
            self.editor[kind_index(token.kind)] = text;
        }
        true
    }

    /// Field-preserving merge of an AI verification block into a slot entry's
    /// result. Creates an empty result first if none exists (the dual
    /// inference path stores display data without marking `uploaded`).
    pub fn merge_verification(&mut self, slot: usize, kind: ChartKind, verification: AiVerification) {
        if let Some(chart_slot) = self.slots.get_mut(slot) {
            let entry = chart_slot.entry_mut(kind);
            entry
                .result
                .get_or_insert_with(ChartResult::default)
                .merge_verification(verification);
        }
    }

    /// Record an image reference for preview in the active slot.
    pub fn set_image_ref(&mut self, kind: ChartKind, image_ref: String) {
        self.slots[self.active].entry_mut(kind).image_ref = Some(image_ref);
    }

    /// Append a statement-validation block to the active slot's entry.
    pub fn push_validation(&mut self, kind: ChartKind, verification: AiVerification) {
        self.slots[self.active]
            .entry_mut(kind)
            .validations
            .push(verification);
    }
}

impl Default for ChartSlotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_score(score: f64) -> ChartResult {
        ChartResult {
            parsed: None,
            score: Some(score),
            ai_verification: None,
        }
    }

    #[test]
    fn test_switch_round_trip_preserves_text() {
        let mut store = ChartSlotStore::new();
        store.set_editor_text(ChartKind::Bazi, "甲子年生");
        store.set_editor_text(ChartKind::Ziwei, "命宫紫微");

        assert!(store.switch_to(1));
        assert_eq!(store.editor_text(ChartKind::Bazi), "");
        store.set_editor_text(ChartKind::Bazi, "乙丑年生");

        assert!(store.switch_to(0));
        assert_eq!(store.editor_text(ChartKind::Bazi), "甲子年生");
        assert_eq!(store.editor_text(ChartKind::Ziwei), "命宫紫微");

        assert!(store.switch_to(1));
        assert_eq!(store.editor_text(ChartKind::Bazi), "乙丑年生");
    }

    #[test]
    fn test_out_of_range_switch_is_noop() {
        let mut store = ChartSlotStore::new();
        store.set_editor_text(ChartKind::Bazi, "甲子年生");

        assert!(!store.switch_to(GROUP_COUNT));
        assert!(!store.switch_to(99));
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.editor_text(ChartKind::Bazi), "甲子年生");
    }

    #[test]
    fn test_commit_sets_result_and_uploaded() {
        let mut store = ChartSlotStore::new();
        let token = store.begin_request(ChartKind::Bazi);
        assert!(store.commit_result(token, "甲子年生".to_string(), result_with_score(0.8)));

        let entry = store.current().entry(ChartKind::Bazi);
        assert!(entry.uploaded);
        assert_eq!(entry.result.as_ref().and_then(|r| r.score), Some(0.8));
        assert_eq!(entry.raw_text, "甲子年生");

        // The other kind is untouched
        let other = store.current().entry(ChartKind::Ziwei);
        assert!(!other.uploaded);
        assert!(other.result.is_none());
    }

    #[test]
    fn test_stale_token_is_discarded() {
        let mut store = ChartSlotStore::new();
        let first = store.begin_request(ChartKind::Bazi);
        let second = store.begin_request(ChartKind::Bazi);

        // The newer request resolves first
        assert!(store.commit_result(second, "新文本".to_string(), result_with_score(0.9)));
        // The older one must not overwrite it
        assert!(!store.commit_result(first, "旧文本".to_string(), result_with_score(0.1)));

        let entry = store.current().entry(ChartKind::Bazi);
        assert_eq!(entry.raw_text, "新文本");
        assert_eq!(entry.result.as_ref().and_then(|r| r.score), Some(0.9));
    }

    #[test]
    fn test_tokens_are_per_kind() {
        let mut store = ChartSlotStore::new();
        let bazi = store.begin_request(ChartKind::Bazi);
        let ziwei = store.begin_request(ChartKind::Ziwei);

        // Issuing a ziwei request does not invalidate the bazi one
        assert!(store.commit_result(bazi, "八字".to_string(), result_with_score(0.5)));
        assert!(store.commit_result(ziwei, "紫微".to_string(), result_with_score(0.6)));
    }

    #[test]
    fn test_commit_lands_in_originating_slot_after_switch() {
        let mut store = ChartSlotStore::new();
        let token = store.begin_request(ChartKind::Bazi);
        assert!(store.switch_to(2));

        assert!(store.commit_result(token, "甲子年生".to_string(), result_with_score(0.7)));

        // Slot 0 received the result; the active slot 2 did not
        assert!(store.slot(0).map(|s| s.entry(ChartKind::Bazi).uploaded).unwrap_or(false));
        assert!(!store.current().entry(ChartKind::Bazi).uploaded);
        // The editor shows slot 2's (empty) text, not the committed text
        assert_eq!(store.editor_text(ChartKind::Bazi), "");
    }

    #[test]
    fn test_merge_verification_without_upload_flag() {
        let mut store = ChartSlotStore::new();
        let verification = AiVerification {
            summary: "推断验证".to_string(),
            ..Default::default()
        };
        store.merge_verification(0, ChartKind::Ziwei, verification);

        let entry = store.current().entry(ChartKind::Ziwei);
        assert!(entry.result.is_some());
        assert!(!entry.uploaded);
    }

    #[test]
    fn test_push_validation_is_additive() {
        let mut store = ChartSlotStore::new();
        store.push_validation(ChartKind::Ziwei, AiVerification::default());
        store.push_validation(ChartKind::Ziwei, AiVerification::default());
        assert_eq!(store.current().entry(ChartKind::Ziwei).validations.len(), 2);
    }
}
