use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::{FAILURE_MESSAGE, GenerationError};
use crate::models::{
    ControllerSnapshot, GenerateForm, GenerationRequest, GenerationResult, LengthCategory,
};
use crate::services::llm::TextGenerator;
use crate::services::prompt::render_prompt;

#[derive(Debug, Default)]
struct FormState {
    credential: String,
    topic: String,
    length: Option<LengthCategory>,
    /// `None` is idle.
    result: Option<GenerationResult>,
}

impl FormState {
    fn is_submitting(&self) -> bool {
        matches!(self.result, Some(GenerationResult::Pending))
    }

    fn request(&self) -> Option<GenerationRequest> {
        if self.credential.trim().is_empty() || self.topic.trim().is_empty() {
            return None;
        }
        Some(GenerationRequest {
            topic: self.topic.clone(),
            length: self.length?,
            credential: self.credential.clone(),
        })
    }

    fn can_submit(&self) -> bool {
        !self.is_submitting() && self.request().is_some()
    }

    fn apply(&mut self, form: &GenerateForm) -> Result<(), GenerationError> {
        if self.is_submitting() {
            return Err(GenerationError::SubmissionInFlight);
        }
        let length = parse_length(&form.length)?;
        self.credential = form.credential.clone();
        self.topic = form.topic.clone();
        self.length = length;
        Ok(())
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            topic: self.topic.clone(),
            length: self.length,
            has_credential: !self.credential.trim().is_empty(),
            can_submit: self.can_submit(),
            result: self.result.clone(),
        }
    }

    /// Moves to `Pending` and hands out the request, or `None` when the
    /// form cannot be submitted right now.
    fn begin(&mut self) -> Option<GenerationRequest> {
        if self.is_submitting() {
            debug!("submission ignored, another one is in flight");
            return None;
        }
        let Some(request) = self.request() else {
            debug!("submission ignored, form is incomplete");
            return None;
        };
        self.result = Some(GenerationResult::Pending);
        Some(request)
    }
}

/// Owns the form fields and the outcome of the latest submission.
///
/// At most one submission is in flight: while the result is `Pending`,
/// `can_submit` is false and `submit` is a no-op.
pub struct GenerationController {
    provider: Arc<dyn TextGenerator>,
    state: Mutex<FormState>,
}

impl GenerationController {
    pub fn new(provider: Arc<dyn TextGenerator>) -> Self {
        Self {
            provider,
            state: Mutex::new(FormState::default()),
        }
    }

    pub async fn set_credential(&self, credential: impl Into<String>) {
        self.state.lock().await.credential = credential.into();
    }

    pub async fn set_topic(&self, topic: impl Into<String>) {
        self.state.lock().await.topic = topic.into();
    }

    /// An empty label clears the selection. Unknown labels are rejected and
    /// the current selection is kept.
    pub async fn set_length(&self, label: &str) -> Result<(), GenerationError> {
        let length = parse_length(label)?;
        self.state.lock().await.length = length;
        Ok(())
    }

    /// Replaces all three fields at once. Nothing changes if the length label
    /// is unknown or a submission is in flight.
    pub async fn apply_form(&self, form: &GenerateForm) -> Result<(), GenerationError> {
        self.state.lock().await.apply(form)
    }

    /// True when credential, topic and length are all set and nothing is in
    /// flight. Whitespace-only credential or topic counts as empty.
    pub async fn can_submit(&self) -> bool {
        self.state.lock().await.can_submit()
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.lock().await.is_submitting()
    }

    pub async fn result(&self) -> Option<GenerationResult> {
        self.state.lock().await.result.clone()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Drops the last result. Ignored while a submission is in flight.
    pub async fn reset(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.is_submitting() {
            return false;
        }
        state.result = None;
        true
    }

    /// Runs one generation from the current fields.
    ///
    /// Returns `None` without touching the state or the network when
    /// `can_submit` is false. Otherwise the result is `Pending` until the
    /// provider answers, then `Success` or `Failure`. There is no timeout
    /// here: if the provider never answers, neither does this.
    pub async fn submit(self: &Arc<Self>) -> Option<GenerationResult> {
        let request = self.state.lock().await.begin()?;
        self.dispatch(request).await.result
    }

    /// Applies the posted fields and starts a submission in one step, so a
    /// concurrent post can neither slip in between nor overwrite the fields
    /// of a running submission.
    ///
    /// `Ok(None)` means the form is incomplete. The returned snapshot is the
    /// state at the moment this submission's result was stored.
    pub async fn submit_form(
        self: &Arc<Self>,
        form: &GenerateForm,
    ) -> Result<Option<ControllerSnapshot>, GenerationError> {
        let request = {
            let mut state = self.state.lock().await;
            state.apply(form)?;
            state.begin()
        };
        match request {
            Some(request) => Ok(Some(self.dispatch(request).await)),
            None => Ok(None),
        }
    }

    async fn dispatch(self: &Arc<Self>, request: GenerationRequest) -> ControllerSnapshot {
        let request_id = Uuid::new_v4();
        let span = info_span!("generation", %request_id, length = %request.length);

        // Spawned so a dropped caller cannot leave the state stuck on Pending.
        let controller = Arc::clone(self);
        let task = tokio::spawn(
            async move {
                let result = controller.generate(request).await;
                let mut state = controller.state.lock().await;
                state.result = Some(result);
                state.snapshot()
            }
            .instrument(span),
        );

        match task.await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%request_id, error = %err, "generation task did not complete");
                let mut state = self.state.lock().await;
                state.result = Some(GenerationResult::Failure(FAILURE_MESSAGE.to_string()));
                state.snapshot()
            }
        }
    }

    async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        let prompt = render_prompt(&request.topic, request.length);
        info!(words = request.length.word_count(), "requesting article");

        match self.provider.generate(&prompt, &request.credential).await {
            Ok(text) => {
                info!(chars = text.len(), "article generated");
                GenerationResult::Success(text)
            }
            Err(err) => {
                let err = GenerationError::from(err);
                warn!(error = %err, "article generation failed");
                GenerationResult::Failure(FAILURE_MESSAGE.to_string())
            }
        }
    }
}

fn parse_length(label: &str) -> Result<Option<LengthCategory>, GenerationError> {
    if label.is_empty() {
        Ok(None)
    } else {
        label.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Answers with a fixed outcome and records every prompt it sees.
    struct ScriptedProvider {
        calls: AtomicUsize,
        prompts: std::sync::Mutex<Vec<(String, String)>>,
        reply: Option<String>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                prompts: std::sync::Mutex::new(Vec::new()),
                reply: Some(text.to_string()),
                gate: None,
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                ..Self::replying("")
            }
        }

        fn gated(text: &str, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::replying(text)
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedProvider {
        async fn generate(&self, prompt: &str, credential: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), credential.to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(ProviderError::NoChoices),
            }
        }
    }

    async fn filled(provider: Arc<ScriptedProvider>) -> Arc<GenerationController> {
        let controller = Arc::new(GenerationController::new(provider));
        controller.set_credential("sk-test").await;
        controller.set_topic("Rust ownership").await;
        controller.set_length("short").await.unwrap();
        controller
    }

    #[tokio::test]
    async fn can_submit_requires_every_field() {
        for mask in 0..8u8 {
            let controller = GenerationController::new(Arc::new(ScriptedProvider::replying("x")));
            if mask & 1 != 0 {
                controller.set_credential("sk-test").await;
            }
            if mask & 2 != 0 {
                controller.set_topic("topic").await;
            }
            if mask & 4 != 0 {
                controller.set_length("long").await.unwrap();
            }
            assert_eq!(controller.can_submit().await, mask == 7, "mask {mask:03b}");
        }
    }

    #[tokio::test]
    async fn whitespace_fields_count_as_empty() {
        let controller = filled(Arc::new(ScriptedProvider::replying("x"))).await;
        controller.set_topic("   ").await;
        assert!(!controller.can_submit().await);
    }

    #[tokio::test]
    async fn blocked_submit_has_no_side_effects() {
        let provider = Arc::new(ScriptedProvider::replying("x"));
        let controller = Arc::new(GenerationController::new(provider.clone()));
        controller.set_topic("no credential").await;
        controller.set_length("medium").await.unwrap();

        assert_eq!(controller.submit().await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.result().await, None);
    }

    #[tokio::test]
    async fn successful_submit_stores_text() {
        let provider = Arc::new(ScriptedProvider::replying("Hello world"));
        let controller = filled(provider.clone()).await;

        let result = controller.submit().await;
        assert_eq!(result, Some(GenerationResult::Success("Hello world".into())));
        assert_eq!(controller.result().await, result);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let prompts = provider.prompts.lock().unwrap();
        let (prompt, credential) = &prompts[0];
        assert!(prompt.contains("Rust ownership"));
        assert!(prompt.contains("around 300 words"));
        assert_eq!(credential, "sk-test");
    }

    #[tokio::test]
    async fn provider_failure_becomes_fixed_message() {
        let controller = filled(Arc::new(ScriptedProvider::failing())).await;
        assert_eq!(
            controller.submit().await,
            Some(GenerationResult::Failure(FAILURE_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn overlapping_submit_is_rejected() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated("done", gate.clone()));
        let controller = filled(provider.clone()).await;

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        while !controller.is_submitting().await {
            tokio::task::yield_now().await;
        }

        assert!(!controller.can_submit().await);
        assert_eq!(controller.submit().await, None);
        assert!(!controller.reset().await);
        assert_eq!(controller.result().await, Some(GenerationResult::Pending));

        gate.notify_one();
        assert_eq!(
            first.await.unwrap(),
            Some(GenerationResult::Success("done".into()))
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(controller.can_submit().await);
    }

    #[tokio::test]
    async fn resubmission_replaces_previous_result() {
        let provider = Arc::new(ScriptedProvider::replying("again"));
        let controller = filled(provider.clone()).await;
        controller.submit().await;
        controller.set_length("long").await.unwrap();
        controller.submit().await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[1].0.contains("around 1200 words"));
    }

    #[tokio::test]
    async fn unknown_length_keeps_selection() {
        let controller = filled(Arc::new(ScriptedProvider::replying("x"))).await;
        let err = controller.set_length("bogus").await.unwrap_err();
        assert!(matches!(err, GenerationError::UnknownLengthCategory(_)));
        assert_eq!(
            controller.snapshot().await.length,
            Some(LengthCategory::Short)
        );

        controller.set_length("").await.unwrap();
        assert_eq!(controller.snapshot().await.length, None);
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let controller = filled(Arc::new(ScriptedProvider::replying("x"))).await;
        controller.submit().await;
        assert!(controller.reset().await);
        assert_eq!(controller.result().await, None);
    }

    #[tokio::test]
    async fn snapshot_hides_credential() {
        let controller = filled(Arc::new(ScriptedProvider::replying("x"))).await;
        let snapshot = controller.snapshot().await;
        assert!(snapshot.has_credential);
        assert!(snapshot.can_submit);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("sk-test"));
    }
    fn form(credential: &str, topic: &str, length: &str) -> GenerateForm {
        GenerateForm {
            credential: credential.to_string(),
            topic: topic.to_string(),
            length: length.to_string(),
        }
    }

    #[tokio::test]
    async fn fields_are_frozen_while_pending() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated("done", gate.clone()));
        let controller = Arc::new(GenerationController::new(provider.clone()));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move {
                controller
                    .submit_form(&form("sk-test", "topic A", "short"))
                    .await
            }
        });
        while !controller.is_submitting().await {
            tokio::task::yield_now().await;
        }

        let err = controller
            .apply_form(&form("", "topic B", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::SubmissionInFlight));

        let err = controller
            .submit_form(&form("sk-other", "topic C", "long"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::SubmissionInFlight));

        let pending = controller.snapshot().await;
        assert_eq!(pending.topic, "topic A");
        assert_eq!(pending.length, Some(LengthCategory::Short));
        assert!(pending.has_credential);

        gate.notify_one();
        let done = first.await.unwrap().unwrap().unwrap();
        assert_eq!(done.topic, "topic A");
        assert!(done.has_credential);
        assert_eq!(done.result, Some(GenerationResult::Success("done".into())));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submit_form_returns_its_own_result() {
        let provider = Arc::new(ScriptedProvider::replying("Hello world"));
        let controller = Arc::new(GenerationController::new(provider.clone()));

        let snapshot = controller
            .submit_form(&form("sk-test", "Rust ownership", "short"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            snapshot.result,
            Some(GenerationResult::Success("Hello world".into()))
        );
        assert!(snapshot.can_submit);
        assert!(provider.prompts.lock().unwrap()[0].0.contains("around 300 words"));
    }

    #[tokio::test]
    async fn submit_form_rejects_bad_input_without_side_effects() {
        let provider = Arc::new(ScriptedProvider::replying("x"));
        let controller = Arc::new(GenerationController::new(provider.clone()));

        let err = controller
            .submit_form(&form("sk-test", "topic", "bogus"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnknownLengthCategory(_)));
        assert_eq!(controller.snapshot().await.topic, "");

        let incomplete = controller
            .submit_form(&form("sk-test", "   ", "short"))
            .await
            .unwrap();
        assert_eq!(incomplete, None);
        assert_eq!(controller.result().await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
