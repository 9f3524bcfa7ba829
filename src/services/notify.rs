use crate::domain::models::{FieldComment, FormSubmission};
use async_trait::async_trait;
use uuid::Uuid;

/// Outbound notifications. Mail delivery lives behind this seam.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn edit_request_created(
        &self,
        admin_ids: &[Uuid],
        submission: &FormSubmission,
        request: &FieldComment,
    );

    async fn verification_token(&self, email: &str, token: &str);

    async fn password_reset_token(&self, email: &str, token: &str);
}

/// Emits notifications as log events.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn edit_request_created(
        &self,
        admin_ids: &[Uuid],
        submission: &FormSubmission,
        request: &FieldComment,
    ) {
        tracing::info!(
            submission_id = %submission.id,
            form_type = %submission.form_type,
            comment_id = %request.id,
            recipients = admin_ids.len(),
            "Edit request awaiting review"
        );
    }

    async fn verification_token(&self, email: &str, token: &str) {
        tracing::info!("Verification token issued for {}", email);
        tracing::debug!(%token, "Verification token");
    }

    async fn password_reset_token(&self, email: &str, token: &str) {
        tracing::info!("Password reset token issued for {}", email);
        tracing::debug!(%token, "Password reset token");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures notifications for assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn edit_request_created(
            &self,
            admin_ids: &[Uuid],
            submission: &FormSubmission,
            _request: &FieldComment,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("edit_request:{}:{}", submission.id, admin_ids.len()));
        }

        async fn verification_token(&self, email: &str, token: &str) {
            self.events.lock().unwrap().push(format!("verify:{email}:{token}"));
        }

        async fn password_reset_token(&self, email: &str, token: &str) {
            self.events.lock().unwrap().push(format!("reset:{email}:{token}"));
        }
    }

    #[tokio::test]
    async fn notifier_is_object_safe() {
        let recorder = std::sync::Arc::new(RecordingNotifier::default());
        let notifier: std::sync::Arc<dyn Notifier> = recorder.clone();
        notifier.verification_token("a@b.com", "tok").await;
        notifier.password_reset_token("a@b.com", "tok2").await;
        TracingNotifier.verification_token("a@b.com", "tok").await;
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["verify:a@b.com:tok".to_string(), "reset:a@b.com:tok2".to_string()]
        );
    }
}
