use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        submission::{
            ContactFormRequest, NewSubmission, OnboardingRequest, Submission, SubmissionCreatedResponse,
            SubmissionFilter, SubmissionListResponse, SubmissionStats, SubmissionStatus,
        },
        Pagination,
    },
    errors::AppError,
    notify::Notifier,
    repositories::submission::SubmissionRepository,
};

pub struct SubmissionHandler<R>
where
    R: SubmissionRepository,
{
    pub submission_repo: R,
    pub notifier: Arc<dyn Notifier>,
}

impl<R> SubmissionHandler<R>
where
    R: SubmissionRepository,
{
    pub fn new(submission_repo: R, notifier: Arc<dyn Notifier>) -> Self {
        SubmissionHandler { submission_repo, notifier }
    }

    pub async fn submit_contact(
        &self,
        request: ContactFormRequest,
        ip_address: Option<String>,
    ) -> Result<SubmissionCreatedResponse, AppError> {
        request.validate()?;
        self.submit(request.into_new_submission(ip_address)).await
    }

    pub async fn submit_onboarding(
        &self,
        request: OnboardingRequest,
        ip_address: Option<String>,
    ) -> Result<SubmissionCreatedResponse, AppError> {
        request.validate()?;
        self.submit(request.into_new_submission(ip_address)).await
    }

    /// Persists first; the notification is a side effect whose failure is
    /// logged and never surfaces to the submitter.
    async fn submit(&self, new: NewSubmission) -> Result<SubmissionCreatedResponse, AppError> {
        let submission = self.submission_repo.create_submission(&new).await?;
        tracing::info!(submission_id = %submission.id, kind = %submission.kind, "Submission stored");

        if let Err(e) = self.notifier.notify_submission(&submission).await {
            tracing::warn!(
                submission_id = %submission.id,
                notifier = self.notifier.name(),
                error = %e,
                "Submission notification failed"
            );
        }

        Ok(SubmissionCreatedResponse {
            success: true,
            id: submission.id,
            message: "Thank you! We'll be in touch shortly.".to_string(),
        })
    }

    pub async fn list(&self, filter: &SubmissionFilter) -> Result<SubmissionListResponse, AppError> {
        let (submissions, total) = self.submission_repo.list_submissions(filter).await?;

        Ok(SubmissionListResponse {
            submissions,
            pagination: Pagination::new(total, filter.limit, filter.offset),
        })
    }

    pub async fn get(&self, id: &Uuid) -> Result<Submission, AppError> {
        self.submission_repo
            .get_submission(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".into()))
    }

    pub async fn update_status(&self, id: &Uuid, status: SubmissionStatus) -> Result<Submission, AppError> {
        let submission = self
            .submission_repo
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

        tracing::info!(submission_id = %id, status = status.as_str(), "Submission status updated");
        Ok(submission)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        if !self.submission_repo.delete_submission(id).await? {
            return Err(AppError::NotFound("Submission not found".into()));
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<SubmissionStats, AppError> {
        self.submission_repo.submission_stats().await
    }
}
