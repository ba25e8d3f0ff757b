use async_trait::async_trait;

use crate::formats::Classification;

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn register(&self, classifications: &[Classification]) -> anyhow::Result<()>;
}

/// Accepts every submission and records it in the log only.
#[derive(Debug, Clone, Default)]
pub struct LoggingRegistrationStore;

#[async_trait]
impl RegistrationStore for LoggingRegistrationStore {
    async fn register(&self, classifications: &[Classification]) -> anyhow::Result<()> {
        let received_at = chrono::Utc::now();
        let pages = classifications.iter().map(|c| c.pages.len()).sum::<usize>();
        let image_pages = classifications
            .iter()
            .flat_map(|c| &c.pages)
            .filter(|p| p.save_as_image)
            .count();

        tracing::info!(
            received_at = %received_at.to_rfc3339(),
            classifications = classifications.len(),
            pages,
            image_pages,
            "registration received"
        );
        for (position, classification) in classifications.iter().enumerate() {
            tracing::debug!(
                position,
                id = %classification.id,
                category = %classification.category,
                pages = ?classification.page_numbers().collect::<Vec<_>>(),
                content_chars = classification.content.chars().count(),
                "registered classification"
            );
        }
        Ok(())
    }
}
