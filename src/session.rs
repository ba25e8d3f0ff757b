use crate::editor::ClassificationEditor;
use crate::formats::Classification;
use crate::gateway::GatewayError;
use crate::register::{RegistrationClient, RegistrationError, RegistrationReceipt};
use crate::viewer::{self, VisiblePage};

/// Identifies one upload. Tokens increase strictly; only the most recently
/// issued one may write classifications into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UploadToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Applied { classifications: usize },
    Failed { message: String },
    /// A newer upload was started; this result was dropped.
    Stale { token: UploadToken, latest: UploadToken },
}

/// One document editing session: rendered page images, the editor, and the
/// bookkeeping that keeps late gateway responses from clobbering newer ones.
///
/// `I` is whatever the front end renders pages into (data URLs, bitmaps).
#[derive(Debug, Clone)]
pub struct Session<I> {
    editor: ClassificationEditor,
    page_images: Vec<I>,
    latest_upload: u64,
}

impl<I> Default for Session<I> {
    fn default() -> Self {
        Self {
            editor: ClassificationEditor::new(),
            page_images: Vec::new(),
            latest_upload: 0,
        }
    }
}

impl<I> Session<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor(&self) -> &ClassificationEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ClassificationEditor {
        &mut self.editor
    }

    pub fn page_images(&self) -> &[I] {
        &self.page_images
    }

    /// Starts a new upload with freshly rendered pages. Any upload still in
    /// flight becomes stale.
    pub fn begin_upload(&mut self, page_images: Vec<I>) -> UploadToken {
        self.latest_upload += 1;
        self.page_images = page_images;
        tracing::debug!(
            token = self.latest_upload,
            pages = self.page_images.len(),
            "upload started"
        );
        UploadToken(self.latest_upload)
    }

    pub fn latest_upload(&self) -> Option<UploadToken> {
        (self.latest_upload > 0).then_some(UploadToken(self.latest_upload))
    }

    pub fn complete_upload(
        &mut self,
        token: UploadToken,
        result: Result<Vec<Classification>, GatewayError>,
    ) -> UploadOutcome {
        let latest = UploadToken(self.latest_upload);
        if token != latest {
            tracing::info!(token = token.0, latest = latest.0, "discarding stale upload result");
            return UploadOutcome::Stale { token, latest };
        }

        match result {
            Ok(classifications) => {
                let count = classifications.len();
                self.editor.replace_all(classifications);
                UploadOutcome::Applied {
                    classifications: count,
                }
            }
            Err(err) => {
                tracing::warn!(token = token.0, error = %err, "upload failed");
                UploadOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn visible_pages(&self) -> Vec<VisiblePage<'_, I>> {
        viewer::visible_images(
            &self.page_images,
            self.editor.classifications(),
            self.editor.selected(),
        )
    }

    /// Submits the current list. The session is left as it was whatever the
    /// outcome.
    pub async fn register(
        &self,
        client: &RegistrationClient,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        client.submit(self.editor.classifications()).await
    }
}
