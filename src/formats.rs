use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle for a classification record.
///
/// Assigned once when the record is created and never changed by edits, so
/// UI state keyed by it (expansion, selection, preview) survives renames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationId(String);

impl ClassificationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassificationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ClassificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSelection {
    /// 1-based index into the rendered page images.
    pub page_number: u32,
    #[serde(default)]
    pub save_as_image: bool,
}

impl PageSelection {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            save_as_image: false,
        }
    }
}

/// One category of a classified document.
///
/// `category` is a display name only: it may collide with other records and
/// may be edited freely. `pages` may contain duplicates or gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(default = "ClassificationId::generate")]
    pub id: ClassificationId,
    pub category: String,
    #[serde(default)]
    pub pages: Vec<PageSelection>,
    #[serde(default)]
    pub content: String,
}

impl Classification {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            id: ClassificationId::generate(),
            category: category.into(),
            pages: Vec::new(),
            content: String::new(),
        }
    }

    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|page| page.page_number)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureRequest {
    pub system_prompt: String,
    pub pdf_binary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCategory {
    #[serde(alias = "name")]
    pub category: String,
    #[serde(default)]
    pub page_numbers: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureAnalysis {
    #[serde(default)]
    pub categories: Vec<StructureCategory>,
    /// Per-page layout metadata; forwarded to extraction untouched.
    #[serde(default)]
    pub pages: Vec<serde_json::Value>,
    #[serde(default)]
    pub content_markdown: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest<'a> {
    pub target_category: &'a StructureCategory,
    pub categories: &'a [StructureCategory],
    pub content_markdown: &'a str,
    pub pages: &'a [serde_json::Value],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionResult {
    pub category: String,
    pub pages: Vec<ExtractedPage>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPage {
    #[serde(rename = "pageNumber", alias = "page_number")]
    pub page_number: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    /// Base64 PDF, forwarded to structure analysis untouched.
    pub pdf_binary: String,
    /// Page count the client rendered. Informational only: it is logged but
    /// never checked against the analysis result.
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub classification_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub classifications: Option<Vec<Classification>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}
