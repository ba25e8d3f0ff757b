use std::time::Duration;

use anyhow::Context as _;
use base64::Engine as _;

use crate::analysis::{AnalysisConfig, AnalysisService, HttpAnalysisService, UpstreamError};
use crate::cli::ClassifyArgs;
use crate::formats::{
    Classification, ClassificationId, ExtractionRequest, ExtractionResult, PageSelection,
    StructureAnalysis, StructureRequest,
};

/// A failed classification run. Each variant names the stage that failed;
/// the `Display` text is what end users see.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to analyze document structure")]
    StructureFailed(#[source] UpstreamError),
    #[error("Invalid JSON response from structure analysis API")]
    StructureInvalidJson(#[source] serde_json::Error),
    #[error("Failed to extract data for category: {category}")]
    ExtractionFailed {
        category: String,
        #[source]
        source: UpstreamError,
    },
    #[error("Invalid JSON response from extraction API (category: {category})")]
    ExtractionInvalidJson {
        category: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn structure_request(
    config: &AnalysisConfig,
    pdf_binary: String,
    classification_prompt: Option<String>,
) -> StructureRequest {
    StructureRequest {
        system_prompt: config.system_prompt.clone(),
        pdf_binary,
        classification_prompt: classification_prompt.or_else(|| config.classification_prompt.clone()),
    }
}

/// Turns a PDF into one classification per detected category.
///
/// Structure analysis runs first; extraction then runs once per category,
/// sequentially and in the order the analysis returned them. Any failure
/// discards everything gathered so far.
pub async fn classify_pdf(
    service: &dyn AnalysisService,
    request: &StructureRequest,
) -> Result<Vec<Classification>, GatewayError> {
    let raw = service
        .analyze_structure(request)
        .await
        .map_err(GatewayError::StructureFailed)?;
    let structure: StructureAnalysis =
        serde_json::from_str(&raw).map_err(GatewayError::StructureInvalidJson)?;

    tracing::info!(
        categories = structure.categories.len(),
        pages = structure.pages.len(),
        "structure analysis complete"
    );

    let mut classifications = Vec::with_capacity(structure.categories.len());
    for target in &structure.categories {
        let extraction = ExtractionRequest {
            target_category: target,
            categories: &structure.categories,
            content_markdown: &structure.content_markdown,
            pages: &structure.pages,
        };
        tracing::debug!(category = %target.category, "extract category");

        let raw = service.extract_category(&extraction).await.map_err(|source| {
            GatewayError::ExtractionFailed {
                category: target.category.clone(),
                source,
            }
        })?;
        let result: ExtractionResult =
            serde_json::from_str(&raw).map_err(|source| GatewayError::ExtractionInvalidJson {
                category: target.category.clone(),
                source,
            })?;

        classifications.push(into_classification(result));
    }

    Ok(classifications)
}

fn into_classification(result: ExtractionResult) -> Classification {
    Classification {
        id: ClassificationId::generate(),
        category: result.category,
        // The image flag is a user decision; upstream never pre-sets it.
        pages: result
            .pages
            .into_iter()
            .map(|page| PageSelection::new(page.page_number))
            .collect(),
        content: result.content.unwrap_or_default(),
    }
}

pub async fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let mut config = AnalysisConfig::from_env().context("load analysis config")?;
    if let Some(base_url) = args.analysis_url {
        config.base_url = base_url;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    let service = HttpAnalysisService::new(&config)?;

    let bytes = tokio::fs::read(&args.pdf)
        .await
        .with_context(|| format!("read pdf: {}", args.pdf))?;
    if bytes.is_empty() {
        anyhow::bail!("pdf is empty: {}", args.pdf);
    }
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

    tracing::info!(
        pdf = %args.pdf,
        bytes = bytes.len(),
        base_url = %config.base_url,
        "classify"
    );

    let request = structure_request(&config, encoded, args.classification_prompt);
    let classifications = classify_pdf(&service, &request).await?;

    let json = serde_json::to_string_pretty(&classifications).context("serialize classifications")?;
    match args.out.as_deref() {
        Some(path) => crate::output::write_output(path, &format!("{json}\n"), args.force)?,
        None => println!("{json}"),
    }
    Ok(())
}
