use crate::formats::{Classification, ClassificationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisiblePage<'a, I> {
    pub page_number: u32,
    /// `None` when the page number points past the rendered images.
    pub image: Option<&'a I>,
}

/// Page numbers to display for the current selection.
///
/// With no selection every rendered page is shown in order. With a selection
/// the classification's own page list is returned as-is, duplicates
/// included; a selection that matches nothing shows nothing.
pub fn visible_pages(
    page_count: usize,
    classifications: &[Classification],
    selected: Option<&ClassificationId>,
) -> Vec<u32> {
    match selected {
        None => (1..=u32::try_from(page_count).unwrap_or(u32::MAX)).collect(),
        Some(id) => classifications
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.page_numbers().collect())
            .unwrap_or_default(),
    }
}

pub fn visible_images<'a, I>(
    page_images: &'a [I],
    classifications: &[Classification],
    selected: Option<&ClassificationId>,
) -> Vec<VisiblePage<'a, I>> {
    visible_pages(page_images.len(), classifications, selected)
        .into_iter()
        .map(|page_number| VisiblePage {
            page_number,
            image: page_index(page_number).and_then(|idx| page_images.get(idx)),
        })
        .collect()
}

fn page_index(page_number: u32) -> Option<usize> {
    usize::try_from(page_number).ok()?.checked_sub(1)
}
