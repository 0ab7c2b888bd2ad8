//! Context formatting for retrieved documents

use crate::types::PageContent;

/// Separator placed between documents in the prompt context
pub const DOC_SEPARATOR: &str = "\n\n";

/// Concatenate the page content of `docs` in order, separated by a blank line
pub fn format_docs<D: PageContent>(docs: &[D]) -> String {
    docs.iter()
        .map(PageContent::page_content)
        .collect::<Vec<_>>()
        .join(DOC_SEPARATOR)
}
