use lowbang_core::{CleaningRule, FieldSource, SourceSet};
use serde::Serialize;

use super::CommandOutput;

#[derive(Debug, Serialize)]
pub struct SourceListing {
    pub source: FieldSource,
    pub label: &'static str,
    pub url_template: String,
    pub selector: String,
    pub cleaning: CleaningRule,
}

pub fn run() -> CommandOutput {
    let listings = SourceSet::default()
        .iter()
        .map(|config| SourceListing {
            source: config.source,
            label: config.source.label(),
            url_template: config.url_template().to_owned(),
            selector: config.locator.css_selector(),
            cleaning: config.cleaning,
        })
        .collect();

    CommandOutput::Sources(listings)
}
