//! Template loading for views.

use ahash::AHashMap;
use anyhow::anyhow;
use async_trait::async_trait;
use waymark_core::{Params, TemplateSource};

/// Everything a loader may need to produce one view's template.
#[derive(Debug, Clone)]
pub struct ViewLoad {
    /// Qualified view name (`name@state`).
    pub view: String,
    /// State that declares the view.
    pub state: String,
    pub source: TemplateSource,
    /// Parameters restricted to the declaring state.
    pub params: Params,
}

#[async_trait]
pub trait TemplateLoader: Send + Sync {
    async fn load(&self, request: &ViewLoad) -> anyhow::Result<String>;
}

/// Serves inline templates directly and URL templates from a preloaded table.
///
/// A view without a template loads as the empty string.
#[derive(Debug, Clone, Default)]
pub struct MapTemplateLoader {
    templates: AHashMap<String, String>,
}

impl MapTemplateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(url.into(), template.into());
        self
    }
}

#[async_trait]
impl TemplateLoader for MapTemplateLoader {
    async fn load(&self, request: &ViewLoad) -> anyhow::Result<String> {
        match &request.source {
            TemplateSource::None => Ok(String::new()),
            TemplateSource::Inline(template) => Ok(template.clone()),
            TemplateSource::Url(url) => self
                .templates
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("template '{url}' not found")),
        }
    }
}
