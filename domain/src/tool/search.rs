//! Discovery value objects: pagination, search query and result

use super::entities::Tool;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A clamped page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    /// Clamp raw transport values: page <= 0 becomes 1, limit outside
    /// `1..=100` becomes 20.
    pub fn clamped(page: i64, limit: i64) -> Self {
        let page = if page <= 0 {
            1
        } else {
            u32::try_from(page).unwrap_or(u32::MAX)
        };
        let limit = if limit <= 0 || limit > i64::from(MAX_PAGE_LIMIT) {
            DEFAULT_PAGE_LIMIT
        } else {
            limit as u32
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Parameters for tool discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free-text query; empty means browse
    #[serde(rename = "q")]
    pub query: String,
    pub tag: Option<String>,
    pub provider: Option<String>,
    pub max_price_claw: Option<f64>,
    pub page: i64,
    pub limit: i64,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_max_price(mut self, max_price_claw: f64) -> Self {
        self.max_price_claw = Some(max_price_claw);
        self
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn window(&self) -> Page {
        Page::clamped(self.page, self.limit)
    }

    /// Store-facing filter; blank values are dropped
    pub fn filter(&self) -> ToolFilter {
        ToolFilter {
            text: Some(search_terms(&self.query).join(" ")).filter(|t| !t.is_empty()),
            tag: non_blank(self.tag.as_deref()),
            provider_id: non_blank(self.provider.as_deref()),
            max_price_claw: self
                .max_price_claw
                .filter(|p| p.is_finite() && *p >= 0.0),
        }
    }
}

/// Filter over active tools, shared by the page query and the count query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolFilter {
    pub text: Option<String>,
    pub tag: Option<String>,
    pub provider_id: Option<String>,
    pub max_price_claw: Option<f64>,
}

impl ToolFilter {
    pub fn is_browse(&self) -> bool {
        self.text.is_none()
    }
}

/// One page of tools plus the number of active tools matching the same filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub tools: Vec<Tool>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SearchResult {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.limit))
        }
    }
}

/// Whitespace-separated terms of free text, keeping only alphanumerics,
/// `_` and `-`. Terms left empty are dropped.
pub fn search_terms(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .map(|term| {
            term.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect::<String>()
        })
        .filter(|term| !term.is_empty())
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
