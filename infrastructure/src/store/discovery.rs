//! Discovery query construction
//!
//! Builds the page and count statements for a [`ToolFilter`]. Both share
//! one `FROM ... WHERE` clause so `total` always agrees with the page.

use super::rows::TOOL_COLUMNS;
use agent_tools_domain::{Page, ToolFilter, search_terms};
use rusqlite::types::Value;

/// Turn free text into an FTS5 match expression
///
/// Each search term becomes a quoted prefix term. Terms are ANDed. Returns
/// `None` when no term survives, which callers treat as browse.
pub(crate) fn match_expression(raw: &str) -> Option<String> {
    let terms: Vec<String> = search_terms(raw)
        .into_iter()
        .map(|term| format!("\"{}\"*", term))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

/// Shared clause and bound parameters for one filter
#[derive(Debug)]
pub(crate) struct ToolQuery {
    clause: String,
    params: Vec<Value>,
}

impl ToolQuery {
    pub(crate) fn new(filter: &ToolFilter) -> Self {
        let mut params = Vec::new();
        let mut clause = match filter.text.as_deref().and_then(match_expression) {
            Some(expr) => {
                params.push(Value::Text(expr));
                "FROM tools_fts JOIN tools t ON t.rowid = tools_fts.rowid \
                 WHERE tools_fts MATCH ? AND t.is_active = 1"
                    .to_string()
            }
            None => "FROM tools t WHERE t.is_active = 1".to_string(),
        };

        if let Some(tag) = &filter.tag {
            clause.push_str(" AND instr(',' || t.tags || ',', ',' || ? || ',') > 0");
            params.push(Value::Text(tag.clone()));
        }
        if let Some(provider_id) = &filter.provider_id {
            clause.push_str(" AND t.provider_id = ?");
            params.push(Value::Text(provider_id.clone()));
        }
        if let Some(max_price) = filter.max_price_claw {
            clause.push_str(
                " AND (json_extract(t.pricing, '$.model') = 'free' \
                 OR COALESCE(CAST(json_extract(t.pricing, '$.amount_claw') AS REAL), 0) <= ?)",
            );
            params.push(Value::Real(max_price));
        }

        Self { clause, params }
    }

    /// Page statement; bind with [`ToolQuery::page_params`]
    pub(crate) fn select_sql(&self) -> String {
        format!(
            "SELECT {} {} ORDER BY t.created_at DESC, t.rowid DESC LIMIT ? OFFSET ?",
            TOOL_COLUMNS, self.clause
        )
    }

    pub(crate) fn page_params(&self, page: Page) -> Vec<Value> {
        let mut params = self.params.clone();
        params.push(Value::Integer(i64::from(page.limit)));
        params.push(Value::Integer(
            i64::try_from(page.offset()).unwrap_or(i64::MAX),
        ));
        params
    }

    pub(crate) fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) {}", self.clause)
    }

    pub(crate) fn count_params(&self) -> &[Value] {
        &self.params
    }
}
