//! Query strings for list endpoints.

use url::form_urlencoded;

/// Ordered key/value filters for a list call, URL-encoded on use.
///
/// ```
/// use school_api::ListQuery;
///
/// let query = ListQuery::new().search("ada lovelace").page(2);
/// assert_eq!(query.to_query_string(), "search=ada+lovelace&page=2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. Blank values are skipped, matching how the backend
    /// treats missing filters.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.trim().is_empty() {
            self.params.push((key.into(), value));
        }
        self
    }

    pub fn search(self, term: impl ToString) -> Self {
        self.param("search", term)
    }

    pub fn status(self, status: impl ToString) -> Self {
        self.param("status", status)
    }

    pub fn page(self, page: u32) -> Self {
        self.param("page", page)
    }

    pub fn per_page(self, per_page: u32) -> Self {
        self.param("per_page", per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// `path?query`, or just `path` when there are no filters.
    pub fn apply(&self, path: &str) -> String {
        if self.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.to_query_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_leaves_path() {
        assert_eq!(ListQuery::new().apply("/admin/students"), "/admin/students");
    }

    #[test]
    fn test_params_keep_order_and_encode() {
        let query = ListQuery::new()
            .status("pending")
            .param("department", "Math & Science")
            .per_page(50);
        assert_eq!(
            query.apply("/admin/registrations"),
            "/admin/registrations?status=pending&department=Math+%26+Science&per_page=50"
        );
    }

    #[test]
    fn test_blank_values_are_skipped() {
        let query = ListQuery::new().search("  ").param("grade", "");
        assert!(query.is_empty());
    }
}
