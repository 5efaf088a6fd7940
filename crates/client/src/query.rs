//! Query string builder for collection endpoints.

use std::fmt::Display;

/// Builds `?key=value&...` query strings.
///
/// Parameters keep the order they were first set in; setting a key again
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many levels of references the server should populate.
    #[must_use]
    pub fn depth(self, depth: u8) -> Self {
        self.set("depth", depth.to_string())
    }

    #[must_use]
    pub fn locale(self, locale: &str) -> Self {
        self.set("locale", urlencoding::encode(locale).into_owned())
    }

    #[must_use]
    pub fn page(self, page: u64) -> Self {
        self.set("page", page.to_string())
    }

    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.set("limit", limit.to_string())
    }

    /// Add a `where[field][op]=value` condition. The value is percent-encoded.
    #[must_use]
    pub fn where_(self, field: &str, op: &str, value: impl Display) -> Self {
        let value = urlencoding::encode(&value.to_string()).into_owned();
        self.set(format!("where[{field}][{op}]"), value)
    }

    /// Sort by `field`; descending order is written as `-field`.
    #[must_use]
    pub fn sort(self, field: &str, ascending: bool) -> Self {
        let value = if ascending {
            field.to_string()
        } else {
            format!("-{field}")
        };
        self.set("sort", value)
    }

    /// Restrict the returned fields. An empty list leaves the query unchanged.
    #[must_use]
    pub fn select(self, fields: &[&str]) -> Self {
        if fields.is_empty() {
            return self;
        }
        self.set("select", fields.join(","))
    }

    /// Name the references to populate. An empty list leaves the query unchanged.
    #[must_use]
    pub fn populate(self, fields: &[&str]) -> Self {
        if fields.is_empty() {
            return self;
        }
        self.set("populate", fields.join(","))
    }

    /// Match documents satisfying any of `conditions`.
    ///
    /// Each builder's `where` clauses become `where[or][i][field][op]`; its other
    /// parameters are ignored.
    #[must_use]
    pub fn or(mut self, conditions: impl IntoIterator<Item = Self>) -> Self {
        for (i, condition) in conditions.into_iter().enumerate() {
            for (key, value) in condition.params {
                if let Some(rest) = key.strip_prefix("where") {
                    self = self.set(format!("where[or][{i}]{rest}"), value);
                }
            }
        }
        self
    }

    /// Render the query string, `""` when no parameter was set.
    #[must_use]
    pub fn build(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        format!("?{}", pairs.join("&"))
    }

    fn set(mut self, key: impl Into<String>, value: String) -> Self {
        let key = key.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert_eq!(QueryBuilder::new().build(), "");
    }

    #[test]
    fn test_parameters_keep_insertion_order() {
        let query = QueryBuilder::new()
            .where_("status", "equals", "active")
            .depth(2)
            .sort("createdAt", false)
            .page(3)
            .limit(20)
            .build();

        assert_eq!(
            query,
            "?where[status][equals]=active&depth=2&sort=-createdAt&page=3&limit=20"
        );
    }

    #[test]
    fn test_where_value_is_percent_encoded() {
        let query = QueryBuilder::new()
            .where_("endDate", "greater_than", "2026-10-17T12:00:00+02:00")
            .build();

        assert_eq!(
            query,
            "?where[endDate][greater_than]=2026-10-17T12%3A00%3A00%2B02%3A00"
        );
    }

    #[test]
    fn test_setting_a_key_twice_replaces_it_in_place() {
        let query = QueryBuilder::new().depth(0).limit(5).depth(2).build();
        assert_eq!(query, "?depth=2&limit=5");
    }

    #[test]
    fn test_select_and_populate_join_fields() {
        let query = QueryBuilder::new()
            .select(&["title", "status"])
            .populate(&[])
            .populate(&["options"])
            .build();

        assert_eq!(query, "?select=title,status&populate=options");
    }

    #[test]
    fn test_or_numbers_each_alternative() {
        let query = QueryBuilder::new()
            .or([
                QueryBuilder::new().where_("status", "equals", "active"),
                QueryBuilder::new()
                    .where_("createdBy", "equals", "u1")
                    .depth(3),
            ])
            .build();

        assert_eq!(
            query,
            "?where[or][0][status][equals]=active&where[or][1][createdBy][equals]=u1"
        );
    }
}
