use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Price,
    Title,
    Rating,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::Title => "title",
            SortField::Rating => "rating",
        }
    }
}

impl FromStr for SortField {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortField::Price),
            "title" => Ok(SortField::Title),
            "rating" => Ok(SortField::Rating),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// A query-parameter value outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownValue {}

/// Identity of a scroll session and partition key of the page cache.
///
/// Fields are private so every key goes through normalization: an empty or
/// `"all"` category and a blank search term are both stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterKey {
    category: Option<String>,
    sort_field: SortField,
    sort_order: SortOrder,
    search: Option<String>,
}

impl FilterKey {
    pub fn new(
        category: Option<&str>,
        sort_field: SortField,
        sort_order: SortOrder,
        search: Option<&str>,
    ) -> Self {
        Self {
            category: normalize_category(category),
            sort_field,
            sort_order,
            search: normalize_search(search),
        }
    }

    /// All products, default ordering.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = normalize_category(Some(category));
        self
    }

    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = field;
        self.sort_order = order;
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = normalize_search(Some(term));
        self
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Render back into the query-parameter contract.
    pub fn to_params(&self) -> FilterParams {
        FilterParams {
            category: self.category.clone(),
            sort_by: Some(self.sort_field.as_str().to_string()),
            order: Some(self.sort_order.as_str().to_string()),
            search: self.search.clone(),
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}:{}|{}",
            self.category.as_deref().unwrap_or(ALL_CATEGORIES),
            self.sort_field.as_str(),
            self.sort_order.as_str(),
            self.search.as_deref().unwrap_or("")
        )
    }
}

/// Raw filter state as it appears in a URL query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl From<&FilterParams> for FilterKey {
    /// Unrecognized `sortBy`/`order` values fall back to the defaults.
    fn from(params: &FilterParams) -> Self {
        let sort_field = parse_or_default(params.sort_by.as_deref());
        let sort_order = parse_or_default(params.order.as_deref());
        FilterKey::new(
            params.category.as_deref(),
            sort_field,
            sort_order,
            params.search.as_deref(),
        )
    }
}

impl From<FilterParams> for FilterKey {
    fn from(params: FilterParams) -> Self {
        FilterKey::from(&params)
    }
}

fn parse_or_default<T: FromStr + Default>(raw: Option<&str>) -> T {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::debug!(value, "ignoring unrecognized sort parameter");
            T::default()
        }),
        None => T::default(),
    }
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
        .map(str::to_string)
}

fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
