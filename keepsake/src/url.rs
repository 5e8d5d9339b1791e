//! Building upstream URLs from a base, an endpoint and query parameters.

use std::fmt;

use url::form_urlencoded;

/// Value of a query parameter.
///
/// Empty strings, zero and [`QueryValue::Absent`] are dropped from the query;
/// booleans are rendered as `True` and `False`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A string value.
    Text(String),
    /// An integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
    /// No value.
    Absent,
}

impl QueryValue {
    fn render(&self) -> Option<String> {
        match self {
            QueryValue::Text(text) if text.is_empty() => None,
            QueryValue::Text(text) => Some(text.clone()),
            QueryValue::Int(0) => None,
            QueryValue::Int(value) => Some(value.to_string()),
            QueryValue::Bool(true) => Some("True".to_owned()),
            QueryValue::Bool(false) => Some("False".to_owned()),
            QueryValue::Absent => None,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render().as_deref().unwrap_or_default())
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

macro_rules! int_query_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Int(i64::from(value))
                }
            }
        )*
    };
}

int_query_value!(i8, i16, i32, i64, u8, u16, u32);

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Absent, Into::into)
    }
}

/// Joins `base` and `endpoint` with exactly one `/` and appends the
/// non-empty `params`, url-encoded in the given order.
///
/// ```
/// use keepsake::url::build_url;
///
/// let url = build_url(
///     "https://cms.example.com/wp-json/",
///     "/wp/v2/posts",
///     [("per_page", 10.into()), ("search", "".into()), ("sticky", true.into())],
/// );
/// assert_eq!(url, "https://cms.example.com/wp-json/wp/v2/posts?per_page=10&sticky=True");
/// ```
pub fn build_url<'a>(
    base: &str,
    endpoint: &str,
    params: impl IntoIterator<Item = (&'a str, QueryValue)>,
) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );

    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut has_params = false;
    for (name, value) in params {
        if let Some(value) = value.render() {
            query.append_pair(name, &value);
            has_params = true;
        }
    }
    if has_params {
        url.push('?');
        url.push_str(&query.finish());
    }
    url
}

/// Renders ids as a comma-separated list, e.g. for `include=1,2,3`.
pub fn join_ids<T: fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
