//! # Query Filter Building
//!
//! Deterministic translation of flat request parameters into SQL fragments:
//! trash visibility, substring search over an allow-listed column set, sort
//! restricted to an allow-list, and server-side clamped pagination. Every
//! repository list query goes through these helpers so the semantics cannot
//! drift between entities.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

/// Default page size when the caller does not specify one.
pub const DEFAULT_PER_PAGE: i64 = 15;
/// Server-side page size ceiling, applied regardless of the client request.
pub const MAX_PER_PAGE: i64 = 100;

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Which lifecycle states a query sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashFilter {
    /// Rows with `deleted_at IS NULL` (default).
    #[default]
    Active,
    /// Active and trashed rows together.
    WithTrashed,
    /// Trashed rows only.
    OnlyTrashed,
}

/// Recognized list parameters, shared by every entity type.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub page: i64,
    pub per_page: i64,
    pub include_trashed: bool,
    pub only_trashed: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            sort_direction: SortDirection::Desc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            include_trashed: false,
            only_trashed: false,
        }
    }
}

impl ListParams {
    /// Requested page, floored at 1.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size clamped to `[1, MAX_PER_PAGE]`.
    pub fn per_page(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// `only_trashed` wins over `include_trashed` when both are set.
    pub fn trash_filter(&self) -> TrashFilter {
        if self.only_trashed {
            TrashFilter::OnlyTrashed
        } else if self.include_trashed {
            TrashFilter::WithTrashed
        } else {
            TrashFilter::Active
        }
    }

    /// Non-empty, trimmed search term, if one was supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Tracks whether a `WHERE` keyword has been emitted yet.
#[derive(Debug, Default)]
pub struct WherePrefix {
    started: bool,
}

impl WherePrefix {
    pub fn next(&mut self) -> &'static str {
        if self.started {
            " AND "
        } else {
            self.started = true;
            " WHERE "
        }
    }
}

/// Append the trash-visibility predicate for `alias` (table name or alias).
pub fn push_trash_filter(
    qb: &mut QueryBuilder<'_, Sqlite>,
    w: &mut WherePrefix,
    alias: &str,
    trash: TrashFilter,
) {
    match trash {
        TrashFilter::Active => {
            qb.push(w.next()).push(alias).push(".deleted_at IS NULL");
        }
        TrashFilter::OnlyTrashed => {
            qb.push(w.next()).push(alias).push(".deleted_at IS NOT NULL");
        }
        TrashFilter::WithTrashed => {}
    }
}

/// Append a case-insensitive substring match over `columns`.
///
/// `%` / `_` in the term are escaped so user input always matches literally.
pub fn push_search(
    qb: &mut QueryBuilder<'_, Sqlite>,
    w: &mut WherePrefix,
    columns: &[&str],
    term: &str,
) {
    if columns.is_empty() {
        return;
    }

    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    qb.push(w.next()).push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'");
    }
    qb.push(")");
}

/// Append an exact-match predicate when the filter value is present.
pub fn push_eq<'a, T>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    w: &mut WherePrefix,
    column: &str,
    value: Option<T>,
) where
    T: sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite> + Send + 'a,
{
    if let Some(value) = value {
        qb.push(w.next()).push(column).push(" = ").push_bind(value);
    }
}

/// Append `ORDER BY`, restricted to `allowed` column names. Anything else
/// (including an absent `sort_by`) falls back to `id DESC`.
pub fn push_order(
    qb: &mut QueryBuilder<'_, Sqlite>,
    alias: &str,
    sort_by: Option<&str>,
    allowed: &[&str],
    direction: SortDirection,
) {
    let column = sort_by.filter(|candidate| allowed.contains(candidate));

    match column {
        Some(column) => {
            qb.push(" ORDER BY ")
                .push(alias)
                .push(".")
                .push(column)
                .push(" ")
                .push(direction.as_sql());
        }
        None => {
            qb.push(" ORDER BY ").push(alias).push(".id DESC");
        }
    }
}

/// Append `LIMIT`/`OFFSET` from already-clamped parameters.
pub fn push_paging(qb: &mut QueryBuilder<'_, Sqlite>, params: &ListParams) {
    qb.push(" LIMIT ")
        .push_bind(params.per_page())
        .push(" OFFSET ")
        .push_bind(params.offset());
}

/// One page of query results plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self { items, total, page: params.page(), per_page: params.per_page() }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
