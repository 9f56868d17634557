//! Response envelope.
//!
//! Every endpoint answers `{success, message, data}`; list endpoints add a
//! `pagination` block with page URLs and numbered links so existing admin
//! frontends can consume the responses unchanged.

use serde::Serialize;

use crate::storage::Page;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data), pagination: None }
    }

    /// Success with possibly-absent data (`data: null`), used by singleton
    /// settings reads before the first save.
    pub fn maybe(message: impl Into<String>, data: Option<T>) -> Self {
        Self { success: true, message: message.into(), data, pagination: None }
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: None, pagination: None }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn paginated(
        message: impl Into<String>,
        base_path: &str,
        query: Option<&str>,
        page: Page<T>,
    ) -> Self {
        let pagination = Pagination::new(base_path, query, &page);
        Self {
            success: true,
            message: message.into(),
            data: Some(page.items),
            pagination: Some(pagination),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub has_more_pages: bool,
    pub first_page_url: String,
    pub last_page_url: String,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
    pub links: Vec<PageLink>,
}

#[derive(Debug, Serialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// The caller's query string minus any `page`/`per_page` pairs, so filter and
/// sort parameters survive into the navigation URLs.
fn carried_query(query: Option<&str>) -> String {
    query
        .unwrap_or("")
        .split('&')
        .filter(|pair| {
            !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("per_page=")
        })
        .collect::<Vec<_>>()
        .join("&")
}

impl Pagination {
    pub fn new<T>(base_path: &str, query: Option<&str>, page: &Page<T>) -> Self {
        let per_page = page.per_page;
        let current = page.page;
        let total = page.total;
        let last_page = if total == 0 { 1 } else { (total + per_page - 1) / per_page };
        let count = page.items.len() as i64;

        let carried = carried_query(query);
        let url = move |p: i64| {
            if carried.is_empty() {
                format!("{}?page={}&per_page={}", base_path, p, per_page)
            } else {
                format!("{}?{}&page={}&per_page={}", base_path, carried, p, per_page)
            }
        };

        let from = (count > 0).then(|| (current - 1) * per_page + 1);
        let to = (count > 0).then(|| (current - 1) * per_page + count);

        let mut links = Vec::with_capacity(usize::try_from(last_page).unwrap_or(0) + 2);
        links.push(PageLink {
            url: (current > 1).then(|| url(current - 1)),
            label: "&laquo; Previous".to_string(),
            active: false,
        });
        for p in 1..=last_page {
            links.push(PageLink { url: Some(url(p)), label: p.to_string(), active: p == current });
        }
        links.push(PageLink {
            url: (current < last_page).then(|| url(current + 1)),
            label: "Next &raquo;".to_string(),
            active: false,
        });

        Self {
            current_page: current,
            per_page,
            total,
            last_page,
            from,
            to,
            has_more_pages: current < last_page,
            first_page_url: url(1),
            last_page_url: url(last_page),
            next_page_url: (current < last_page).then(|| url(current + 1)),
            prev_page_url: (current > 1).then(|| url(current - 1)),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ListParams;

    fn page(total: i64, page_no: i64, items: usize) -> Page<i64> {
        let params = ListParams { page: page_no, per_page: 15, ..Default::default() };
        Page::new((0..items as i64).collect(), total, &params)
    }

    #[test]
    fn test_middle_page_bounds() {
        let p = Pagination::new("/api/v1/admin/countries", None, &page(45, 2, 15));
        assert_eq!(p.last_page, 3);
        assert_eq!(p.from, Some(16));
        assert_eq!(p.to, Some(30));
        assert!(p.has_more_pages);
        assert_eq!(p.prev_page_url.as_deref(), Some("/api/v1/admin/countries?page=1&per_page=15"));
        assert_eq!(p.next_page_url.as_deref(), Some("/api/v1/admin/countries?page=3&per_page=15"));
        // Previous + 3 numbered pages + Next.
        assert_eq!(p.links.len(), 5);
        assert!(p.links[2].active);
    }

    #[test]
    fn test_filter_parameters_survive_in_page_urls() {
        let p = Pagination::new(
            "/api/v1/admin/countries",
            Some("search=den&status=true&page=2&per_page=15"),
            &page(45, 2, 15),
        );
        assert_eq!(
            p.next_page_url.as_deref(),
            Some("/api/v1/admin/countries?search=den&status=true&page=3&per_page=15")
        );
        assert_eq!(
            p.first_page_url,
            "/api/v1/admin/countries?search=den&status=true&page=1&per_page=15"
        );
    }

    #[test]
    fn test_empty_result_set() {
        let p = Pagination::new("/api/v1/admin/countries", None, &page(0, 1, 0));
        assert_eq!(p.last_page, 1);
        assert_eq!(p.from, None);
        assert_eq!(p.to, None);
        assert!(!p.has_more_pages);
        assert!(p.links[0].url.is_none());
        assert!(p.links[2].url.is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::ok("Country created successfully", 7);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 7);
        assert!(json.get("pagination").is_none());

        let body = ApiResponse::<()>::message_only("Trash emptied");
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["data"].is_null());
    }
}
