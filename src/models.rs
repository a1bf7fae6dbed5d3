use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub limit: u32,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 5)]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let total_pages = (total + limit as i64 - 1) / limit as i64;
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Normalizes `page`/`limit` query params into (page, limit, offset).
pub fn page_params(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page as i64 - 1) * limit as i64;
    (page, limit, offset)
}

/// Amount maps (earnings, deductions, allowances, benefits) are stored as
/// JSON text columns; responses surface them as objects again.
pub fn parse_json_column(json: Option<&str>) -> serde_json::Value {
    json.and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_clamp_and_offset() {
        assert_eq!(page_params(None, None), (1, 10, 0));
        assert_eq!(page_params(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(page_params(Some(3), Some(20)), (3, 20, 40));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let (page, limit, offset) = page_params(Some(50_000_000), Some(100));
        assert_eq!(page, 50_000_000);
        assert_eq!(limit, 100);
        assert_eq!(offset, 4_999_999_900);
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        assert_eq!(Pagination::new(1, 10, 41).total_pages, 5);
        assert_eq!(Pagination::new(1, 10, 40).total_pages, 4);
    }

    #[test]
    fn json_columns_parse_or_null() {
        assert_eq!(
            parse_json_column(Some(r#"{"bonus":500.0}"#)),
            serde_json::json!({"bonus": 500.0})
        );
        assert_eq!(parse_json_column(None), serde_json::Value::Null);
        assert_eq!(parse_json_column(Some("not json")), serde_json::Value::Null);
    }
}
