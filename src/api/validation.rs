use uuid::Uuid;

use super::ApiError;
use super::types::PageParams;

pub fn validate_page(page: Option<u64>) -> Result<u64, ApiError> {
    match page {
        None => Ok(1),
        Some(0) => Err(ApiError::validation(
            "Invalid page: 0. Page must be a positive integer",
        )),
        Some(page) => Ok(page),
    }
}

pub fn validate_limit(limit: Option<u64>, default: u64, max: u64) -> Result<u64, ApiError> {
    let limit = limit.unwrap_or(default);

    if !(1..=max).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {limit}. Limit must be between 1 and {max}"
        )));
    }
    Ok(limit)
}

/// Resolves `page`/`limit` against defaults, rejecting out-of-range values.
pub fn validate_page_params(
    params: &PageParams,
    default_limit: u64,
    max_limit: u64,
) -> Result<(u64, u64), ApiError> {
    Ok((
        validate_page(params.page)?,
        validate_limit(params.limit, default_limit, max_limit)?,
    ))
}

/// Blank searches are treated as no search.
#[must_use]
pub fn normalize_search(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(ToString::to_string)
}

pub fn parse_id(resource: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(resource, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(None).unwrap(), 1);
        assert_eq!(validate_page(Some(7)).unwrap(), 7);
        assert!(validate_page(Some(0)).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None, 10, 50).unwrap(), 10);
        assert_eq!(validate_limit(Some(1), 10, 50).unwrap(), 1);
        assert_eq!(validate_limit(Some(50), 10, 50).unwrap(), 50);
        assert!(validate_limit(Some(0), 10, 50).is_err());
        assert!(validate_limit(Some(51), 10, 50).is_err());
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(Some("  hello ")), Some("hello".to_string()));
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(None), None);
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("Post", &id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_id("Post", "not-a-uuid"),
            Err(ApiError::NotFound(_))
        ));
    }
}
