//! Offset pagination for list endpoints (`?skip=&limit=`).

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// `skip` defaults to 0; `limit` defaults to [`DEFAULT_LIMIT`] and is clamped to
/// `1..=MAX_LIMIT`, so a request can neither ask for nothing nor for everything.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// `(skip, limit)`
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(skip: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination { skip, limit }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Pagination::default().params(), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(page(None, Some(0)).limit(), 1);
        assert_eq!(page(None, Some(-3)).limit(), 1);
        assert_eq!(page(None, Some(101)).limit(), MAX_LIMIT);
        assert_eq!(page(None, Some(42)).limit(), 42);
    }

    #[test]
    fn test_negative_skip_is_zero() {
        assert_eq!(page(Some(-1), None).skip(), 0);
        assert_eq!(page(Some(30), Some(5)).params(), (30, 5));
    }
}
