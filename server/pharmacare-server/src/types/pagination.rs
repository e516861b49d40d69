//! Pagination types and utilities for consistent pagination across all endpoints

use crate::error::{PaginationInfo, ResponseMetadata};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Standard pagination parameters for list endpoints
#[derive(Debug, Deserialize, IntoParams, ToSchema, Clone)]
pub struct PaginationParams {
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,

    #[param(example = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Get the page number (defaults to 1, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size (defaults to 20, clamped between 1 and 100)
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }

    /// Calculate the offset for SQL queries
    pub fn offset(&self) -> i64 {
        i64::from((self.page() - 1) * self.page_size())
    }

    /// Get the limit for SQL queries
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }

    /// Calculate total pages given a total count
    pub fn total_pages(&self, total_count: i64) -> u32 {
        if total_count <= 0 {
            return 1;
        }
        ((total_count as f64) / f64::from(self.page_size())).ceil() as u32
    }

    /// Create response metadata with pagination info
    pub fn to_metadata(&self, total_count: i64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page() as i32,
                page_size: self.page_size() as i32,
                total_pages: total_pages as i32,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let params = PaginationParams {
            page: None,
            page_size: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 20);
        assert_eq!(params.offset(), 0);

        let oversized = PaginationParams {
            page: Some(0),
            page_size: Some(500),
        };
        assert_eq!(oversized.page(), 1);
        assert_eq!(oversized.page_size(), 100);
    }

    #[test]
    fn test_metadata_flags() {
        let params = PaginationParams {
            page: Some(2),
            page_size: Some(10),
        };
        let metadata = params.to_metadata(35);
        let pagination = metadata.pagination.unwrap();
        assert_eq!(pagination.total_pages, 4);
        assert!(pagination.has_next);
        assert!(pagination.has_previous);
    }
}
