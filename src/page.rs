use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 1-based page request as supplied by the `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Zero-based offset of the first element on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub(crate) fn validate(&self, max_limit: u32) -> Result<()> {
        if self.page == 0 {
            return Err(Error::Validation("page must start at 1".into()));
        }
        if self.limit == 0 || self.limit > max_limit {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}
