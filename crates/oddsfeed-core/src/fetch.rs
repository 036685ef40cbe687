use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Pagination context handed to a strategy for one page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl PageContext {
    pub const fn first(page_size: u32) -> Self {
        Self { page: 1, page_size }
    }

    /// Zero-based record offset for skip/take style endpoints.
    pub const fn offset(self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

/// Typed transport failure reported by a fetch strategy.
///
/// This is the only failure a strategy may surface; recoverable conditions
/// such as an exhausted page are an empty record sequence instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchError {}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>, FetchError>> + Send + 'a>>;

/// One concrete fetch routine for a bookmaker.
///
/// The contract every bookmaker integration must satisfy: produce a sequence
/// of raw JSON records for a page, or a typed transport failure. Strategies
/// never enforce their own deadline; the fallback controller bounds each
/// attempt externally and abandons the in-flight future on timeout.
pub trait FetchStrategy: Send + Sync {
    /// Strategy name used in attempt reports and logs.
    fn name(&self) -> &str;

    /// Origin key used for request spacing, usually scheme plus host.
    fn origin(&self) -> &str;

    /// Fetch one page of raw records.
    fn fetch<'a>(&'a self, ctx: PageContext) -> FetchFuture<'a>;
}
