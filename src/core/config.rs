// This module holds the tunable constants of the estimators. CacheModel describes the
// i-TLB being modelled: the page size used to bucket functions and the number of entries
// that can be resident at once. The defaults (4 KiB pages, 16 entries) are the values that
// empirically correlate well with hardware measurements; they do not influence any layout.
// MetricsConfig bundles the cache model with the huge page size used to express the hot
// code footprint. Both types are plain values with builder-style setters and a validate()
// step that rejects zero sizes and entry counts out of exponent range.

//! Configuration for the cache and TLB models.

use super::error::{MetricsError, MetricsResult};

/// Default i-TLB page size in bytes.
pub const DEFAULT_ITLB_PAGE_SIZE: u64 = 4096;

/// Default number of resident i-TLB entries.
pub const DEFAULT_ITLB_ENTRIES: u32 = 16;

/// Default huge page size (2 MiB).
pub const DEFAULT_HUGE_PAGE_SIZE: u64 = 2 << 20;

/// Parameters of the i-TLB residency model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheModel {
    /// Page size in bytes.
    pub page_size: u64,
    /// Number of pages that are resident at the same time.
    pub tlb_entries: u32,
}

impl Default for CacheModel {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_ITLB_PAGE_SIZE,
            tlb_entries: DEFAULT_ITLB_ENTRIES,
        }
    }
}

impl CacheModel {
    /// Page an address falls on.
    pub fn page_of(&self, addr: u64) -> u64 {
        addr / self.page_size
    }

    /// Probability that a page holding `share` of all samples is not resident.
    pub fn miss_probability(&self, share: f64) -> f64 {
        let entries = i32::try_from(self.tlb_entries).unwrap_or(i32::MAX);
        (1.0 - share).clamp(0.0, 1.0).powi(entries)
    }
}

/// Configuration of a metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    pub cache_model: CacheModel,
    /// Huge page size in bytes, used to express the hot code footprint.
    pub huge_page_size: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache_model: CacheModel::default(),
            huge_page_size: DEFAULT_HUGE_PAGE_SIZE,
        }
    }
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.cache_model.page_size = page_size;
        self
    }

    pub fn with_tlb_entries(mut self, entries: u32) -> Self {
        self.cache_model.tlb_entries = entries;
        self
    }

    pub fn with_huge_page_size(mut self, size: u64) -> Self {
        self.huge_page_size = size;
        self
    }

    /// Reject parameters that would make the models meaningless.
    pub fn validate(&self) -> MetricsResult<()> {
        if self.cache_model.page_size == 0 {
            return Err(MetricsError::InvalidConfig {
                reason: "i-TLB page size must be positive".to_string(),
            });
        }
        if self.cache_model.tlb_entries == 0 {
            return Err(MetricsError::InvalidConfig {
                reason: "i-TLB entry count must be positive".to_string(),
            });
        }
        if i32::try_from(self.cache_model.tlb_entries).is_err() {
            return Err(MetricsError::InvalidConfig {
                reason: format!("i-TLB entry count must not exceed {}", i32::MAX),
            });
        }
        if self.huge_page_size == 0 {
            return Err(MetricsError::InvalidConfig {
                reason: "huge page size must be positive".to_string(),
            });
        }
        Ok(())
    }
}
