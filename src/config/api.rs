use curation_schema::PageDefaults;
use serde::{Deserialize, Serialize};

/// Paging limits for list and search endpoints.
/// TOML: `[pagination]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    /// Page size used when the request omits `size` (or sends `size=0`).
    #[serde(default = "default_page_size")]
    pub default_size: u32,

    /// Larger requested sizes are clamped to this.
    #[serde(default = "default_max_page_size")]
    pub max_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}

impl PaginationConfig {
    pub fn page_defaults(&self) -> PageDefaults {
        let max_size = self.max_size.max(1);
        PageDefaults {
            default_size: self.default_size.clamp(1, max_size),
            max_size,
        }
    }
}

fn default_page_size() -> u32 {
    PageDefaults::default().default_size
}

fn default_max_page_size() -> u32 {
    PageDefaults::default().max_size
}

/// Cross-origin access for browser curation clients.
/// TOML: `[cors]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Exact origins allowed; `["*"]` allows any origin. Empty disables CORS headers.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// `Access-Control-Max-Age` in seconds.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_stay_within_bounds() {
        let cfg = PaginationConfig {
            default_size: 500,
            max_size: 100,
        };
        let defaults = cfg.page_defaults();
        assert_eq!(defaults.max_size, 100);
        assert_eq!(defaults.default_size, 100);

        let cfg = PaginationConfig {
            default_size: 0,
            max_size: 0,
        };
        assert_eq!(cfg.page_defaults().default_size, 1);
    }
}
