use crate::entity::EntityDef;
use crate::error::CriteriaError;
use crate::field::FieldDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDefaults {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Field(&'static FieldDef),
}

impl SortKey {
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Field(f) => f.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub descending: bool,
}

/// Zero-based page request: `page`, `size`, and repeatable `sort=<prop>[,<prop>...][,asc|desc]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortOrder>,
}

impl PageRequest {
    pub fn first(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort: Vec::new(),
        }
    }

    pub fn parse<'a, I>(
        def: &EntityDef,
        pairs: I,
        defaults: PageDefaults,
    ) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::first(defaults.default_size);
        for (key, raw) in pairs {
            match key {
                // Negative pages read as the first page.
                "page" => {
                    let page: i64 = raw.trim().parse().map_err(|_| CriteriaError::InvalidPaging {
                        key: "page",
                        value: raw.to_string(),
                    })?;
                    request.page = u32::try_from(page.max(0)).unwrap_or(u32::MAX);
                }
                "size" => {
                    let size: i64 =
                        raw.trim().parse().map_err(|_| CriteriaError::InvalidPaging {
                            key: "size",
                            value: raw.to_string(),
                        })?;
                    request.size = if size <= 0 {
                        defaults.default_size
                    } else {
                        u32::try_from(size).map_or(defaults.max_size, |n| n.min(defaults.max_size))
                    };
                }
                "sort" => request.sort.extend(parse_sort(def, raw)?),
                _ => {}
            }
        }
        Ok(request)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

fn parse_sort(def: &EntityDef, raw: &str) -> Result<Vec<SortOrder>, CriteriaError> {
    let mut tokens: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let direction = tokens.last().map(|t| t.to_ascii_lowercase());
    let descending = match direction.as_deref() {
        Some("desc") => {
            tokens.pop();
            true
        }
        Some("asc") => {
            tokens.pop();
            false
        }
        _ => false,
    };

    tokens
        .into_iter()
        .map(|prop| {
            let key = if prop == "id" {
                SortKey::Id
            } else {
                SortKey::Field(
                    def.field(prop)
                        .ok_or_else(|| CriteriaError::UnknownSortField(prop.to_string()))?,
                )
            };
            Ok(SortOrder { key, descending })
        })
        .collect()
}

/// Position of a returned page within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl PageMeta {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}
