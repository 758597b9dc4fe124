use thiserror::Error as ThisError;

/// Rejections raised while parsing query-string criteria and paging.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CriteriaError {
    #[error("unknown filter operator in `{key}`")]
    UnknownOperator { key: String },

    #[error("`{op}` is not supported on `{field}`")]
    UnsupportedOperator { field: String, op: &'static str },

    #[error("invalid value `{value}` for `{field}`: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("cannot sort by unknown property `{0}`")]
    UnknownSortField(String),

    #[error("invalid paging parameter `{key}={value}`")]
    InvalidPaging { key: &'static str, value: String },
}
