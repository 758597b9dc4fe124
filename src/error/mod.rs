mod curation;

pub use curation::{
    ALERT_HEADER, ApiErrorBody, ApiErrorObject, CurationError, ERROR_HEADER, IdRule, PARAMS_HEADER,
};
