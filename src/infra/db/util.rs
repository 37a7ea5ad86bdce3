use crate::application::repos::RepoError;

/// SQLSTATE classes surfaced to callers as bad input rather than storage faults.
const INVALID_INPUT_STATES: [&str; 3] = [
    "22P02", // invalid_text_representation
    "22001", // string_data_right_truncation
    "23502", // not_null_violation
];
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(QUERY_CANCELED) => RepoError::Timeout,
            Some(code) if INVALID_INPUT_STATES.contains(&code) => RepoError::InvalidInput {
                message: db.message().to_string(),
            },
            _ => RepoError::from_persistence(&db),
        },
        other => RepoError::from_persistence(other),
    }
}
