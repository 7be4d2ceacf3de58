use crate::error::ApiError;

const MAX_OFFSET: usize = 10_000;

/// Limits are checked by the query types; the offset cap lives at the edge.
pub fn validate_offset(offset: usize) -> Result<usize, ApiError> {
    if offset > MAX_OFFSET {
        return Err(ApiError::BadRequest(format!(
            "offset must be between 0 and {MAX_OFFSET}"
        )));
    }

    Ok(offset)
}
