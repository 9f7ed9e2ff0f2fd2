//! Shared guardrails for query payload bounds and traversal limits.

// Query payload guards
pub const MAX_QUERY_LENGTH: usize = 512;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 500;

// Traversal guards
pub const DEFAULT_CALL_DEPTH: i64 = 5;
pub const MAX_CALL_DEPTH: i64 = 32;
pub const DEFAULT_PATH_LENGTH: i64 = 10;
pub const MAX_PATH_LENGTH: i64 = 32;

pub fn clamp_int(value: i64, minimum: i64, maximum: i64) -> i64 {
    value.max(minimum).min(maximum)
}

/// Depth 0 is meaningful (root only), so the floor is 0.
pub fn clamp_depth(value: i64, maximum: i64) -> u32 {
    clamp_int(value, 0, maximum) as u32
}

pub fn clamp_path_length(value: i64, maximum: i64) -> usize {
    clamp_int(value, 0, maximum) as usize
}

pub fn clamp_page_size(value: i64, maximum: i64) -> usize {
    clamp_int(value, 1, maximum) as usize
}

/// Trim and cut a caller-supplied name or pattern to [`MAX_QUERY_LENGTH`]
/// bytes, backing off to a char boundary.
pub fn truncate_query(query: &str) -> String {
    let stripped = query.trim();
    if stripped.len() <= MAX_QUERY_LENGTH {
        return stripped.to_string();
    }
    let mut end = MAX_QUERY_LENGTH;
    while !stripped.is_char_boundary(end) {
        end -= 1;
    }
    stripped[..end].to_string()
}
