//! Opaque pagination cursors and the slice contract every list result uses.
//!
//! A cursor is standard base64 over a compact JSON object
//! `{"offset": N, "pageSize": P}`. Tokens come back from callers, so decoding
//! treats them as untrusted and validates every field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::{IlGraphError, IlGraphResult};
use crate::query::guards;

/// Page size used when no cursor is supplied.
pub const DEFAULT_PAGE_SIZE: usize = guards::DEFAULT_PAGE_SIZE as usize;

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    offset: i64,
    #[serde(rename = "pageSize")]
    page_size: i64,
}

/// A decoded `(offset, page_size)` pair. `page_size` is always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
        }
    }
}

pub fn encode_cursor(offset: usize, page_size: usize) -> String {
    let payload = CursorPayload {
        offset: offset as i64,
        page_size: page_size as i64,
    };
    // Serializing two integers cannot fail.
    let json = serde_json::to_string(&payload).unwrap_or_default();
    STANDARD.encode(json)
}

/// Decode a cursor; `None` or `""` is the first page of [`DEFAULT_PAGE_SIZE`].
pub fn decode_cursor(token: Option<&str>) -> IlGraphResult<PageRequest> {
    decode_cursor_or(token, DEFAULT_PAGE_SIZE)
}

/// Decode a cursor, using `default_page_size` for the first page.
pub fn decode_cursor_or(token: Option<&str>, default_page_size: usize) -> IlGraphResult<PageRequest> {
    let token = match token {
        None => return Ok(PageRequest::first(default_page_size)),
        Some(t) if t.is_empty() => return Ok(PageRequest::first(default_page_size)),
        Some(t) => t,
    };

    let bytes = STANDARD
        .decode(token)
        .map_err(|e| IlGraphError::InvalidCursor(format!("not base64: {e}")))?;
    let payload: CursorPayload = serde_json::from_slice(&bytes)
        .map_err(|e| IlGraphError::InvalidCursor(format!("bad payload: {e}")))?;

    if payload.offset < 0 {
        return Err(IlGraphError::InvalidCursor(format!(
            "offset must be >= 0, got {}",
            payload.offset
        )));
    }
    if payload.page_size <= 0 {
        return Err(IlGraphError::InvalidCursor(format!(
            "pageSize must be > 0, got {}",
            payload.page_size
        )));
    }

    Ok(PageRequest {
        offset: payload.offset as usize,
        page_size: payload.page_size as usize,
    })
}

/// One page of a list result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub returned_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Slice `all` to `[offset, offset + page_size)`. `next_cursor` is present
/// iff items remain past this page.
pub fn paginate<T>(all: Vec<T>, request: PageRequest) -> Page<T> {
    let total_count = all.len();
    let end = request.offset.saturating_add(request.page_size);
    let items: Vec<T> = all
        .into_iter()
        .skip(request.offset)
        .take(request.page_size)
        .collect();
    let next_cursor = if end < total_count {
        Some(encode_cursor(end, request.page_size))
    } else {
        None
    };
    Page {
        returned_count: items.len(),
        items,
        total_count,
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_token(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn round_trip() {
        for (offset, size) in [(0, 1), (0, 10), (37, 5), (1_000_000, 250)] {
            let token = encode_cursor(offset, size);
            let decoded = decode_cursor(Some(&token)).unwrap();
            assert_eq!(decoded, PageRequest { offset, page_size: size });
        }
    }

    #[test]
    fn missing_or_empty_is_first_page() {
        let expected = PageRequest { offset: 0, page_size: 10 };
        assert_eq!(decode_cursor(None).unwrap(), expected);
        assert_eq!(decode_cursor(Some("")).unwrap(), expected);
        assert_eq!(decode_cursor_or(None, 25).unwrap().page_size, 25);
    }

    #[test]
    fn rejects_bad_tokens() {
        let cases = [
            "not-base64-json".to_string(),
            raw_token("not json"),
            raw_token(r#"{"offset": -1, "pageSize": 10}"#),
            raw_token(r#"{"offset": 0, "pageSize": 0}"#),
            raw_token(r#"{"offset": 0, "pageSize": -3}"#),
            raw_token(r#"{"offset": 0}"#),
            raw_token(r#"{"offset": "5", "pageSize": 10}"#),
            raw_token(r#"{"offset": 1.5, "pageSize": 10}"#),
        ];
        for token in cases {
            let err = decode_cursor(Some(&token)).unwrap_err();
            assert!(
                matches!(err, IlGraphError::InvalidCursor(_)),
                "expected InvalidCursor for {token}"
            );
        }
    }

    #[test]
    fn next_cursor_only_when_items_remain() {
        let page = paginate((0..10).collect::<Vec<_>>(), PageRequest::first(10));
        assert_eq!(page.returned_count, 10);
        assert!(page.next_cursor.is_none());

        let page = paginate((0..11).collect::<Vec<_>>(), PageRequest::first(10));
        let next = decode_cursor(page.next_cursor.as_deref()).unwrap();
        assert_eq!(next, PageRequest { offset: 10, page_size: 10 });
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], PageRequest { offset: 7, page_size: 2 });
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn following_cursors_visits_everything_once() {
        for total in [0usize, 1, 9, 10, 11, 47] {
            for size in [1usize, 3, 10] {
                let all: Vec<usize> = (0..total).collect();
                let mut seen = Vec::new();
                let mut cursor: Option<String> = None;
                let mut pages = 0;
                loop {
                    let request = decode_cursor_or(cursor.as_deref(), size).unwrap();
                    let page = paginate(all.clone(), request);
                    seen.extend(page.items);
                    pages += 1;
                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                    assert!(pages <= total + 1);
                }
                assert_eq!(seen, all, "total={total} size={size}");
            }
        }
    }
}
