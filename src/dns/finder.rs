//! Name lookup over offset-paginated listings.
//!
//! The listing endpoints filter by substring, not by exact name, so every
//! page has to be scanned with a local predicate. `a.test.xyz.` is returned
//! for a `test.xyz.` filter and must not be taken for it.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::ApiError;

/// Page size requested from every listing endpoint.
pub const PAGE_SIZE: usize = 100;

/// One page of a listing. `next_offset == 0` marks the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_offset: usize,
    pub count: usize,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            items,
            next_offset: 0,
            count,
        }
    }
}

/// Walk `list_page(limit, offset)` from offset 0 and return the first item
/// accepted by `matches`.
///
/// `Ok(None)` means every page was scanned without a match. A listing error
/// ends the walk immediately, and so does a page whose `next_offset` does not
/// move past the offset just requested ([`ApiError::Pagination`]).
pub async fn find_paginated<T, L, Fut, M>(
    mut list_page: L,
    mut matches: M,
) -> Result<Option<T>, ApiError>
where
    L: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
    M: FnMut(&T) -> bool,
{
    let mut offset = 0;
    loop {
        let page = list_page(PAGE_SIZE, offset).await?;
        debug!(
            offset,
            items = page.items.len(),
            next_offset = page.next_offset,
            "scanning page"
        );

        // the last page (next_offset == 0) is still scanned
        if let Some(found) = page.items.into_iter().find(|item| matches(item)) {
            return Ok(Some(found));
        }

        if page.next_offset == 0 {
            return Ok(None);
        }
        if page.next_offset <= offset {
            warn!(
                offset,
                next_offset = page.next_offset,
                "listing offset did not advance, stopping"
            );
            return Err(ApiError::Pagination {
                offset,
                next_offset: page.next_offset,
            });
        }
        offset = page.next_offset;
    }
}

/// Exact name comparison that tolerates a present or absent trailing dot on
/// either side.
pub fn names_match(candidate: &str, wanted: &str) -> bool {
    let candidate = candidate.strip_suffix('.').unwrap_or(candidate);
    let wanted = wanted.strip_suffix('.').unwrap_or(wanted);
    candidate.eq_ignore_ascii_case(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn names_match_with_or_without_trailing_dot() {
        assert!(names_match("test.xyz.", "test.xyz."));
        assert!(names_match("test.xyz", "test.xyz."));
        assert!(names_match("test.xyz.", "test.xyz"));
        assert!(names_match("Test.XYZ.", "test.xyz."));
        assert!(!names_match("a.test.xyz.", "test.xyz."));
        assert!(!names_match("test.xyz.io.", "test.xyz."));
        assert!(!names_match("test.xy.", "test.xyz."));
    }

    #[tokio::test]
    async fn single_last_page_is_scanned() {
        let calls = RefCell::new(Vec::new());
        let found = find_paginated(
            |limit, offset| {
                calls.borrow_mut().push((limit, offset));
                async { Ok(Page::last(vec!["a.test.xyz.", "test.xyz."])) }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await
        .unwrap();

        assert_eq!(found, Some("test.xyz."));
        assert_eq!(*calls.borrow(), vec![(PAGE_SIZE, 0)]);
    }

    #[tokio::test]
    async fn visits_every_page_once_then_reports_none() {
        let offsets = RefCell::new(Vec::new());
        let pages = vec![
            Page { items: vec!["a.test.xyz."], next_offset: 1, count: 3 },
            Page { items: vec!["b.test.xyz."], next_offset: 2, count: 3 },
            Page { items: vec!["c.test.xyz."], next_offset: 0, count: 3 },
        ];
        let found = find_paginated(
            |_, offset| {
                offsets.borrow_mut().push(offset);
                let page = pages[offset].clone();
                async move { Ok(page) }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await
        .unwrap();

        assert_eq!(found, None);
        assert_eq!(*offsets.borrow(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn follows_next_offset_to_the_match() {
        let offsets = RefCell::new(Vec::new());
        let found = find_paginated(
            |_, offset| {
                offsets.borrow_mut().push(offset);
                let page = match offset {
                    0 => Page { items: vec!["a.test.xyz."], next_offset: 3, count: 2 },
                    _ => Page { items: vec!["test.xyz."], next_offset: 0, count: 2 },
                };
                async move { Ok(page) }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await
        .unwrap();

        assert_eq!(found, Some("test.xyz."));
        assert_eq!(*offsets.borrow(), vec![0, 3]);
    }

    #[tokio::test]
    async fn offset_that_does_not_advance_is_an_error() {
        let calls = RefCell::new(0);
        let result: Result<Option<&str>, _> = find_paginated(
            |_, _| {
                *calls.borrow_mut() += 1;
                async { Ok(Page { items: vec!["other."], next_offset: 5, count: 9 }) }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await;

        assert!(matches!(
            result,
            Err(ApiError::Pagination { offset: 5, next_offset: 5 })
        ));
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn offset_that_moves_backwards_is_an_error() {
        let result: Result<Option<&str>, _> = find_paginated(
            |_, offset| {
                let page = match offset {
                    0 => Page { items: vec![], next_offset: 100, count: 300 },
                    _ => Page { items: vec![], next_offset: 50, count: 300 },
                };
                async move { Ok(page) }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await;

        assert!(matches!(
            result,
            Err(ApiError::Pagination { offset: 100, next_offset: 50 })
        ));
    }

    #[tokio::test]
    async fn listing_error_aborts_the_walk() {
        let calls = RefCell::new(0);
        let result: Result<Option<&str>, _> = find_paginated(
            |_, offset| {
                *calls.borrow_mut() += 1;
                async move {
                    if offset == 0 {
                        Ok(Page { items: vec!["a.test.xyz."], next_offset: 1, count: 2 })
                    } else {
                        Err(ApiError::Status { status: 502, body: "bad gateway".into() })
                    }
                }
            },
            |name: &&str| names_match(name, "test.xyz."),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Status { status: 502, .. })));
        assert_eq!(*calls.borrow(), 2);
    }
}
