use proptest::prelude::*;

use super::pagination::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 20);
}

#[test]
fn test_page_request_offset() {
    assert_eq!(PageRequest::new(1, 20).offset(), 0);
    assert_eq!(PageRequest::new(2, 20).offset(), 20);
    assert_eq!(PageRequest::new(5, 7).offset(), 28);
}

#[test]
fn test_page_request_clamps() {
    let request = PageRequest::new(0, 1000);
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, MAX_PER_PAGE);

    let request = PageRequest {
        page: 3,
        per_page: 0,
    }
    .normalized();
    assert_eq!(request.per_page, 1);
    assert_eq!(request.limit(), 1);
}

#[test]
fn test_page_response_new() {
    let data = vec![1, 2, 3];
    let response = PageResponse::new(data.clone(), 1, 10, 3);

    assert_eq!(response.data, data);
    assert_eq!(response.meta.page, 1);
    assert_eq!(response.meta.per_page, 10);
    assert_eq!(response.meta.total, 3);
    assert_eq!(response.meta.total_pages, 1);
}

#[test]
fn test_page_response_pagination() {
    // 25 items, 10 per page -> 3 pages
    let response: PageResponse<i32> = PageResponse::new(vec![], 1, 10, 25);
    assert_eq!(response.meta.total_pages, 3);
}

#[test]
fn test_page_response_empty() {
    let response: PageResponse<i32> = PageResponse::new(vec![], 1, 10, 0);
    assert_eq!(response.meta.total_pages, 1);
}

#[test]
fn test_page_response_map_keeps_meta() {
    let response = PageResponse::new(vec![1, 2], 2, 2, 4).map(|n| n * 10);
    assert_eq!(response.data, vec![10, 20]);
    assert_eq!(response.meta.total_pages, 2);
}

proptest! {
    /// Consecutive pages never overlap and never leave gaps.
    #[test]
    fn test_offsets_are_contiguous(page in 1u32..10_000, per_page in 1u32..=MAX_PER_PAGE) {
        let current = PageRequest::new(page, per_page);
        let next = PageRequest::new(page + 1, per_page);
        prop_assert_eq!(current.offset() + current.limit(), next.offset());
    }

    /// Every item index lands on exactly one page within `total_pages`.
    #[test]
    fn test_total_pages_cover_all_items(total in 1u64..1_000_000, per_page in 1u32..=MAX_PER_PAGE) {
        let meta = PageMeta::new(1, per_page, total);
        let last_page_offset = (meta.total_pages - 1) * u64::from(per_page);
        prop_assert!(last_page_offset < total);
        prop_assert!(meta.total_pages * u64::from(per_page) >= total);
    }
}
