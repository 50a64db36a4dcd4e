//! Paginator: turn a first list page plus a target count into the full ordered campaign list.

use log::debug;

use crate::engine::client::ListPage;
use crate::utils::config::ApiConsts;
use crate::{RawItem, TargetCount};

/// `count` for the first list request: one configured page when fetching all, else the limit
/// (clamped to what the API serves in one page).
pub fn first_page_count(target: TargetCount, page_size: u32) -> u32 {
    match target {
        TargetCount::All => page_size.max(1),
        TargetCount::Limit(n) => n.clamp(1, ApiConsts::MAX_PAGE_SIZE),
    }
}

/// Offsets of the pages still to fetch after the first one.
///
/// Pages are `ceil(total_items / page_size)` in all, at offsets `page_size * i`. The divisor is
/// the configured page size, never the number of items the first response happened to carry.
pub fn extra_page_offsets(total_items: u64, first_len: usize, page_size: u32) -> Vec<u64> {
    if total_items <= first_len as u64 {
        return Vec::new();
    }
    let page_size = u64::from(page_size.max(1));
    let pages = total_items.div_ceil(page_size);
    (1..pages).map(|i| page_size * i).collect()
}

/// Merge the first page with any further pages `target` calls for.
///
/// `fetch_page(offset)` issues one list request; pages are requested sequentially in increasing
/// offset order. A page without items contributes nothing. The first error `fetch_page` returns
/// stops pagination and is returned as is.
pub fn paginate<F, E>(
    first_page: ListPage,
    target: TargetCount,
    page_size: u32,
    mut fetch_page: F,
) -> Result<Vec<RawItem>, E>
where
    F: FnMut(u64) -> Result<ListPage, E>,
{
    let total_items = first_page.total_items;
    let first_items = first_page.items.unwrap_or_default();

    match target {
        TargetCount::Limit(n) => {
            let mut items = first_items;
            items.truncate(n as usize);
            Ok(items)
        }
        TargetCount::All => {
            let offsets = extra_page_offsets(total_items, first_items.len(), page_size);
            debug!(
                "{} campaigns reported, {} on first page; {} more page(s) of {}",
                total_items,
                first_items.len(),
                offsets.len(),
                page_size
            );
            let mut pages: Vec<Vec<RawItem>> = Vec::with_capacity(offsets.len() + 1);
            pages.push(first_items);
            for offset in offsets {
                match fetch_page(offset)?.items {
                    Some(items) => pages.push(items),
                    None => debug!("page at offset {} carried no campaigns", offset),
                }
            }
            Ok(pages.into_iter().flatten().collect())
        }
    }
}
