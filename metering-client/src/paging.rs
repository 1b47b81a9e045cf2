use std::{future::Future, num::NonZeroUsize};

/// Drain a paginated remote collection into a single vector.
///
/// `fetch_page(skip, take)` is awaited once per page, strictly sequentially,
/// with `skip` advancing by `take` after each full page. Collection stops at
/// the first page shorter than `take`.
///
/// The short-page heuristic is inherited from the remote API's call contract:
/// a collection holding an exact multiple of the page size costs one extra
/// empty-page request, and a short page that is not actually the last one
/// (a backend filtering quirk) would silently truncate the result. Known
/// limitation, not guarded against here.
///
/// Any page error propagates immediately; nothing collected so far reaches
/// the caller's success path.
pub async fn collect_all<T, E, F, Fut>(
    page_size: NonZeroUsize,
    mut fetch_page: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let take = page_size.get();
    let mut collected = Vec::new();
    let mut skip = 0usize;

    loop {
        let page = fetch_page(skip, take).await?;
        let fetched = page.len();
        collected.extend(page);

        if fetched < take {
            return Ok(collected);
        }
        skip += take;
    }
}
