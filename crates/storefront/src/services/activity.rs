//! Paginated activity feed.
//!
//! Cursor-style accumulation over the API's page-numbered paginator: pages
//! are appended in fetch order, `has_more` derives from the presence of a
//! `next` link on the last fetched page, and a fetch-next while a fetch is
//! already in flight is a no-op.
//!
//! No de-duplication is applied: re-fetching a page that was already applied
//! appends its items again. This is an accepted limitation of the feed, not
//! something callers should rely on being fixed up.

use crate::showroom::{ActivityItem, ActivityPage, ShowroomError};

/// First page number of the API's paginator.
const FIRST_PAGE: u32 = 1;

/// Ticket for an in-flight page fetch.
///
/// Obtained from [`ActivityFeed::next_request`]; hand the page number to the
/// client and settle with [`ActivityFeed::apply`] or [`ActivityFeed::fail`].
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    page: u32,
}

impl PageRequest {
    /// The page number to fetch.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }
}

/// Accumulator for one user's activity log.
///
/// Owned by the view that fetched it and discarded on navigation away;
/// nothing here outlives the rendering request.
#[derive(Debug, Clone)]
pub struct ActivityFeed {
    items: Vec<ActivityItem>,
    next_page: Option<u32>,
    in_flight: bool,
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityFeed {
    /// An empty feed positioned at the first page.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            next_page: Some(FIRST_PAGE),
            in_flight: false,
        }
    }

    /// Accumulated items, insertion order = fetch order.
    #[must_use]
    pub fn items(&self) -> &[ActivityItem] {
        &self.items
    }

    /// Whether the last fetched page announced another one.
    ///
    /// A fresh feed reports `true`: the first page has not been looked at
    /// yet.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// The page number a subsequent fetch would ask for, without beginning
    /// one.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    /// Begin the next page fetch.
    ///
    /// Returns `None` - a no-op - while a fetch is already in flight or when
    /// the paginator is exhausted.
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if self.in_flight {
            return None;
        }
        let page = self.next_page?;
        self.in_flight = true;
        Some(PageRequest { page })
    }

    /// Append a fetched page and advance the cursor.
    pub fn apply(&mut self, page: ActivityPage) {
        self.in_flight = false;
        self.next_page = page.next_page_number();
        self.items.extend(page.results);
    }

    /// Abandon the in-flight fetch without advancing.
    pub fn fail(&mut self) {
        self.in_flight = false;
    }
}

/// Fetch the next page into the feed, if one is due.
///
/// Returns `Ok(true)` when a page was fetched and applied, `Ok(false)` when
/// the call was a no-op (fetch already in flight, or no more pages).
///
/// # Errors
///
/// Propagates the fetch error after releasing the in-flight mark.
pub async fn fetch_next<F, Fut>(feed: &mut ActivityFeed, fetch: F) -> Result<bool, ShowroomError>
where
    F: FnOnce(u32) -> Fut,
    Fut: Future<Output = Result<ActivityPage, ShowroomError>>,
{
    let Some(request) = feed.next_request() else {
        return Ok(false);
    };

    match fetch(request.page()).await {
        Ok(page) => {
            feed.apply(page);
            Ok(true)
        }
        Err(err) => {
            feed.fail();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use autohaus_core::{ActivityAction, ProductId, UserId};
    use chrono::{TimeZone, Utc};

    fn item(id: i64) -> ActivityItem {
        ActivityItem {
            id,
            profile: UserId::new(1),
            product: ProductId::new(42),
            action: ActivityAction::View,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).single().expect("valid date"),
            details: None,
        }
    }

    fn page(ids: &[i64], next: Option<&str>) -> ActivityPage {
        ActivityPage {
            count: 30,
            next: next.map(str::to_string),
            previous: None,
            results: ids.iter().copied().map(item).collect(),
        }
    }

    #[test]
    fn test_accumulates_pages_in_fetch_order() {
        let mut feed = ActivityFeed::new();

        let request = feed.next_request().expect("first page due");
        assert_eq!(request.page(), 1);
        feed.apply(page(&[1, 2], Some("http://api.test/profiles/activity/?page=2")));

        let request = feed.next_request().expect("second page due");
        assert_eq!(request.page(), 2);
        feed.apply(page(&[3], None));

        let ids: Vec<i64> = feed.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!feed.has_more());
    }

    #[test]
    fn test_has_more_derives_from_last_page_next() {
        let mut feed = ActivityFeed::new();
        assert!(feed.has_more(), "fresh feed has not seen the first page");

        let request = feed.next_request().expect("first page due");
        assert_eq!(request.page(), 1);
        feed.apply(page(&[1], Some("http://api.test/profiles/activity/?page=2")));
        assert!(feed.has_more());

        feed.next_request().expect("second page due");
        feed.apply(page(&[2], None));
        assert!(!feed.has_more());
        assert!(feed.next_request().is_none(), "exhausted paginator");
    }

    #[test]
    fn test_fetch_next_is_noop_while_in_flight() {
        let mut feed = ActivityFeed::new();

        let first = feed.next_request();
        assert!(first.is_some());

        // A second fetch-next before the first settles is a no-op
        assert!(feed.next_request().is_none());

        feed.apply(page(&[1], None));
        assert!(feed.next_request().is_none(), "no more pages after last");
    }

    #[test]
    fn test_failed_fetch_releases_in_flight_without_advancing() {
        let mut feed = ActivityFeed::new();

        let request = feed.next_request().expect("first page due");
        assert_eq!(request.page(), 1);
        feed.fail();

        // Same page is due again
        let request = feed.next_request().expect("retry is allowed");
        assert_eq!(request.page(), 1);
    }

    #[test]
    fn test_refetching_same_page_duplicates_items() {
        // Documented limitation: accumulation applies no de-duplication
        let mut feed = ActivityFeed::new();

        feed.next_request().expect("first page due");
        feed.apply(page(&[1, 2], Some("http://api.test/profiles/activity/?page=1")));

        feed.next_request().expect("paginator pointed back at page 1");
        feed.apply(page(&[1, 2], None));

        assert_eq!(feed.items().len(), 4);
    }

    #[tokio::test]
    async fn test_async_driver_applies_and_reports() {
        let mut feed = ActivityFeed::new();

        let fetched = fetch_next(&mut feed, |page_number| async move {
            assert_eq!(page_number, 1);
            Ok(page(&[1], None))
        })
        .await
        .expect("fetch succeeds");
        assert!(fetched);
        assert_eq!(feed.items().len(), 1);

        // Exhausted: driver reports a no-op
        let fetched = fetch_next(&mut feed, |_| async { panic!("must not fetch") })
            .await
            .expect("no-op is not an error");
        assert!(!fetched);
    }

    #[tokio::test]
    async fn test_async_driver_propagates_errors() {
        let mut feed = ActivityFeed::new();

        let result = fetch_next(&mut feed, |_| async {
            Err(ShowroomError::Api {
                status: 500,
                detail: None,
            })
        })
        .await;

        assert!(result.is_err());
        assert!(feed.items().is_empty());
        assert!(feed.next_request().is_some(), "in-flight mark released");
    }
}
