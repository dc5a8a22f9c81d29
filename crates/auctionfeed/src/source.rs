//! Where the server gets auction pages from.

use std::future::Future;

use auctionfeed_protocol::{Auction, Filter, RequestAuctions, SortOrder};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

/// Answers a [`RequestAuctions`] with one page of listings.
pub trait AuctionSource: Send + Sync + 'static {
    /// Returns at most `max_page` auctions for `request`.
    fn query(
        &self,
        request: &RequestAuctions,
        max_page: usize,
    ) -> impl Future<Output = Vec<Auction>> + Send;
}

/// An in-memory auction listing, keyed by `auction_id`.
///
/// Filter types understood: `category` and `rarity` (tag text, any case),
/// `seller` (uuid or profile name), `bin` (`true`/`false`). Every filter
/// in a request must match. An unknown filter type matches nothing.
#[derive(Debug, Default)]
pub struct AuctionBook {
    auctions: RwLock<Vec<Auction>>,
}

impl AuctionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an auction. Replacing keeps its position.
    pub async fn insert(&self, auction: Auction) {
        let mut auctions = self.auctions.write().await;
        match auctions
            .iter_mut()
            .find(|a| a.auction_id == auction.auction_id)
        {
            Some(slot) => *slot = auction,
            None => auctions.push(auction),
        }
    }

    pub async fn remove(&self, auction_id: &str) -> Option<Auction> {
        let mut auctions = self.auctions.write().await;
        let index = auctions.iter().position(|a| a.auction_id == auction_id)?;
        Some(auctions.remove(index))
    }

    pub async fn len(&self) -> usize {
        self.auctions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.auctions.read().await.is_empty()
    }
}

impl From<Vec<Auction>> for AuctionBook {
    fn from(auctions: Vec<Auction>) -> Self {
        Self {
            auctions: RwLock::new(auctions),
        }
    }
}

impl AuctionSource for AuctionBook {
    async fn query(&self, request: &RequestAuctions, max_page: usize) -> Vec<Auction> {
        let auctions = self.auctions.read().await;
        select_page(&auctions, request, max_page)
    }
}

fn select_page(
    auctions: &[Auction],
    request: &RequestAuctions,
    max_page: usize,
) -> Vec<Auction> {
    let amount = usize::try_from(request.amount).unwrap_or(0).min(max_page);
    if amount == 0 {
        return Vec::new();
    }
    let start = usize::try_from(request.start).unwrap_or(0);
    let query = request.query.to_lowercase();

    let mut matched: Vec<&Auction> = auctions
        .iter()
        .filter(|a| query.is_empty() || a.item.name.to_lowercase().contains(&query))
        .filter(|a| request.filters.iter().all(|f| filter_matches(f, a)))
        .collect();

    match request.order {
        SortOrder::HighPrice => {
            matched.sort_by_key(|a| std::cmp::Reverse(current_price(a)));
        }
        SortOrder::LowPrice => matched.sort_by_key(|a| current_price(a)),
        SortOrder::EndNear => matched.sort_by_key(|a| a.timestamps.end),
        SortOrder::EndFar => {
            matched.sort_by_key(|a| std::cmp::Reverse(a.timestamps.end));
        }
        SortOrder::Random => matched.shuffle(&mut rand::rng()),
    }

    matched
        .into_iter()
        .skip(start)
        .take(amount)
        .cloned()
        .collect()
}

fn filter_matches(filter: &Filter, auction: &Auction) -> bool {
    let value = filter.value.as_str();
    match filter.kind.as_str() {
        "category" => auction.item.category.as_str().eq_ignore_ascii_case(value),
        "rarity" => auction.item.rarity.as_str().eq_ignore_ascii_case(value),
        "seller" => {
            auction.seller == value || auction.seller_profile.eq_ignore_ascii_case(value)
        }
        "bin" => value.parse::<bool>().is_ok_and(|bin| auction.bin == bin),
        _ => false,
    }
}

/// The highest bid, or the starting bid while nobody has bid.
fn current_price(auction: &Auction) -> i64 {
    if auction.highest_bid > 0 {
        auction.highest_bid
    } else {
        auction.starting_bid
    }
}

#[cfg(test)]
mod tests {
    use auctionfeed_protocol::{Category, ItemDisplay, Rarity, Timestamps};

    use super::*;

    fn listing(id: &str, name: &str, starting: i64, highest: i64, end: i64) -> Auction {
        Auction {
            auction_id: id.into(),
            seller: format!("{id}-seller"),
            seller_profile: format!("{id}-profile"),
            item_bytes: String::new(),
            item: ItemDisplay {
                name: name.into(),
                lore: vec![],
                category: Category::Weapon,
                rarity: Rarity::Common,
            },
            timestamps: Timestamps { start: 0, end },
            claimed: false,
            ended: false,
            bin: false,
            starting_bid: starting,
            highest_bid: highest,
            last_updated: 0,
            bids: vec![],
        }
    }

    fn request(query: &str, order: SortOrder, filters: Vec<Filter>) -> RequestAuctions {
        RequestAuctions {
            filters,
            query: query.into(),
            order,
            start: 0,
            amount: 100,
        }
    }

    fn ids(page: &[Auction]) -> Vec<&str> {
        page.iter().map(|a| a.auction_id.as_str()).collect()
    }

    fn book() -> Vec<Auction> {
        let mut armor = listing("c", "Superior Dragon Chestplate", 500, 0, 10);
        armor.item.category = Category::Armor;
        armor.item.rarity = Rarity::Legendary;
        armor.bin = true;
        vec![
            listing("a", "Aspect of the End", 100, 900, 30),
            listing("b", "Hyperion Sword", 50, 0, 20),
            armor,
        ]
    }

    #[test]
    fn test_query_is_case_insensitive_substring() {
        let page = select_page(&book(), &request("SWORD", SortOrder::EndNear, vec![]), 100);
        assert_eq!(ids(&page), ["b"]);

        let all = select_page(&book(), &request("", SortOrder::EndNear, vec![]), 100);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_price_orders_fall_back_to_starting_bid() {
        let low = select_page(&book(), &request("", SortOrder::LowPrice, vec![]), 100);
        assert_eq!(ids(&low), ["b", "c", "a"]);

        let high = select_page(&book(), &request("", SortOrder::HighPrice, vec![]), 100);
        assert_eq!(ids(&high), ["a", "c", "b"]);
    }

    #[test]
    fn test_end_orders() {
        let near = select_page(&book(), &request("", SortOrder::EndNear, vec![]), 100);
        assert_eq!(ids(&near), ["c", "b", "a"]);

        let far = select_page(&book(), &request("", SortOrder::EndFar, vec![]), 100);
        assert_eq!(ids(&far), ["a", "b", "c"]);
    }

    #[test]
    fn test_random_order_keeps_every_match() {
        let page = select_page(&book(), &request("", SortOrder::Random, vec![]), 100);
        let mut got = ids(&page);
        got.sort_unstable();
        assert_eq!(got, ["a", "b", "c"]);
    }

    #[test]
    fn test_all_filters_must_match() {
        let filters = vec![Filter::new("category", "armor"), Filter::new("bin", "true")];
        let page = select_page(&book(), &request("", SortOrder::EndNear, filters), 100);
        assert_eq!(ids(&page), ["c"]);

        let filters = vec![Filter::new("category", "armor"), Filter::new("rarity", "COMMON")];
        assert!(select_page(&book(), &request("", SortOrder::EndNear, filters), 100).is_empty());
    }

    #[test]
    fn test_seller_and_rarity_filters() {
        let page = select_page(
            &book(),
            &request("", SortOrder::EndNear, vec![Filter::new("seller", "A-PROFILE")]),
            100,
        );
        assert_eq!(ids(&page), ["a"]);

        let page = select_page(
            &book(),
            &request("", SortOrder::EndNear, vec![Filter::new("rarity", "legendary")]),
            100,
        );
        assert_eq!(ids(&page), ["c"]);
    }

    #[test]
    fn test_unknown_filter_matches_nothing() {
        let filters = vec![Filter::new("colour", "red")];
        assert!(select_page(&book(), &request("", SortOrder::EndNear, filters), 100).is_empty());

        let filters = vec![Filter::new("bin", "maybe")];
        assert!(select_page(&book(), &request("", SortOrder::EndNear, filters), 100).is_empty());
    }

    #[test]
    fn test_pagination_clamps() {
        let mut req = request("", SortOrder::EndNear, vec![]);
        req.start = 1;
        req.amount = 1;
        assert_eq!(ids(&select_page(&book(), &req, 100)), ["b"]);

        req.start = -5;
        req.amount = 100;
        assert_eq!(select_page(&book(), &req, 2).len(), 2);

        req.amount = -1;
        assert!(select_page(&book(), &req, 100).is_empty());

        req.start = 10;
        req.amount = 10;
        assert!(select_page(&book(), &req, 100).is_empty());
    }

    #[tokio::test]
    async fn test_book_insert_replaces_by_id() {
        let book = AuctionBook::from(book());
        book.insert(listing("a", "Aspect of the Void", 100, 1_000, 30))
            .await;
        assert_eq!(book.len().await, 3);

        let page = book
            .query(&request("void", SortOrder::EndNear, vec![]), 10)
            .await;
        assert_eq!(ids(&page), ["a"]);

        assert!(book.remove("a").await.is_some());
        assert!(book.remove("a").await.is_none());
        assert_eq!(book.len().await, 2);
        assert!(!book.is_empty().await);
    }
}
