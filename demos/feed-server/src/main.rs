use auctionfeed::prelude::*;
use tracing_subscriber::EnvFilter;

/// Lets anyone in who sends a non-empty API key.
struct AnyKeyAuth;

impl Authenticator for AnyKeyAuth {
    async fn authenticate(&self, identify: &Identify) -> Result<(), FeedError> {
        if identify.api_key.trim().is_empty() {
            return Err(FeedError::AuthFailed("missing api key".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn listing(
    id: &str,
    name: &str,
    category: Category,
    rarity: Rarity,
    starting_bid: i64,
    bids: Vec<Bid>,
    end: i64,
) -> Auction {
    let highest_bid = bids.iter().map(|b| b.amount).max().unwrap_or(0);
    Auction {
        auction_id: id.into(),
        seller: "d8e1c1b0f3a34b7e9d1c5a2f6e0b4c37".into(),
        seller_profile: "Banana".into(),
        item_bytes: String::new(),
        item: ItemDisplay {
            name: name.into(),
            lore: vec![format!("§7{name}")],
            category,
            rarity,
        },
        timestamps: Timestamps {
            start: 1_700_000_000_000,
            end,
        },
        claimed: false,
        ended: false,
        bin: bids.is_empty(),
        starting_bid,
        highest_bid,
        last_updated: 1_700_000_000_000,
        bids,
    }
}

fn bid(bidder: &str, amount: i64) -> Bid {
    Bid {
        bidder: bidder.into(),
        bidder_profile: "Apple".into(),
        amount,
        timestamp: 1_700_000_100_000,
    }
}

fn sample_auctions() -> Vec<Auction> {
    vec![
        listing(
            "0a1b2c3d",
            "Aspect of the End",
            Category::Weapon,
            Rarity::Rare,
            250_000,
            vec![bid("Technoblade", 300_000), bid("Dream", 410_000)],
            1_700_086_400_000,
        ),
        listing(
            "1b2c3d4e",
            "Hyperion Sword",
            Category::Weapon,
            Rarity::Legendary,
            900_000_000,
            vec![],
            1_700_172_800_000,
        ),
        listing(
            "2c3d4e5f",
            "Superior Dragon Chestplate",
            Category::Armor,
            Rarity::Legendary,
            20_000_000,
            vec![bid("Dream", 21_500_000)],
            1_700_043_200_000,
        ),
        listing(
            "3d4e5f60",
            "Enchanted Diamond",
            Category::Consumables,
            Rarity::Uncommon,
            1_500,
            vec![],
            1_700_010_000_000,
        ),
    ]
}

/// Seed listings: the JSON array at `FEED_SEED` if set, else a small
/// built-in sample.
fn seed() -> Result<Vec<Auction>, Box<dyn std::error::Error>> {
    match std::env::var("FEED_SEED") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&json)?)
        }
        Err(_) => Ok(sample_auctions()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let auctions = seed()?;
    tracing::info!(count = auctions.len(), "seeded auction book");

    let mut builder = FeedServerBuilder::new();
    if let Ok(addr) = std::env::var("FEED_BIND") {
        builder = builder.bind(&addr);
    }
    let server = builder
        .build(AnyKeyAuth, AuctionBook::from(auctions))
        .await?;

    server.run().await?;
    Ok(())
}
