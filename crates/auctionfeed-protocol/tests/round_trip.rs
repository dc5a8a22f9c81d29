//! End-to-end encode/decode through the direction registries.
//!
//! These go through the public entry points only: build a value, frame
//! it with the registry for its direction, decode the bytes, compare.

use auctionfeed_protocol::{
    Auction, Auctions, Bid, Category, Decoded, Direction, Filter, Heartbeat,
    Identify, IncomingPacket, ItemDisplay, Metadata, OutgoingPacket,
    PacketKind, ProtocolError, Rarity, RequestAuctions, SessionCreate,
    SortOrder, Timestamps, INCOMING, OUTGOING,
};

// =========================================================================
// Fixtures
// =========================================================================

fn bid(bidder: &str, amount: i64, timestamp: i64) -> Bid {
    Bid {
        bidder: bidder.into(),
        bidder_profile: format!("{bidder}-profile"),
        amount,
        timestamp,
    }
}

fn auction(id: &str, bids: Vec<Bid>) -> Auction {
    Auction {
        auction_id: id.into(),
        seller: "d8e1c1b0f3a34b7e9d1c".into(),
        seller_profile: "Banana".into(),
        item_bytes: "H4sIAAAAAAAAAE1Qy27TQBT".into(),
        item: ItemDisplay {
            name: "Aspect of the End".into(),
            lore: vec![
                "Damage: +100".into(),
                "Strength: +100".into(),
                "§6Ability: Instant Transmission".into(),
            ],
            category: Category::Weapon,
            rarity: Rarity::Rare,
        },
        timestamps: Timestamps {
            start: 1_700_000_000_000,
            end: 1_700_086_400_000,
        },
        claimed: false,
        ended: false,
        bin: false,
        starting_bid: 250_000,
        highest_bid: 1_250_000,
        last_updated: 1_700_000_600_000,
        bids,
    }
}

fn outgoing_round_trip(packet: OutgoingPacket) -> Decoded<OutgoingPacket> {
    let id = match &packet {
        OutgoingPacket::Identify(_) => 1,
        OutgoingPacket::Heartbeat(_) => 2,
        OutgoingPacket::RequestAuctions(_) => 4,
    };
    let frame = OUTGOING.encode(id, &packet).unwrap();
    let decoded = OUTGOING.decode(&frame).unwrap();
    assert_eq!(decoded.id, id);
    assert_eq!(decoded.packet, packet);
    decoded
}

fn incoming_round_trip(packet: IncomingPacket) -> Decoded<IncomingPacket> {
    let frame = INCOMING.encode_packet(&packet).unwrap();
    let decoded = INCOMING.decode(&frame).unwrap();
    assert_eq!(decoded.packet, packet);
    decoded
}

// =========================================================================
// Round trips, one per variant
// =========================================================================

#[test]
fn test_identify_round_trip() {
    let decoded = outgoing_round_trip(OutgoingPacket::Identify(Identify {
        username: "Technoblade".into(),
        uuid: "b876ec32-e396-476b-a115-8438d83c67d4".into(),
        api_key: "0f8a7c1e-key".into(),
    }));
    assert_eq!(decoded.kind, PacketKind::Identify);
}

#[test]
fn test_heartbeat_round_trip() {
    let decoded = outgoing_round_trip(OutgoingPacket::Heartbeat(Heartbeat));
    assert_eq!(decoded.kind, PacketKind::Heartbeat);
}

#[test]
fn test_request_auctions_round_trip_with_filters() {
    outgoing_round_trip(OutgoingPacket::RequestAuctions(RequestAuctions {
        filters: vec![
            Filter::new("category", "armor"),
            Filter::new("rarity", "LEGENDARY"),
        ],
        query: "Superior Dragon".into(),
        order: SortOrder::EndNear,
        start: 100,
        amount: 50,
    }));
}

#[test]
fn test_metadata_round_trip() {
    let decoded = incoming_round_trip(IncomingPacket::Metadata(Metadata {
        heartbeat_interval: 45_000,
    }));
    assert_eq!(decoded.id, 1);
    assert_eq!(decoded.kind, PacketKind::Metadata);
}

#[test]
fn test_session_create_round_trip() {
    let decoded =
        incoming_round_trip(IncomingPacket::SessionCreate(SessionCreate {
            session_id: "5f0c6d0e9a3b4c1d8e7f6a5b4c3d2e1f".into(),
            seq: 12,
        }));
    assert_eq!(decoded.id, 4);
}

#[test]
fn test_auctions_round_trip_empty_page() {
    incoming_round_trip(IncomingPacket::Auctions(Auctions::default()));
}

#[test]
fn test_non_ascii_fields_round_trip() {
    let mut a = auction("é-漢字-😀", vec![bid("Ünïcödé", 1, 2)]);
    a.item.lore = vec!["✪✪✪✪✪".into(), "".into(), "Кирилл".into()];
    incoming_round_trip(IncomingPacket::Auctions(Auctions {
        auctions: vec![a],
    }));
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_request_auctions_sword_low_price() {
    let request = RequestAuctions {
        filters: vec![],
        query: "sword".into(),
        order: SortOrder::LowPrice,
        start: 0,
        amount: 20,
    };
    let frame = OUTGOING
        .encode(4, &OutgoingPacket::RequestAuctions(request.clone()))
        .unwrap();
    let decoded = OUTGOING.decode(&frame).unwrap();

    let OutgoingPacket::RequestAuctions(got) = decoded.packet else {
        panic!("expected RequestAuctions, got {:?}", decoded.kind);
    };
    assert_eq!(got.filters, request.filters);
    assert_eq!(got.query, "sword");
    assert_eq!(got.order, SortOrder::LowPrice);
    assert_eq!(got.start, 0);
    assert_eq!(got.amount, 20);
}

#[test]
fn test_auctions_preserve_bid_order_and_exact_values() {
    let bids = vec![
        bid("first", 9_007_199_254_740_991, 1_700_000_000_001),
        bid("second", -42, i64::MAX),
    ];
    let page = Auctions {
        auctions: vec![auction("0a1b2c", bids.clone())],
    };
    let frame = INCOMING
        .encode(5, &IncomingPacket::Auctions(page.clone()))
        .unwrap();
    let decoded = INCOMING.decode(&frame).unwrap();

    let IncomingPacket::Auctions(got) = decoded.packet else {
        panic!("expected Auctions, got {:?}", decoded.kind);
    };
    assert_eq!(got, page);
    let got_bids = &got.auctions[0].bids;
    assert_eq!(got_bids.len(), 2);
    assert_eq!(got_bids[0].bidder, "first");
    assert_eq!(got_bids[0].amount, 9_007_199_254_740_991);
    assert_eq!(got_bids[0].timestamp, 1_700_000_000_001);
    assert_eq!(got_bids[1].bidder, "second");
    assert_eq!(got_bids[1].amount, -42);
    assert_eq!(got_bids[1].timestamp, i64::MAX);
}

// =========================================================================
// Enumeration fidelity
// =========================================================================

#[test]
fn test_random_order_is_wire_code_four() {
    let request = OutgoingPacket::RequestAuctions(RequestAuctions {
        filters: vec![],
        query: String::new(),
        order: SortOrder::Random,
        start: 0,
        amount: 1,
    });
    let frame = OUTGOING.encode(4, &request).unwrap();
    // id, filter count, empty query, then the order code.
    assert_eq!(&frame[..5], &[0x04, 0x00, 0x00, 0x00, 0x04]);

    let decoded = OUTGOING.decode(&frame).unwrap();
    let OutgoingPacket::RequestAuctions(got) = decoded.packet else {
        panic!("expected RequestAuctions");
    };
    assert_eq!(got.order, SortOrder::Random);
    assert_eq!(got.order.as_str(), "random");

    let mut patched = frame.to_vec();
    patched[4] = 0x05;
    assert_eq!(
        OUTGOING.decode(&patched),
        Err(ProtocolError::UnknownCode {
            table: "sort order",
            code: 5
        })
    );
}

// =========================================================================
// Failures
// =========================================================================

#[test]
fn test_unknown_id_fails_in_each_direction() {
    assert_eq!(
        OUTGOING.decode(&[0x03]),
        Err(ProtocolError::UnknownPacket {
            id: 3,
            direction: Direction::Outgoing
        })
    );
    assert_eq!(
        INCOMING.decode(&[0x02, 0x00]),
        Err(ProtocolError::UnknownPacket {
            id: 2,
            direction: Direction::Incoming
        })
    );
}

#[test]
fn test_truncated_frames_never_decode() {
    let frame = INCOMING
        .encode(
            5,
            &IncomingPacket::Auctions(Auctions {
                auctions: vec![auction("x", vec![bid("b", 1, 1)])],
            }),
        )
        .unwrap();
    for cut in 0..frame.len() {
        assert!(
            INCOMING.decode(&frame[..cut]).is_err(),
            "prefix of {cut} bytes decoded"
        );
    }
}

#[test]
fn test_oversized_varint_id_fails() {
    assert_eq!(
        OUTGOING.decode(&[0xff; 12]),
        Err(ProtocolError::VarIntTooLong)
    );
}
