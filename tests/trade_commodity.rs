// Commodity trading - end-to-end through a fresh business network
//
// Run with: cargo test --test trade_commodity

use commodity_trading::{
    load_network, save_network, setup_database, BusinessNetwork, Commodity, LedgerError,
    NetworkConfig, Relationship, Resource, Trade, Trader,
};
use rusqlite::Connection;

const NAMESPACE: &str = "org.acme.bnatemplate";

fn new_network() -> BusinessNetwork {
    BusinessNetwork::new(NetworkConfig::default()).expect("network should start")
}

fn dan() -> Trader {
    Trader::new("dan@email.com", "Dan", "Selman")
}

fn simon() -> Trader {
    Trader::new("simon@email.com", "Simon", "Stone")
}

#[test]
fn test_should_be_able_to_trade_a_commodity() {
    let mut network = new_network();

    let dan = dan();
    let simon = simon();

    let commodity = Commodity::new(
        "EMA",
        "Corn",
        "Euronext",
        100,
        Relationship::to(NAMESPACE, &dan).unwrap(),
    );

    let trade = Trade::new(
        Relationship::to(NAMESPACE, &commodity).unwrap(),
        Relationship::to(NAMESPACE, &simon).unwrap(),
    );

    // The owner of the commodity should be dan
    assert_eq!(commodity.owner.id(), dan.identifier());

    // Commodity first, participants second: references are only checked on submit
    network.asset_registry().add(commodity.clone()).unwrap();
    network
        .participant_registry()
        .add_all(vec![dan, simon.clone()])
        .unwrap();

    network.submit_transaction(&trade).unwrap();

    let updated = network.asset_registry().get(commodity.identifier()).unwrap();
    assert_eq!(updated.owner.id(), simon.identifier());
    assert_eq!(updated.quantity, 100);
    assert_eq!(updated.description, "Corn");
}

#[test]
fn test_trading_unknown_commodity_fails_without_side_effects() {
    let mut network = new_network();
    network
        .participant_registry()
        .add_all(vec![dan(), simon()])
        .unwrap();
    network
        .asset_registry()
        .add(Commodity::new(
            "EMA",
            "Corn",
            "Euronext",
            100,
            network.relationship("dan@email.com").unwrap(),
        ))
        .unwrap();

    let trade = Trade::new(
        network.relationship("GOLD").unwrap(),
        network.relationship("simon@email.com").unwrap(),
    );
    let err = network.submit_transaction(&trade).unwrap_err();

    match err {
        LedgerError::NotFound { type_name, id } => {
            assert_eq!(type_name, "org.acme.bnatemplate.Commodity");
            assert_eq!(id, "GOLD");
        }
        other => panic!("expected NotFound, got {other}"),
    }

    let assets = network.asset_registry().get_all().unwrap();
    assert_eq!(assets.len(), 1);
    assert!(assets[0].is_owned_by("dan@email.com"));
    assert!(network.history().is_empty());
}

#[test]
fn test_duplicate_registration_fails() {
    let network = new_network();
    network.participant_registry().add(dan()).unwrap();

    let err = network.participant_registry().add(dan()).unwrap_err();
    assert!(err.is_duplicate());
}

#[test]
fn test_replaying_a_trade_keeps_the_same_owner() {
    let mut network = new_network();
    network
        .participant_registry()
        .add_all(vec![dan(), simon()])
        .unwrap();
    network
        .asset_registry()
        .add(Commodity::new(
            "EMA",
            "Corn",
            "Euronext",
            100,
            network.relationship("dan@email.com").unwrap(),
        ))
        .unwrap();

    let trade = Trade::new(
        network.relationship("EMA").unwrap(),
        network.relationship("simon@email.com").unwrap(),
    );
    network.submit_transaction(&trade).unwrap();
    network.submit_transaction(&trade).unwrap();

    let ema = network.asset_registry().get("EMA").unwrap();
    assert!(ema.is_owned_by("simon@email.com"));
    assert_eq!(network.history().len(), 2);
}

#[test]
fn test_ownership_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = NetworkConfig {
        database_path: dir.path().join("network.db"),
        ..NetworkConfig::default()
    };

    {
        let conn = Connection::open(&config.database_path).unwrap();
        setup_database(&conn).unwrap();

        let mut network = BusinessNetwork::new(config.clone()).unwrap();
        network
            .participant_registry()
            .add_all(vec![dan(), simon()])
            .unwrap();
        network
            .asset_registry()
            .add(Commodity::new(
                "EMA",
                "Corn",
                "Euronext",
                100,
                network.relationship("dan@email.com").unwrap(),
            ))
            .unwrap();

        let trade = Trade::new(
            network.relationship("EMA").unwrap(),
            network.relationship("simon@email.com").unwrap(),
        );
        network.submit_transaction(&trade).unwrap();
        save_network(&conn, &network).unwrap();
    }

    let conn = Connection::open(&config.database_path).unwrap();
    let network = load_network(&conn, config).unwrap();

    assert!(network
        .asset_registry()
        .get("EMA")
        .unwrap()
        .is_owned_by("simon@email.com"));
    assert_eq!(network.history().len(), 1);
    assert!(network.history().verify_chain());
}
