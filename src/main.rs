use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use commodity_trading::{
    import_csv, load_network, save_network, setup_database, BusinessNetwork, Commodity,
    NetworkConfig, Trade, Trader,
};

const USAGE: &str = "usage: commodity-trading [demo | import <traders.csv> <commodities.csv> | trade <symbol> <new-owner> | list | history]";

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config = load_config()?;

    match args.get(1).map(String::as_str) {
        None | Some("demo") => run_demo(config),
        Some("import") if args.len() == 4 => run_import(config, &args[2], &args[3]),
        Some("trade") if args.len() == 4 => run_trade(config, &args[2], &args[3]),
        Some("list") => run_list(config),
        Some("history") => run_history(config),
        _ => bail!(USAGE),
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// BNA_CONFIG names a JSON file; BNA_* variables override either way
fn load_config() -> Result<NetworkConfig> {
    let config = match env::var("BNA_CONFIG") {
        Ok(path) => NetworkConfig::from_file(Path::new(&path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => NetworkConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn open_database(config: &NetworkConfig) -> Result<Connection> {
    let conn = Connection::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    setup_database(&conn)?;
    Ok(conn)
}

fn open_network(config: NetworkConfig) -> Result<(Connection, BusinessNetwork)> {
    let conn = open_database(&config)?;
    let network = load_network(&conn, config).context("Failed to load network")?;
    Ok((conn, network))
}

fn run_demo(config: NetworkConfig) -> Result<()> {
    println!("🌽 Commodity Trading - in-memory demo");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut network = BusinessNetwork::new(config)?;

    let dan = Trader::new("dan@email.com", "Dan", "Selman");
    let simon = Trader::new("simon@email.com", "Simon", "Stone");
    let ema = Commodity::new(
        "EMA",
        "Corn",
        "Euronext",
        100,
        network.relationship(dan.trader_id.as_str())?,
    );

    network.asset_registry().add(ema)?;
    network.participant_registry().add_all(vec![dan, simon])?;
    println!("\n✓ Registered 2 traders and 1 commodity");
    println!("  EMA owner: {}", network.asset_registry().get("EMA")?.owner.id());

    let trade = Trade::new(
        network.relationship("EMA")?,
        network.relationship("simon@email.com")?,
    );
    let record = network.submit_transaction(&trade)?;
    println!("\n✓ Trade committed: {}", record.transaction_id);
    println!("  EMA owner: {}", network.asset_registry().get("EMA")?.owner.id());

    Ok(())
}

fn run_import(config: NetworkConfig, traders: &str, commodities: &str) -> Result<()> {
    println!("📂 Importing CSV seed data...");

    let (conn, network) = open_network(config)?;
    let (trader_count, commodity_count) =
        import_csv(&network, Path::new(traders), Path::new(commodities))
            .context("Failed to import CSV files")?;
    save_network(&conn, &network)?;

    println!("✓ Imported {} traders", trader_count);
    println!("✓ Imported {} commodities", commodity_count);
    Ok(())
}

fn run_trade(config: NetworkConfig, symbol: &str, new_owner: &str) -> Result<()> {
    let (conn, mut network) = open_network(config)?;

    let trade = Trade::new(network.relationship(symbol)?, network.relationship(new_owner)?);
    let record = network
        .submit_transaction(&trade)
        .with_context(|| format!("Trade of {} to {} failed", symbol, new_owner))?;
    save_network(&conn, &network)?;

    println!("✓ {} now owned by {}", symbol, new_owner);
    println!("  transaction {}", record.transaction_id);
    Ok(())
}

fn run_list(config: NetworkConfig) -> Result<()> {
    let (_conn, network) = open_network(config)?;

    println!("🧑‍💼 Traders");
    for trader in network.participant_registry().get_all()? {
        println!("  {:<24} {}", trader.trader_id, trader.full_name());
    }

    println!("\n🌽 Commodities");
    for c in network.asset_registry().get_all()? {
        println!(
            "  {:<8} {:<12} {:<12} {:>8}  owner: {}",
            c.trading_symbol,
            c.description,
            c.main_exchange,
            c.quantity,
            c.owner.id()
        );
    }
    Ok(())
}

fn run_history(config: NetworkConfig) -> Result<()> {
    let (_conn, network) = open_network(config)?;
    let history = network.history();

    println!("📜 {} committed transactions", history.len());
    for record in history.records() {
        println!(
            "  {}  {}  {}  by {}",
            record.timestamp.to_rfc3339(),
            record.transaction_type,
            record.transaction_id,
            record.participant
        );
    }
    println!("\n✓ Hash chain verified");
    Ok(())
}
