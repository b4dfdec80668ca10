//! CLI commands for the ledger
//!
//! Implements the command handlers behind the `ledger` binary.

use crate::core::{Block, Chain, LedgerConfig, Transaction};
use crate::crypto::KeyPair;
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Resolve the ledger configuration from an optional file and overrides
pub fn load_config(path: Option<&Path>, reward: Option<f64>) -> CliResult<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(reward) = reward {
        config.reward = reward;
        config.validate()?;
    }
    Ok(config)
}

/// Build the three-block demonstration ledger
///
/// Genesis mints the full reward to the first key. The second block pays a
/// coinbase to the second key and splits the genesis output between the
/// second and third keys. The third block pays another coinbase to the second
/// key and splits its earlier coinbase into five equal outputs for the third.
pub fn build_demo_chain(config: LedgerConfig) -> CliResult<Chain> {
    log::info!("Generating demo keys...");
    let key1 = KeyPair::generate()?;
    let key2 = KeyPair::generate()?;
    let key3 = KeyPair::generate()?;
    let reward = config.reward;

    let genesis = Block::genesis(vec![Transaction::basic_coinbase(
        &key1.public_key,
        0,
        reward,
    )]);
    let mut chain = Chain::new(genesis, config)?;

    let half = reward / 2.0;
    let transactions = Transaction::build_transaction_list(
        &chain,
        &[(0, &key1.private_key)],
        &[(half, &key2.public_key), (half, &key3.public_key)],
        &key2.public_key,
    )?;
    chain.add_transactions(transactions)?;

    let coinbase_id = chain
        .last()
        .coinbase_tx()
        .and_then(|tx| tx.outputs.first())
        .map_or(1, |output| output.id);
    let fifth = reward / 5.0;
    let destinations = vec![(fifth, &key3.public_key); 5];
    let transactions = Transaction::build_transaction_list(
        &chain,
        &[(coinbase_id, &key2.private_key)],
        &destinations,
        &key2.public_key,
    )?;
    chain.add_transactions(transactions)?;

    Ok(chain)
}

/// Run the demo and print the resulting chain
pub fn cmd_demo(config: LedgerConfig, json: bool) -> CliResult<()> {
    let chain = build_demo_chain(config)?;

    if json {
        let dump = serde_json::json!({
            "stats": chain.stats(),
            "blocks": chain.blocks(),
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    print!("{}", chain);

    let stats = chain.stats();
    println!("⛓️  Ledger Info");
    println!("   ├─ Height: {}", stats.height);
    println!("   ├─ Total transactions: {}", stats.total_transactions);
    println!("   ├─ Unspent outputs: {}", stats.unspent_outputs);
    println!("   ├─ Unspent value: {}", stats.unspent_value);
    println!("   └─ Latest hash: {}", stats.latest_hash);

    Ok(())
}

/// Generate a key pair and print its public half
pub fn cmd_keygen() -> CliResult<()> {
    let pair = KeyPair::generate()?;

    println!("🔐 New key pair generated!");
    println!("   🔑 Fingerprint: {}", pair.public_key.fingerprint());
    println!("   📍 Public key: {}", pair.public_key);

    Ok(())
}

/// Parse a transaction in its text form and print it
pub fn cmd_decode(path: &Path) -> CliResult<()> {
    let text = fs::read_to_string(path)?;
    let transaction = Transaction::deserialize(&text)?;

    println!("📥 Transaction decoded from {:?}", path);
    println!("{}", transaction);
    println!("   Total output value: {}", transaction.value());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_overrides() {
        assert_eq!(load_config(None, None).unwrap(), LedgerConfig::default());
        assert_eq!(load_config(None, Some(40.0)).unwrap().reward, 40.0);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reward": 25.0 }}"#).unwrap();
        assert_eq!(load_config(Some(file.path()), None).unwrap().reward, 25.0);
        assert_eq!(
            load_config(Some(file.path()), Some(10.0)).unwrap().reward,
            10.0
        );
    }

    #[test]
    fn test_load_config_rejects_negative_override() {
        let err = load_config(None, Some(-5.0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidReward(_))
        ));
    }

    #[test]
    fn test_demo_chain() {
        let chain = build_demo_chain(LedgerConfig::default()).unwrap();

        assert_eq!(chain.height(), 3);
        assert!(chain.is_valid());
        assert_eq!(chain.last_id(), 9);

        // 0 and 1 were spent; 2..=9 remain
        let utxo = chain.unspent_outputs();
        assert_eq!(utxo.ids(), (2..=9).collect::<Vec<_>>());
        assert_eq!(utxo.total_value(), 300.0);
        for id in 5..=9 {
            assert_eq!(utxo.value_of(id), 20.0);
        }
    }

    #[test]
    fn test_decode_file() {
        let key = crate::crypto::keys::test_key_pair(0);
        let tx = Transaction::basic_coinbase(&key.public_key, 0, 100.0);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", tx.serialize()).unwrap();
        assert!(cmd_decode(file.path()).is_ok());

        let mut garbage = NamedTempFile::new().unwrap();
        write!(garbage, "not a transaction").unwrap();
        assert!(cmd_decode(garbage.path()).is_err());
    }
}
