//! Transaction handling for the ledger
//!
//! Implements the id-addressed UTXO model: every output carries a unique
//! numeric id, and an input claims an output by id together with a signature
//! over that output's canonical serialization.
//!
//! Text format of a serialized transaction:
//!
//! ```text
//! <input.id>_<input.signature>                      one line per input
//! <blank line>
//! <output.id>_<output.value>_<output.destination>   one line per output
//! <blank line>
//! ```

use crate::core::blockchain::{Chain, ChainError};
use crate::crypto::{KeyError, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Field separator used by every serialized record
pub const FIELD_SEPARATOR: char = '_';

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while parsing the transaction text format
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Missing blank line terminating the {0} section")]
    MissingTerminator(&'static str),
    #[error("Unexpected {section} record: {line:?}")]
    MalformedRecord { section: &'static str, line: String },
    #[error("Invalid id: {0:?}")]
    InvalidId(String),
    #[error("Invalid value: {0:?}")]
    InvalidValue(String),
    #[error("Invalid destination: {0}")]
    InvalidDestination(#[from] KeyError),
    #[error("Unexpected data after the outputs section")]
    TrailingData,
}

// =============================================================================
// Input
// =============================================================================

/// A claim to spend the output with the same id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    /// Id of the output being spent
    pub id: i64,
    /// Base64 signature over the referenced output's serialization
    pub signature: String,
}

impl Input {
    pub fn new(id: i64, signature: impl Into<String>) -> Self {
        Self {
            id,
            signature: signature.into(),
        }
    }

    pub fn serialize(&self) -> String {
        format!("{}{}{}", self.id, FIELD_SEPARATOR, self.signature)
    }
}

// =============================================================================
// Output
// =============================================================================

/// A spendable amount owned by `destination`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: i64,
    pub value: f64,
    pub destination: PublicKey,
}

impl Output {
    pub fn new(id: i64, value: f64, destination: PublicKey) -> Self {
        Self {
            id,
            value,
            destination,
        }
    }

    /// Canonical `id_value_destination` form.
    ///
    /// These bytes are what inputs sign and what block hashes cover, so the
    /// format must never change.
    pub fn serialize(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.id,
            format_value(self.value),
            self.destination,
            sep = FIELD_SEPARATOR
        )
    }
}

/// Amounts always carry a fractional part (`100.0`, not `100`).
fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

// =============================================================================
// Transaction
// =============================================================================

/// An ordered set of inputs consumed and outputs created
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self { inputs, outputs }
    }

    /// Coinbase with a single output minting `reward` to `key`
    pub fn basic_coinbase(key: &PublicKey, id: i64, reward: f64) -> Self {
        Self::new(vec![], vec![Output::new(id, reward, key.clone())])
    }

    /// Build the transaction list for the next block on `chain`.
    ///
    /// The first entry is a full-reward coinbase to `coinbase_key`; the second
    /// spends every `(id, key)` in `sources` into `destinations`. Output ids
    /// continue from the chain's last id.
    pub fn build_transaction_list(
        chain: &Chain,
        sources: &[(i64, &PrivateKey)],
        destinations: &[(f64, &PublicKey)],
        coinbase_key: &PublicKey,
    ) -> Result<Vec<Transaction>, ChainError> {
        let first_id = chain.last_id() + 1;
        let coinbase = Self::basic_coinbase(coinbase_key, first_id, chain.config().reward);

        let inputs = sources
            .iter()
            .map(|(id, key)| Ok(Input::new(*id, chain.get_signature(*id, key)?)))
            .collect::<Result<Vec<_>, ChainError>>()?;

        let outputs = destinations
            .iter()
            .zip(first_id + 1..)
            .map(|((value, key), id)| Output::new(id, *value, (*key).clone()))
            .collect();

        Ok(vec![coinbase, Self::new(inputs, outputs)])
    }

    /// A transaction without inputs mints new value.
    ///
    /// Block validation does not consult this: it treats the first transaction
    /// of a block as the coinbase whether or not it has inputs.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Sum of all output values
    pub fn value(&self) -> f64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    pub fn serialize(&self) -> String {
        let mut buffer = String::new();
        for input in &self.inputs {
            buffer.push_str(&input.serialize());
            buffer.push('\n');
        }
        buffer.push('\n');
        for output in &self.outputs {
            buffer.push_str(&output.serialize());
            buffer.push('\n');
        }
        buffer.push('\n');
        buffer
    }

    /// Parse the text format produced by [`Transaction::serialize`].
    pub fn deserialize(text: &str) -> Result<Self, TransactionError> {
        let body = text
            .strip_suffix('\n')
            .ok_or(TransactionError::MissingTerminator("outputs"))?;
        let mut lines = body.split('\n');

        let mut inputs = Vec::new();
        loop {
            match lines.next() {
                None => return Err(TransactionError::MissingTerminator("inputs")),
                Some("") => break,
                Some(line) => inputs.push(parse_input(line)?),
            }
        }

        let mut outputs = Vec::new();
        loop {
            match lines.next() {
                None => return Err(TransactionError::MissingTerminator("outputs")),
                Some("") => break,
                Some(line) => outputs.push(parse_output(line)?),
            }
        }

        if lines.next().is_some() {
            return Err(TransactionError::TrailingData);
        }

        Ok(Self { inputs, outputs })
    }
}

fn parse_input(line: &str) -> Result<Input, TransactionError> {
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let [id, signature] = parts[..] else {
        return Err(TransactionError::MalformedRecord {
            section: "input",
            line: line.to_string(),
        });
    };
    Ok(Input::new(parse_id(id)?, signature))
}

fn parse_output(line: &str) -> Result<Output, TransactionError> {
    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let [id, value, destination] = parts[..] else {
        return Err(TransactionError::MalformedRecord {
            section: "output",
            line: line.to_string(),
        });
    };
    let value = match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => parsed,
        _ => return Err(TransactionError::InvalidValue(value.to_string())),
    };
    Ok(Output::new(
        parse_id(id)?,
        value,
        PublicKey::from_base64(destination)?,
    ))
}

fn parse_id(id: &str) -> Result<i64, TransactionError> {
    id.parse()
        .map_err(|_| TransactionError::InvalidId(id.to_string()))
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  | inputs: {}", self.inputs.len())?;
        for input in &self.inputs {
            let sig: String = input.signature.chars().take(11).collect();
            writeln!(f, "  |   tx: {}, sig: {}...", input.id, sig)?;
        }
        writeln!(f, "  | outputs: {}", self.outputs.len())?;
        for output in &self.outputs {
            writeln!(
                f,
                "  |   tx: {}, value: {}, key: {}...",
                output.id,
                format_value(output.value),
                output.destination.fingerprint()
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_key_pair;

    fn sample_transaction() -> Transaction {
        let key = &test_key_pair(0).public_key;
        Transaction::new(
            vec![Input::new(1, "c2lnbmF0dXJl"), Input::new(2, "b3RoZXI=")],
            vec![
                Output::new(3, 50.0, key.clone()),
                Output::new(4, 0.1, test_key_pair(1).public_key.clone()),
            ],
        )
    }

    #[test]
    fn test_output_serialize_format() {
        let key = &test_key_pair(0).public_key;
        let output = Output::new(7, 100.0, key.clone());

        assert_eq!(output.serialize(), format!("7_100.0_{}", key.to_base64()));
        assert_eq!(
            Output::new(8, 0.1, key.clone()).serialize(),
            format!("8_0.1_{}", key.to_base64())
        );
    }

    #[test]
    fn test_input_serialize_format() {
        assert_eq!(Input::new(12, "abc=").serialize(), "12_abc=");
    }

    #[test]
    fn test_coinbase_transaction() {
        let tx = Transaction::basic_coinbase(&test_key_pair(0).public_key, 0, 100.0);
        assert!(tx.is_coinbase());
        assert_eq!(tx.value(), 100.0);
        assert!(!sample_transaction().is_coinbase());
    }

    #[test]
    fn test_serialize_layout() {
        let tx = sample_transaction();
        let text = tx.serialize();
        let lines: Vec<&str> = text.split('\n').collect();

        assert_eq!(lines[0], "1_c2lnbmF0dXJl");
        assert_eq!(lines[1], "2_b3RoZXI=");
        assert_eq!(lines[2], "");
        assert!(lines[3].starts_with("3_50.0_"));
        assert!(lines[4].starts_with("4_0.1_"));
        assert_eq!(lines[5], "");
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_deserialize_round_trip() {
        let tx = sample_transaction();
        assert_eq!(Transaction::deserialize(&tx.serialize()).unwrap(), tx);

        let coinbase = Transaction::basic_coinbase(&test_key_pair(2).public_key, 9, 12.5);
        assert_eq!(
            Transaction::deserialize(&coinbase.serialize()).unwrap(),
            coinbase
        );

        let empty = Transaction::default();
        assert_eq!(empty.serialize(), "\n\n");
        assert_eq!(Transaction::deserialize("\n\n").unwrap(), empty);
    }

    #[test]
    fn test_deserialize_rejects_bad_field_count() {
        let key = test_key_pair(0).public_key.to_base64();

        let bad_input = format!("1_sig_extra\n\n3_1.0_{}\n\n", key);
        assert!(matches!(
            Transaction::deserialize(&bad_input),
            Err(TransactionError::MalformedRecord { section: "input", .. })
        ));

        let bad_output = "1_sig\n\n3_1.0\n\n";
        assert!(matches!(
            Transaction::deserialize(bad_output),
            Err(TransactionError::MalformedRecord { section: "output", .. })
        ));
    }

    #[test]
    fn test_deserialize_rejects_bad_fields() {
        let key = test_key_pair(0).public_key.to_base64();

        assert!(matches!(
            Transaction::deserialize("x_sig\n\n\n"),
            Err(TransactionError::InvalidId(id)) if id == "x"
        ));
        assert!(matches!(
            Transaction::deserialize(&format!("\n3_lots_{}\n\n", key)),
            Err(TransactionError::InvalidValue(v)) if v == "lots"
        ));
        assert!(matches!(
            Transaction::deserialize("\n3_1.0_notakey\n\n"),
            Err(TransactionError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_non_finite_values() {
        let key = test_key_pair(0).public_key.to_base64();

        for value in ["NaN", "inf", "-inf", "infinity"] {
            let text = format!("\n3_{}_{}\n\n", value, key);
            assert!(
                matches!(
                    Transaction::deserialize(&text),
                    Err(TransactionError::InvalidValue(ref v)) if v == value
                ),
                "{} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_deserialize_requires_terminators() {
        assert!(matches!(
            Transaction::deserialize("1_sig\n"),
            Err(TransactionError::MissingTerminator("inputs"))
        ));
        assert!(matches!(
            Transaction::deserialize("1_sig\n\n"),
            Err(TransactionError::MissingTerminator("outputs"))
        ));
        assert!(matches!(
            Transaction::deserialize("1_sig\n\n\n"),
            Ok(ref tx) if tx.inputs.len() == 1 && tx.outputs.is_empty()
        ));
        assert!(matches!(
            Transaction::deserialize(""),
            Err(TransactionError::MissingTerminator("outputs"))
        ));
    }

    #[test]
    fn test_deserialize_rejects_trailing_data() {
        assert!(matches!(
            Transaction::deserialize("\n\nextra\n"),
            Err(TransactionError::TrailingData)
        ));
    }

    #[test]
    fn test_display() {
        let text = sample_transaction().to_string();
        assert!(text.contains("  | inputs: 2"));
        assert!(text.contains("  |   tx: 1, sig: c2lnbmF0dXJ..."));
        assert!(text.contains("  | outputs: 2"));
        assert!(text.contains("  |   tx: 4, value: 0.1, key: "));
    }
}
