/*!
    The optional UI configuration file carrying a PDO mapping.

    The commissioning UI exports the mapping as JSON, with one hex string key per PDO and one
    hex string per 32 bit mapping word:

    ```json
    { "pdoMapping": {
        "rx": { "0x1600": ["0x60400010", "0x607A0020"] },
        "tx": { "0x1A00": ["0x60410010", "0x60640020"] } } }
    ```

    Hex strings are case insensitive but the `0x` prefix is required. PDO groups apply in
    ascending PDO index order, the words of one group in file order.
*/

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::{EthernetError, EthernetResult};
use crate::mapping::{PdoMappingEntry, PdoMappings};

/// top level structure of the UI configuration file
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    #[serde(default)]
    pub pdo_mapping: UiPdoMapping,
}

/// the `pdoMapping` member: hex string words per hex string PDO index
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UiPdoMapping {
    #[serde(default)]
    pub rx: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub tx: HashMap<String, Vec<String>>,
}

impl UiConfig {
    pub fn from_json(text: &str) -> EthernetResult<Self> {
        serde_json::from_str(text)
            .map_err(|error| {
                log::debug!("UI configuration rejected: {}", error);
                EthernetError::Client("invalid UI configuration JSON")
            })
    }
}

impl PdoMappings {
    /// expand a parsed UI configuration into mapping entries in packing order
    pub fn from_config(config: &UiConfig) -> EthernetResult<Self> {
        Ok(Self {
            rx: expand(&config.pdo_mapping.rx)?,
            tx: expand(&config.pdo_mapping.tx)?,
        })
    }
}

fn expand(groups: &HashMap<String, Vec<String>>) -> EthernetResult<Vec<PdoMappingEntry>> {
    // PDO groups apply in ascending index order, like the ordered map of the UI export
    let mut ordered = BTreeMap::new();
    for (key, words) in groups {
        let pdo_index = u16::try_from(parse_hex(key)?)
            .map_err(|_| EthernetError::Client("PDO index does not fit in 16 bits"))?;
        ordered.insert(pdo_index, words);
    }
    let mut entries = Vec::new();
    for (pdo_index, words) in ordered {
        for word in words {
            entries.push(PdoMappingEntry::from_word(pdo_index, parse_hex(word)?));
        }
    }
    Ok(entries)
}

/// parse a `0x` prefixed hex string, case insensitive
fn parse_hex(text: &str) -> EthernetResult<u32> {
    let digits = text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or(EthernetError::Client("hex value must carry a 0x prefix"))?;
    u32::from_str_radix(digits, 16)
        .map_err(|_| EthernetError::Client("invalid hex value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pdoMapping": {
            "rx": {
                "0x1601": ["0x60FF0020"],
                "0x1600": ["0x60400010", "0x607a0020"]
            },
            "tx": {
                "0X1A00": ["0x60410010", "0x60640020"]
            }
        }
    }"#;

    #[test]
    fn expands_in_pdo_index_order() {
        let config = UiConfig::from_json(SAMPLE).unwrap();
        let mappings = PdoMappings::from_config(&config).unwrap();
        assert_eq!(
            mappings.rx.iter().map(|entry| (entry.pdo_index, entry.index)).collect::<Vec<_>>(),
            [(0x1600, 0x6040), (0x1600, 0x607a), (0x1601, 0x60ff)],
        );
        assert_eq!(mappings.tx.len(), 2);
        assert_eq!(mappings.rx_packed_size(), 10);
        assert_eq!(mappings.tx_packed_size(), 6);
    }

    #[test]
    fn hex_is_case_insensitive_but_prefixed() {
        assert_eq!(parse_hex("0x607A0020").unwrap(), 0x607a_0020);
        assert_eq!(parse_hex("0X607a0020").unwrap(), 0x607a_0020);
        assert!(parse_hex("607A0020").is_err());
        assert!(parse_hex("0xZZZZ").is_err());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config = UiConfig::from_json(r#"{ "pdoMapping": { "rx": {} } }"#).unwrap();
        let mappings = PdoMappings::from_config(&config).unwrap();
        assert!(mappings.rx.is_empty());
        assert!(mappings.tx.is_empty());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(UiConfig::from_json("{ not json").is_err());
    }
}
