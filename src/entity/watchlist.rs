use std::collections::HashMap;

use alloy::primitives::Address;
use std::str::FromStr;

/// In-memory registry of flagged addresses (scam, mixer, sanctions).
///
/// Lookups feed the clean-reputation criterion. The distinction between
/// "not flagged" and "no data" matters: a wallet only earns the clean
/// bonus when a watchlist was actually loaded.
pub struct WatchlistStore {
    flagged: HashMap<Address, FlagEntry>,
    loaded: bool,
}

#[derive(Debug, Clone)]
pub struct FlagEntry {
    pub entity_name: String,
    pub category: String,
}

impl WatchlistStore {
    pub fn empty() -> Self {
        Self {
            flagged: HashMap::new(),
            loaded: false,
        }
    }

    /// Parse a flagged-address CSV file.
    /// Expected columns: address, entity_name, category.
    pub fn load_csv(path: &str) -> eyre::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| eyre::eyre!("Failed to open watchlist CSV '{}': {}", path, e))?;

        let mut flagged = HashMap::new();
        for result in reader.records() {
            let record = result?;
            let addr_str = record.get(0).unwrap_or("").trim();
            let entity_name = record.get(1).unwrap_or("").trim().to_string();
            let category = record.get(2).unwrap_or("flagged").trim().to_string();

            let address = match Address::from_str(addr_str) {
                Ok(a) => a,
                Err(_) => {
                    tracing::warn!(address = addr_str, "Invalid address in watchlist, skipping");
                    continue;
                }
            };

            flagged.insert(
                address,
                FlagEntry {
                    entity_name,
                    category,
                },
            );
        }

        tracing::info!(entries = flagged.len(), "Loaded flagged-address watchlist");
        Ok(Self {
            flagged,
            loaded: true,
        })
    }

    /// Whether any watchlist data was loaded at all.
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn lookup(&self, address: &Address) -> Option<&FlagEntry> {
        self.flagged.get(address)
    }

    /// Returns `Some(true)` if any of `addresses` is flagged, `Some(false)`
    /// if none are and data is loaded, `None` when no watchlist exists.
    pub fn linkage<'a>(&self, addresses: impl IntoIterator<Item = &'a str>) -> Option<bool> {
        if !self.loaded {
            return None;
        }
        for addr_str in addresses {
            if let Ok(address) = Address::from_str(addr_str) {
                if self.flagged.contains_key(&address) {
                    return Some(true);
                }
            }
        }
        Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FLAGGED: &str = "0x7F367cC41522cE07553e823bf3be79A889DEbe1B";
    const CLEAN: &str = "0x1111111111111111111111111111111111111111";

    fn write_csv() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "address,entity_name,category").unwrap();
        writeln!(file, "{},Lazarus Group,sanctioned", FLAGGED).unwrap();
        writeln!(file, "not-an-address,Bad Row,scam").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_and_lookup() {
        let file = write_csv();
        let store = WatchlistStore::load_csv(file.path().to_str().unwrap()).unwrap();
        assert!(store.loaded());

        let entry = store
            .lookup(&Address::from_str(FLAGGED).unwrap())
            .expect("flagged address present");
        assert_eq!(entry.entity_name, "Lazarus Group");
        assert_eq!(entry.category, "sanctioned");

        // Malformed row was skipped, not fatal
        assert!(store.lookup(&Address::from_str(CLEAN).unwrap()).is_none());
    }

    #[test]
    fn test_linkage_three_states() {
        let file = write_csv();
        let store = WatchlistStore::load_csv(file.path().to_str().unwrap()).unwrap();

        assert_eq!(store.linkage([FLAGGED]), Some(true));
        assert_eq!(store.linkage([CLEAN]), Some(false));
        // Case-insensitive address parse
        assert_eq!(store.linkage([FLAGGED.to_lowercase().as_str()]), Some(true));

        let empty = WatchlistStore::empty();
        assert_eq!(empty.linkage([FLAGGED]), None);
    }
}
