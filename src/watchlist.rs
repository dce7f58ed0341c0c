use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchlistError {
    #[error("Please enter a stock symbol")]
    Empty,
    #[error("{0} is already in your watchlist")]
    Duplicate(String),
}

/// Trim and uppercase raw user input into a ticker symbol.
pub fn normalize_symbol(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Ordered set of tracked symbols. Insertion order is display order.
#[derive(Debug, Default, Clone)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    /// Rebuild from persisted content. Blank entries are skipped and repeated
    /// symbols keep their first position.
    pub fn from_symbols(symbols: Vec<String>) -> Self {
        let mut list = Watchlist::default();
        for symbol in symbols {
            if let Err(err) = list.add(&symbol) {
                log::debug!("skipping stored entry {symbol:?}: {err}");
            }
        }
        list
    }

    /// Add a symbol, returning its normalized form.
    pub fn add(&mut self, input: &str) -> Result<String, WatchlistError> {
        let symbol = normalize_symbol(input);
        if symbol.is_empty() {
            return Err(WatchlistError::Empty);
        }
        if self.contains(&symbol) {
            return Err(WatchlistError::Duplicate(symbol));
        }
        self.symbols.push(symbol.clone());
        Ok(symbol)
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
