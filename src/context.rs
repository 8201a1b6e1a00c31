//! Subject context — the immutable market snapshot a debate runs against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Read-only financial snapshot for the subject under debate.
///
/// Fetched once before orchestration starts and treated as immutable input
/// for the whole debate; every prompt the agents build embeds the same
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectContext {
    /// Ticker symbol of the subject.
    pub ticker: String,
    /// Human-readable company name.
    pub company_name: String,
    /// Current market price, if known.
    pub current_price: Option<f64>,
    /// Sector classification, if known.
    pub sector: Option<String>,
    /// Free-form fundamentals (metric name → formatted value).
    pub fundamentals: BTreeMap<String, String>,
}

impl SubjectContext {
    /// Create a context for a ticker.
    pub fn new(ticker: &str, company_name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            company_name: company_name.to_string(),
            current_price: None,
            sector: None,
            fundamentals: BTreeMap::new(),
        }
    }

    /// Set the current price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }

    /// Set the sector.
    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    /// Add a fundamentals entry.
    pub fn with_fundamental(mut self, metric: &str, value: &str) -> Self {
        self.fundamentals.insert(metric.to_string(), value.to_string());
        self
    }

    /// Whether the context satisfies the debate entry preconditions.
    pub fn is_valid(&self) -> bool {
        !self.ticker.trim().is_empty()
    }

    /// Render the snapshot as a prompt section.
    pub fn prompt_block(&self) -> String {
        let mut out = format!("## Subject\n{} ({})\n", self.ticker, self.company_name);
        if let Some(price) = self.current_price {
            out.push_str(&format!("Current price: {}\n", price));
        }
        if let Some(sector) = &self.sector {
            out.push_str(&format!("Sector: {}\n", sector));
        }
        if !self.fundamentals.is_empty() {
            out.push_str("Fundamentals:\n");
            for (metric, value) in &self.fundamentals {
                out.push_str(&format!("- {}: {}\n", metric, value));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(SubjectContext::new("AAPL", "Apple Inc.").is_valid());
        assert!(!SubjectContext::new("", "Nameless").is_valid());
        assert!(!SubjectContext::new("   ", "Whitespace").is_valid());
    }

    #[test]
    fn test_prompt_block_contents() {
        let ctx = SubjectContext::new("MSFT", "Microsoft")
            .with_price(410.5)
            .with_sector("Technology")
            .with_fundamental("P/E", "35.2")
            .with_fundamental("FCF yield", "2.8%");

        let block = ctx.prompt_block();
        assert!(block.contains("MSFT (Microsoft)"));
        assert!(block.contains("Current price: 410.5"));
        assert!(block.contains("Sector: Technology"));
        assert!(block.contains("- P/E: 35.2"));
        assert!(block.contains("- FCF yield: 2.8%"));
    }

    #[test]
    fn test_prompt_block_minimal() {
        let block = SubjectContext::new("TSLA", "Tesla").prompt_block();
        assert!(block.contains("TSLA (Tesla)"));
        assert!(!block.contains("Fundamentals"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let ctx = SubjectContext::new("NVDA", "NVIDIA").with_price(120.0);
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: SubjectContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.ticker, "NVDA");
        assert_eq!(parsed.current_price, Some(120.0));
    }
}
