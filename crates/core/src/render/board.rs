use crate::domain::signal::SignalDocument;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedBoard = Arc<RwLock<SignalBoard>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalRow {
    pub symbol: String,
    pub trend: String,
    pub strength: String,
    pub volume_spike: String,
    pub reversal_signal: String,
    pub premium_discount: String,
    pub last_price: String,
}

impl SignalRow {
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.symbol,
            &self.trend,
            &self.strength,
            &self.volume_spike,
            &self.reversal_signal,
            &self.premium_discount,
            &self.last_price,
        ]
    }
}

/// What the dashboard currently shows: the updated label and the table body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalBoard {
    pub updated: String,
    pub rows: Vec<SignalRow>,
    pub rendered_at: Option<DateTime<Utc>>,
}

impl SignalBoard {
    pub fn shared() -> SharedBoard {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Replaces the label and every row with `doc`, one row per signal in document order.
    pub fn render(&mut self, doc: &SignalDocument, now: DateTime<Utc>) {
        let rows = doc
            .entries()
            .map(|(symbol, entry)| {
                let [trend, strength, volume_spike, reversal_signal, premium_discount, last_price] =
                    entry.cells();
                SignalRow {
                    symbol: symbol.to_string(),
                    trend,
                    strength,
                    volume_spike,
                    reversal_signal,
                    premium_discount,
                    last_price,
                }
            })
            .collect();

        self.updated = doc.timestamp_text();
        self.rows = rows;
        self.rendered_at = Some(now);
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> SignalDocument {
        SignalDocument::parse(text).unwrap()
    }

    #[test]
    fn renders_label_and_row_cells() {
        let d = doc(
            r#"{
                "timestamp": "2024-01-01T10:00:00Z",
                "signals": {
                    "NIFTY": {
                        "trend": "up",
                        "strength": 5,
                        "volume_spike": true,
                        "reversal_signal": false,
                        "premium_discount": "premium",
                        "last_price": 101.5
                    }
                }
            }"#,
        );
        let mut board = SignalBoard::default();
        board.render(&d, Utc::now());

        assert_eq!(board.updated, "2024-01-01T10:00:00Z");
        assert_eq!(board.rows.len(), 1);
        assert_eq!(
            board.rows[0].cells(),
            ["NIFTY", "up", "5", "true", "false", "premium", "101.5"]
        );
    }

    #[test]
    fn rerender_replaces_all_rows_in_source_order() {
        let first = doc(r#"{"timestamp": "t1", "signals": {"A": {}, "B": {}, "C": {}}}"#);
        let second = doc(r#"{"timestamp": "t2", "signals": {"Z": {}, "A": {}}}"#);

        let mut board = SignalBoard::default();
        board.render(&first, Utc::now());
        assert_eq!(board.rows.len(), 3);

        board.render(&second, Utc::now());
        let symbols: Vec<_> = board.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["Z", "A"]);
        assert_eq!(board.updated, "t2");
    }

    #[test]
    fn empty_signals_clear_the_table() {
        let mut board = SignalBoard::default();
        board.render(&doc(r#"{"timestamp": "t1", "signals": {"A": {}}}"#), Utc::now());
        board.render(&doc(r#"{"timestamp": "t2", "signals": {}}"#), Utc::now());
        assert!(board.rows.is_empty());
        assert!(board.is_rendered());
    }
}
