//! Human-readable trading alert messages.

use chrono::{DateTime, Utc};

/// Render the alert sent when a buy or sell signal fires.
pub fn signal_message(symbol: &str, price: f64, time: DateTime<Utc>, action: &str) -> String {
    format!(
        "🚨 *TRADING ALERT* 🚨\n\
         • Coin: {}\n\
         • Current price: ${:.2}\n\
         • Time: {}\n\
         • Recommended action: {}\n\
         • _Automatic analysis generated by the bot_",
        symbol,
        price,
        time.format("%Y-%m-%d %H:%M:%S UTC"),
        action.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_signal_message() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let message = signal_message("BONK", 0.123456, time, "buy");

        assert!(message.starts_with("🚨 *TRADING ALERT* 🚨"));
        assert!(message.contains("• Coin: BONK"));
        assert!(message.contains("• Current price: $0.12"));
        assert!(message.contains("• Time: 2024-03-01 12:30:00 UTC"));
        assert!(message.contains("• Recommended action: BUY"));
        assert_eq!(message.lines().count(), 6);
    }
}
