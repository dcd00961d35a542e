//! Plain-text rendering of market payloads for tool results.

use crate::upstream::Market;

pub const MARKET_NOT_FOUND: &str = "Market not found. Please check the market ID or slug.";
pub const NO_MARKETS_FOUND: &str = "No markets found with the specified criteria.";
pub const NO_PRICE_DATA: &str = "No price data available for this market.";

/// Format a dollar amount with thousands separators and cents, e.g. `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

pub fn price_line(outcome: &str, price: f64) -> String {
    format!("{}: ${:.4} ({:.1}%)", outcome, price, price * 100.0)
}

fn outcome_price_summary(market: &Market) -> String {
    let Some(outcomes) = &market.outcomes else {
        return "N/A".to_string();
    };

    outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let price = market
                .outcomeprices
                .as_ref()
                .and_then(|prices| prices.price_for(i, outcome))
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!("{}: {}", outcome, price)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn market_report(market: &Market) -> String {
    format!(
        "Market Information:\n\n\
         Title: {}\n\
         Category: {}\n\
         Status: {}\n\
         End Date: {}\n\
         Volume: {}\n\
         Liquidity: {}\n\
         Outcome Prices: {}\n\n\
         Description: {}",
        market.title_or("N/A"),
        market.category(),
        market.status(),
        market.end_date(),
        format_currency(market.volume()),
        format_currency(market.liquidity()),
        outcome_price_summary(market),
        market.description(),
    )
}

pub fn market_list(markets: &[Market]) -> String {
    if markets.is_empty() {
        return NO_MARKETS_FOUND.to_string();
    }

    markets
        .iter()
        .enumerate()
        .map(|(i, market)| {
            format!(
                "{}. {}\n   ID: {}\n   Status: {}\n   Volume: {}\n   End Date: {}\n---",
                i + 1,
                market.title_or("Untitled Market"),
                market.display_id(),
                market.status(),
                format_currency(market.volume()),
                market.end_date(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn market_prices(market: &Market) -> String {
    let header = format!("Market: {}", market.title_or("N/A"));

    let lines: Vec<String> = match (&market.outcomes, &market.outcomeprices, &market.tokens) {
        (Some(outcomes), Some(prices), _) => outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| price_line(outcome, prices.price_for(i, outcome).unwrap_or(0.0)))
            .collect(),
        (_, _, Some(tokens)) => tokens
            .iter()
            .map(|token| {
                price_line(
                    token.outcome.as_deref().unwrap_or("Unknown"),
                    token.price.unwrap_or(0.0),
                )
            })
            .collect(),
        _ => vec![NO_PRICE_DATA.to_string()],
    };

    format!("{}\n\n{}", header, lines.join("\n"))
}
