//! Market payloads as returned by the Gamma API.
//!
//! Every field is optional and decoded leniently: the upstream schema is not
//! versioned and the same field shows up as a number, a numeric string or a
//! JSON-encoded array depending on the endpoint. Fallback chains live on the
//! accessor methods so formatting code never probes raw JSON.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Market {
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub closed: Option<bool>,
    #[serde(default, alias = "endDateIso", deserialize_with = "lenient_string")]
    pub end_date_iso: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub outcomes: Option<Vec<String>>,
    #[serde(default, alias = "outcomePrices", deserialize_with = "lenient_prices")]
    pub outcomeprices: Option<OutcomePrices>,
    #[serde(default, deserialize_with = "lenient_tokens")]
    pub tokens: Option<Vec<Token>>,
    #[serde(default, alias = "conditionId", deserialize_with = "lenient_string")]
    pub condition_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    pub outcome: Option<String>,
    pub price: Option<f64>,
}

/// Outcome prices keyed either by outcome name or by outcome position.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomePrices {
    ByName(HashMap<String, f64>),
    ByIndex(Vec<Option<f64>>),
}

impl OutcomePrices {
    pub fn price_for(&self, index: usize, outcome: &str) -> Option<f64> {
        match self {
            OutcomePrices::ByName(prices) => prices.get(outcome).copied(),
            OutcomePrices::ByIndex(prices) => prices.get(index).copied().flatten(),
        }
    }
}

impl Market {
    /// Decode a single market body. An empty body (`null`, `false`, `0` or
    /// `""`) means "not found".
    pub fn from_body(body: Value) -> serde_json::Result<Option<Self>> {
        if is_empty_body(&body) {
            return Ok(None);
        }
        serde_json::from_value(body).map(Some)
    }

    /// Decode a listing body. Anything but a non-empty array is treated as no results.
    pub fn list_from_body(body: Value) -> serde_json::Result<Vec<Self>> {
        match body {
            Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.question
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(fallback)
    }

    pub fn display_id(&self) -> &str {
        self.condition_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("N/A")
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("N/A")
    }

    pub fn status(&self) -> &'static str {
        if self.closed.unwrap_or(false) {
            "Closed"
        } else {
            "Open"
        }
    }

    pub fn end_date(&self) -> &str {
        self.end_date_iso.as_deref().unwrap_or("N/A")
    }

    pub fn volume(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity.unwrap_or(0.0)
    }

    pub fn description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or("No description available.")
    }
}

/// Render a scalar the way it would appear in a URL or a text report.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Arrays sometimes arrive JSON-encoded inside a string.
fn unwrap_encoded(value: Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).filter(|_| !value.is_boolean()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match unwrap_encoded(Value::deserialize(deserializer)?) {
        Value::Array(items) => Some(items.iter().filter_map(scalar_text).collect()),
        _ => None,
    })
}

fn lenient_prices<'de, D>(deserializer: D) -> Result<Option<OutcomePrices>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match unwrap_encoded(Value::deserialize(deserializer)?) {
        Value::Object(map) => Some(OutcomePrices::ByName(
            map.iter()
                .filter_map(|(name, price)| number(price).map(|p| (name.clone(), p)))
                .collect(),
        )),
        Value::Array(items) => Some(OutcomePrices::ByIndex(items.iter().map(number).collect())),
        _ => None,
    })
}

fn lenient_tokens<'de, D>(deserializer: D) -> Result<Option<Vec<Token>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| Token {
                    outcome: item.get("outcome").and_then(scalar_text),
                    price: item.get("price").and_then(number),
                })
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_body_is_not_found() {
        assert!(Market::from_body(Value::Null).unwrap().is_none());
    }

    #[test]
    fn empty_scalar_bodies_are_not_found() {
        for body in [json!(false), json!(0), json!(0.0), json!("")] {
            assert!(Market::from_body(body.clone()).unwrap().is_none(), "{}", body);
        }
        assert!(Market::from_body(json!({"question": "Q"})).unwrap().is_some());
    }

    #[test]
    fn fallbacks_apply_when_fields_missing() {
        let market = Market::from_body(json!({})).unwrap().unwrap();
        assert_eq!(market.title_or("N/A"), "N/A");
        assert_eq!(market.display_id(), "N/A");
        assert_eq!(market.category(), "N/A");
        assert_eq!(market.status(), "Open");
        assert_eq!(market.end_date(), "N/A");
        assert_eq!(market.volume(), 0.0);
        assert_eq!(market.liquidity(), 0.0);
    }

    #[test]
    fn question_wins_over_title_and_empty_strings_fall_through() {
        let market = Market::from_body(json!({"question": "", "title": "T"}))
            .unwrap()
            .unwrap();
        assert_eq!(market.title_or("N/A"), "T");

        let market = Market::from_body(json!({"question": "Q", "title": "T"}))
            .unwrap()
            .unwrap();
        assert_eq!(market.title_or("N/A"), "Q");
    }

    #[test]
    fn condition_id_wins_over_numeric_id() {
        let market = Market::from_body(json!({"id": 12})).unwrap().unwrap();
        assert_eq!(market.display_id(), "12");

        let market = Market::from_body(json!({"id": 12, "conditionId": "0xabc"}))
            .unwrap()
            .unwrap();
        assert_eq!(market.display_id(), "0xabc");
    }

    #[test]
    fn decodes_gamma_style_encoded_arrays() {
        let market = Market::from_body(json!({
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.25\", \"0.75\"]",
            "volume": "1234.5",
            "closed": true
        }))
        .unwrap()
        .unwrap();

        assert_eq!(market.outcomes.as_deref(), Some(&["Yes".to_string(), "No".to_string()][..]));
        assert_eq!(market.volume(), 1234.5);
        assert_eq!(market.status(), "Closed");
        let prices = market.outcomeprices.unwrap();
        assert_eq!(prices.price_for(1, "No"), Some(0.75));
    }

    #[test]
    fn price_map_is_keyed_by_outcome_name() {
        let market = Market::from_body(json!({"outcomeprices": {"Yes": 0.6, "No": "0.4"}}))
            .unwrap()
            .unwrap();
        let prices = market.outcomeprices.unwrap();
        assert_eq!(prices.price_for(5, "Yes"), Some(0.6));
        assert_eq!(prices.price_for(0, "No"), Some(0.4));
        assert_eq!(prices.price_for(0, "Maybe"), None);
    }

    #[test]
    fn tokens_tolerate_string_prices() {
        let market = Market::from_body(json!({
            "tokens": [{"outcome": "Yes", "price": "0.3"}, {"outcome": "No"}]
        }))
        .unwrap()
        .unwrap();
        let tokens = market.tokens.unwrap();
        assert_eq!(tokens[0].price, Some(0.3));
        assert_eq!(tokens[1].price, None);
    }

    #[test]
    fn listing_ignores_non_array_bodies() {
        assert!(Market::list_from_body(json!({"error": "nope"})).unwrap().is_empty());
        assert_eq!(Market::list_from_body(json!([{}, {}])).unwrap().len(), 2);
    }
}
