//! Ratio extraction strategies.
//!
//! The backend response has shipped in a few shapes over time, and the page
//! text is the last resort. Each shape is a named strategy; the fetcher tries
//! them in a fixed order and the first one producing a number wins.

use regex::Regex;
use serde_json::Value;
use std::future::Future;
use std::sync::LazyLock;

/// Exclusive upper bound for a believable P/E.
pub const RATIO_UPPER_BOUND: f64 = 1000.0;

/// Sanity bound applied to every extracted ratio: strictly inside (0, 1000).
pub fn is_valid_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio > 0.0 && ratio < RATIO_UPPER_BOUND
}

// Label, then an optional qualifier such as "(近10年)", then at most ten
// characters that are neither digits nor a sign before the number.
static PE_TTM_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(?:市盈率\s*[（(]?\s*TTM\s*[)）]?|PE\s*[-_]?\s*TTM|P/E\s*[（(]\s*TTM\s*[)）])(?:\s*[（(][^)）]{0,12}[)）])?[^\d-]{0,10}(-?\d+(?:\.\d+)?)",
    )
    .unwrap()
});

/// Input handed to a strategy.
#[derive(Debug, Clone, Copy)]
pub enum RatioInput<'a> {
    /// Parsed backend response
    Json(&'a Value),
    /// Visible page text
    PageText(&'a str),
}

/// One way of locating the ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioStrategy {
    /// `pe_ttm`
    DirectField,
    /// `peTtm`
    AlternateField,
    /// `valuation.pe_ttm` / `valuation.peTtm`
    NestedValuationField,
    /// "P/E (TTM)" label in page text followed by a number
    DomRegex,
}

/// Strategies applied to a captured response, in priority order.
pub const JSON_STRATEGIES: [RatioStrategy; 3] = [
    RatioStrategy::DirectField,
    RatioStrategy::AlternateField,
    RatioStrategy::NestedValuationField,
];

impl RatioStrategy {
    /// Short name for logs and the report.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectField => "direct-field",
            Self::AlternateField => "alternate-field",
            Self::NestedValuationField => "nested-valuation-field",
            Self::DomRegex => "dom-regex",
        }
    }

    /// Try to extract a ratio. No bound check happens here.
    pub fn extract(&self, input: RatioInput<'_>) -> Option<f64> {
        match (self, input) {
            (Self::DirectField, RatioInput::Json(root)) => {
                records(root).find_map(|r| r.get("pe_ttm").and_then(numeric))
            }
            (Self::AlternateField, RatioInput::Json(root)) => {
                records(root).find_map(|r| r.get("peTtm").and_then(numeric))
            }
            (Self::NestedValuationField, RatioInput::Json(root)) => records(root).find_map(|r| {
                let valuation = r.get("valuation")?;
                valuation
                    .get("pe_ttm")
                    .or_else(|| valuation.get("peTtm"))
                    .and_then(numeric)
            }),
            (Self::DomRegex, RatioInput::PageText(text)) => PE_TTM_LABEL
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            _ => None,
        }
    }
}

/// First strategy in `strategies` that produces a number.
pub fn extract_first(
    strategies: &[RatioStrategy],
    input: RatioInput<'_>,
) -> Option<(RatioStrategy, f64)> {
    strategies
        .iter()
        .find_map(|s| s.extract(input).map(|v| (*s, v)))
}

/// Ratio from a captured backend response, kept only when inside the bound.
pub fn ratio_from_response(body: &Value) -> Option<(RatioStrategy, f64)> {
    match extract_first(&JSON_STRATEGIES, RatioInput::Json(body)) {
        Some((strategy, ratio)) if is_valid_ratio(ratio) => Some((strategy, ratio)),
        Some((strategy, ratio)) => {
            tracing::warn!(
                ratio,
                strategy = strategy.name(),
                "Captured ratio out of bounds, falling back to page text"
            );
            None
        }
        None => {
            tracing::warn!("Captured response has no known ratio field");
            None
        }
    }
}

/// Ratio from rendered page text, kept only when inside the bound.
pub fn ratio_from_text(text: &str) -> Option<(RatioStrategy, f64)> {
    let strategy = RatioStrategy::DomRegex;
    match strategy.extract(RatioInput::PageText(text)) {
        Some(ratio) if is_valid_ratio(ratio) => Some((strategy, ratio)),
        Some(ratio) => {
            tracing::warn!(ratio, "Page text ratio out of bounds");
            None
        }
        None => None,
    }
}

/// Pick the ratio: the captured response first, the page text second.
///
/// `page_text` is only awaited when the response yields nothing usable.
pub async fn select_ratio<F, Fut>(
    response: Option<&Value>,
    page_text: F,
) -> Option<(RatioStrategy, f64)>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<String>>,
{
    if let Some(found) = response.and_then(ratio_from_response) {
        return Some(found);
    }
    let text = page_text().await?;
    ratio_from_text(&text)
}

/// Objects that may carry the ratio: the root, `data` when it is an object,
/// and the first element of `data` when it is an array.
fn records(root: &Value) -> impl Iterator<Item = &Value> {
    let data = root.get("data");
    let nested = match data {
        Some(Value::Object(_)) => data,
        Some(Value::Array(items)) => items.first(),
        _ => None,
    };
    std::iter::once(root).chain(nested)
}

/// Numbers, numeric strings, or a metric object keyed by `mcw`/`value`.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("mcw").or_else(|| map.get("value")).and_then(numeric),
        _ => None,
    }
}
