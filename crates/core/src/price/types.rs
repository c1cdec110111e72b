use std::collections::BTreeMap;

/// Body of `/api/v3/simple/price`: coin id -> (currency -> price),
/// e.g. `{"bitcoin": {"usd": 97123.45}}`.
pub type SimplePriceResponse = BTreeMap<String, BTreeMap<String, f64>>;

pub fn quote(resp: &SimplePriceResponse, coin_id: &str, vs_currency: &str) -> Option<f64> {
    resp.get(coin_id)?.get(vs_currency).copied()
}
