use std::fmt;

#[derive(Debug, Clone)]
pub struct PriceFetchError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
}

impl fmt::Display for PriceFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price fetch failed (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for PriceFetchError {}
