//! Where the asset price comes from.

use crate::domain::pricing::parse_price;
use crate::foundation::{Result, SwapError, UdtName};
use crate::infrastructure::storage::Storage;
use log::info;
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceStrategy {
    /// An external feed writes `PRICE:<udt>`; the service only reads it.
    Custom,
    /// Written once at startup.
    Fixed(Decimal),
}

impl PriceStrategy {
    /// Accepts `custom`, `fixed:<decimal>` or a bare decimal.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("custom") {
            return Ok(Self::Custom);
        }
        let fixed = value.strip_prefix("fixed:").unwrap_or(value);
        parse_price(fixed).map(Self::Fixed).map_err(|err| SwapError::ConfigError(format!("price.strategy: {err}")))
    }

    pub fn apply(&self, storage: &dyn Storage, udt: &UdtName) -> Result<()> {
        match self {
            Self::Custom => {
                info!("price strategy custom; waiting for an external writer udt={}", udt);
            }
            Self::Fixed(price) => {
                storage.set_price(udt, *price)?;
                info!("fixed price written udt={} price={}", udt, price);
            }
        }
        Ok(())
    }
}
