use std::fmt::Display;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::order::PricingPolicy;

pub const DEFAULT_LOG_FILTER: &str = "info,food_orders=debug";

/// Service configuration, read from the environment.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_HOST | 0.0.0.0 | bind host |
/// | HTTP_PORT | 8080 | API, `/metrics` and `/health` port |
/// | LOG_FILTER | info,food_orders=debug | tracing filter when RUST_LOG is unset |
/// | FREE_DELIVERY_THRESHOLD | 50 | subtotal at which delivery becomes free |
/// | DELIVERY_FEE | 10 | fee below the threshold |
/// | TAX_RATE | 0.05 | tax as a fraction of the subtotal |
/// | SEED_DEMO_DATA | true | create demo users and products at start-up |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_host: String,
    pub http_port: u16,
    pub log_filter: String,
    pub pricing: PricingPolicy,
    pub seed_demo_data: bool,
}

impl AppConfig {
    /// Load from the process environment. Call `dotenv()` first to pick up `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = PricingPolicy::default();
        Self {
            http_host: lookup("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            http_port: parse_or(&lookup, "HTTP_PORT", 8080),
            log_filter: lookup("LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            pricing: PricingPolicy {
                free_delivery_threshold: parse_or(
                    &lookup,
                    "FREE_DELIVERY_THRESHOLD",
                    defaults.free_delivery_threshold,
                ),
                delivery_fee: parse_or(&lookup, "DELIVERY_FEE", defaults.delivery_fee),
                tax_rate: parse_or::<Decimal>(&lookup, "TAX_RATE", defaults.tax_rate),
            },
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", true),
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.http_host.clone(), self.http_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, default = %default, "Ignoring unparsable setting");
            default
        }),
    }
}
