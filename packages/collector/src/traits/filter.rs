//! Proxy-integration seam: which exchanges to mine and how to decode them.

use crate::types::exchange::HttpExchange;

/// Decides whether an exchange is mined and decodes raw parameter text.
///
/// Implemented by the proxy integration; [`ScopeFilter`](crate::ScopeFilter)
/// is the reference implementation.
#[cfg_attr(test, mockall::automock)]
pub trait ExchangeFilter: Send + Sync {
    /// `true` excludes the exchange from mining.
    fn is_excluded(&self, exchange: &HttpExchange, origin: &str) -> bool;

    /// Decode a raw parameter name or value.
    fn decode_parameter(&self, raw: &str) -> String;
}

impl<T: ExchangeFilter + ?Sized> ExchangeFilter for std::sync::Arc<T> {
    fn is_excluded(&self, exchange: &HttpExchange, origin: &str) -> bool {
        (**self).is_excluded(exchange, origin)
    }

    fn decode_parameter(&self, raw: &str) -> String {
        (**self).decode_parameter(raw)
    }
}
