//! Cookie-backed cart storage and extractors.
//!
//! The cart never touches server-side state. Each request rebuilds a
//! [`CartLedger`] from the request's `cart` cookie; a mutation rewrites the
//! whole snapshot and the response carries it back in a `Set-Cookie`.
//!
//! # Cookie format
//!
//! ```text
//! cart=<percent-encoded JSON array>; Path=/; Max-Age=604800; Expires=...; SameSite=Lax[; Secure]
//! ```
//!
//! Browsers drop cookies over 4096 bytes, so larger snapshots are refused up
//! front as a storage write failure instead of silently vanishing.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponseParts, ResponseParts},
};
use bazaar_core::cart::{CART_STORAGE_KEY, CartLedger, CartStorage, StorageError};
use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

use crate::state::AppState;

/// Cart cookie name.
pub const CART_COOKIE_NAME: &str = CART_STORAGE_KEY;

/// Cart cookie lifetime in days, counted from the last write.
pub const CART_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Largest `name=value` pair browsers reliably keep.
pub const MAX_COOKIE_BYTES: usize = 4096;

/// Cart storage over the request/response cookie pair.
#[derive(Debug, Clone, Default)]
pub struct CookieCartStorage {
    /// Decoded snapshot as seen by this request (updated by writes).
    current: Option<String>,
    /// Encoded value to send back, if the cart was written.
    pending: Option<String>,
    secure: bool,
}

impl CookieCartStorage {
    /// Read the cart cookie out of the request headers.
    ///
    /// Every `Cookie` header is scanned; the last `cart` pair wins. A value
    /// that is not valid percent-encoding is treated as absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let raw = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .filter(|c| c.name() == CART_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .last();

        let current = raw.and_then(|value| match urlencoding::decode(&value) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding cart cookie with invalid encoding");
                None
            }
        });

        Self {
            current,
            pending: None,
            secure,
        }
    }

    /// The `Set-Cookie` to send, if the cart was written during this request.
    #[must_use]
    pub fn set_cookie(&self) -> Option<Cookie<'static>> {
        let value = self.pending.clone()?;
        let max_age = Duration::days(CART_COOKIE_MAX_AGE_DAYS);

        Some(
            Cookie::build((CART_COOKIE_NAME, value))
                .path("/")
                .max_age(max_age)
                .expires(OffsetDateTime::now_utc() + max_age)
                .same_site(SameSite::Lax)
                .secure(self.secure)
                .build(),
        )
    }
}

impl CartStorage for CookieCartStorage {
    fn read(&self) -> Option<String> {
        self.current.clone()
    }

    fn write(&mut self, snapshot: &str) -> Result<(), StorageError> {
        let encoded = urlencoding::encode(snapshot).into_owned();
        let size = CART_COOKIE_NAME.len() + 1 + encoded.len();

        if size > MAX_COOKIE_BYTES {
            return Err(StorageError::QuotaExceeded {
                size,
                limit: MAX_COOKIE_BYTES,
            });
        }

        self.current = Some(snapshot.to_owned());
        self.pending = Some(encoded);
        Ok(())
    }
}

/// Extractor yielding the cart ledger for this request.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CartSession(mut cart): CartSession) -> impl IntoResponse {
///     cart.clear();
///     (CartCookie::from(&cart), "emptied")
/// }
/// ```
#[derive(Debug)]
pub struct CartSession(pub CartLedger<CookieCartStorage>);

impl FromRequestParts<AppState> for CartSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let storage = CookieCartStorage::from_headers(&parts.headers, state.config().is_secure());
        Ok(Self(CartLedger::open(storage)))
    }
}

/// Response part that writes the cart cookie back, if it changed.
#[derive(Debug, Clone, Default)]
pub struct CartCookie(Option<Cookie<'static>>);

impl From<&CartLedger<CookieCartStorage>> for CartCookie {
    fn from(ledger: &CartLedger<CookieCartStorage>) -> Self {
        Self(ledger.storage().set_cookie())
    }
}

impl IntoResponseParts for CartCookie {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.0 {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cart cookie is not a valid header value");
                }
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use bazaar_core::cart::NewLineItem;
    use bazaar_core::{ProductId, VariantId};

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for c in cookies {
            headers.append(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        headers
    }

    fn item(variant: &str, title: &str) -> NewLineItem {
        NewLineItem {
            product_id: ProductId::new("p1"),
            title: title.to_string(),
            image: "https://cdn.example/p1.png".to_string(),
            variant_id: VariantId::new(variant),
            size: "M".to_string(),
            quantity: 1,
        }
    }

    #[test]
    fn test_missing_cookie_reads_none() {
        let storage = CookieCartStorage::from_headers(&HeaderMap::new(), false);
        assert_eq!(storage.read(), None);
        assert!(storage.set_cookie().is_none());
    }

    #[test]
    fn test_reads_percent_encoded_cookie_among_others() {
        let json = r#"[{"productId":"p1","title":"T","image":"i","variantId":"v1","size":"M","quantity":2}]"#;
        let encoded = urlencoding::encode(json);
        let headers = headers_with(&["theme=dark", &format!("session=abc; cart={encoded}")]);

        let ledger = CartLedger::open(CookieCartStorage::from_headers(&headers, false));

        assert_eq!(ledger.items().len(), 1);
        assert_eq!(ledger.items()[0].quantity, 2);
    }

    #[test]
    fn test_invalid_encoding_loads_empty() {
        // %FF decodes to a lone byte that is not UTF-8.
        let headers = headers_with(&["cart=%FF%FE"]);
        let ledger = CartLedger::open(CookieCartStorage::from_headers(&headers, false));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_write_produces_set_cookie_with_attributes() {
        let mut ledger = CartLedger::open(CookieCartStorage::from_headers(&HeaderMap::new(), true));
        ledger.add(item("v1", "Linen Panjabi"));

        let cookie = ledger.storage().set_cookie().unwrap();
        assert_eq!(cookie.name(), "cart");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));

        let decoded = urlencoding::decode(cookie.value()).unwrap();
        assert!(decoded.contains(r#""title":"Linen Panjabi""#));

        // The same request sees its own write.
        assert_eq!(ledger.load().len(), 1);
    }

    #[test]
    fn test_oversize_snapshot_is_rejected_without_cookie() {
        let mut ledger = CartLedger::open(CookieCartStorage::from_headers(&HeaderMap::new(), false));
        ledger.add(item("v1", "small"));
        let accepted = ledger.storage().set_cookie().unwrap().value().to_string();

        ledger.add(NewLineItem {
            product_id: ProductId::new("p2"),
            ..item("v2", &"x".repeat(MAX_COOKIE_BYTES))
        });

        assert_eq!(ledger.items().len(), 2);
        assert!(matches!(
            ledger.write_error(),
            Some(StorageError::QuotaExceeded { .. })
        ));
        // The pending cookie still holds the last snapshot that fit.
        assert_eq!(ledger.storage().set_cookie().unwrap().value(), accepted);
    }

    #[test]
    fn test_cart_cookie_appends_header() {
        let mut ledger = CartLedger::open(CookieCartStorage::default());
        ledger.clear();

        let response = (CartCookie::from(&ledger), "ok").into_response();
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();

        assert!(header.starts_with("cart=%5B%5D"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=604800"));
    }
}
