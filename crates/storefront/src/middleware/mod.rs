//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span with status and latency)
//! 3. Request ID (recorded on the span, echoed in `x-request-id`)
//! 4. Security headers (CSP, frame and referrer policy)
//!
//! The cart cookie is not a layer: handlers pull it in with the
//! [`CartSession`] extractor and write it back with [`CartCookie`].

pub mod cart_cookie;
pub mod request_id;
pub mod security_headers;

pub use cart_cookie::{CartCookie, CartSession, CookieCartStorage};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
