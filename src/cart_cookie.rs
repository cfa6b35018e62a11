//! Signed cart-id cookie.
//!
//! Wire format: `<cart uuid>|<hex HMAC-SHA256(cart uuid, secret)>`. The cookie
//! is a capability token: anyone holding it can act on the cart, so only the
//! server may mint one.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const CART_COOKIE_NAME: &str = "cart_id";

/// Thirty days, in seconds.
pub const CART_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;

const SEPARATOR: char = '|';

/// Keyed once at startup; sign and verify work on a clone.
#[derive(Clone)]
pub struct CartCookieSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for CartCookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartCookieSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CartCookieSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    /// Produce the cookie value for `cart_id`.
    pub fn sign(&self, cart_id: Uuid) -> String {
        let id = cart_id.to_string();
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{id}{SEPARATOR}{signature}")
    }

    /// Extract the cart id from a cookie value.
    ///
    /// Returns `None` for anything that is not a well-formed, correctly signed
    /// token. Callers treat that exactly like an absent cookie.
    pub fn verify(&self, value: &str) -> Option<Uuid> {
        let (id, signature) = value.split_once(SEPARATOR)?;
        if signature.contains(SEPARATOR) {
            return None;
        }
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        // verify_slice compares in constant time.
        mac.verify_slice(&signature).ok()?;

        Uuid::parse_str(id).ok()
    }
}
