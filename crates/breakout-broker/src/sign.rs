use breakout_core::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signature of a query string, hex encoded.
///
/// Binance expects this as the `signature` parameter on every private
/// endpoint.
pub fn sign_request(secret: &str, query_string: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Configuration(format!("invalid secret: {e}")))?;
    mac.update(query_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_signature() {
        // Worked example from the Binance API documentation.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign_request(secret, query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let a = sign_request("one", "symbol=BTCUSDT").unwrap();
        let b = sign_request("two", "symbol=BTCUSDT").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
