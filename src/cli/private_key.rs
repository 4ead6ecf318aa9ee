use std::fmt;
use std::str::FromStr;

use ethers::prelude::k256::SecretKey;

/// Deployer key. `{}` prints a redacted form, `{:#}` the full hex.
#[derive(Clone)]
pub struct PrivateKey {
    pub key: SecretKey,
}

impl FromStr for PrivateKey {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);

        let bytes = hex::decode(s)?;

        let key = SecretKey::from_slice(&bytes)?;

        Ok(Self { key })
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let encoded = hex::encode(self.key.to_bytes());

        if f.alternate() {
            write!(f, "{encoded}")
        } else {
            write!(f, "0x…{}", &encoded[encoded.len() - 4..])
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_with_and_without_prefix() {
        let plain: PrivateKey = KEY.parse().unwrap();
        let prefixed: PrivateKey = format!("0x{KEY}\n").parse().unwrap();

        assert_eq!(format!("{plain:#}"), KEY);
        assert_eq!(format!("{prefixed:#}"), KEY);
    }

    #[test]
    fn display_is_redacted() {
        let key: PrivateKey = KEY.parse().unwrap();

        assert_eq!(key.to_string(), "0x…ff80");
        assert!(!format!("{key:?}").contains(KEY));
    }

    #[test]
    fn rejects_invalid_keys() {
        assert!("not hex".parse::<PrivateKey>().is_err());
        assert!("0x1234".parse::<PrivateKey>().is_err());
        assert!(format!("0x{}", "00".repeat(32)).parse::<PrivateKey>().is_err());
    }
}
