use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

/// Address of a contract whose creation transaction has been confirmed.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Shrinkwrap,
)]
#[serde(transparent)]
pub struct ContractAddress(pub Address);

impl ContractAddress {
    /// Rejects the zero address, which no creation transaction can produce.
    pub fn from_receipt(address: Option<Address>) -> Option<Self> {
        address.filter(|a| !a.is_zero()).map(Self)
    }
}

impl std::fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", to_checksum(&self.0, None))
    }
}
