//! Event selector computation.
//!
//! The selector of a non-anonymous event is the keccak256 hash of its
//! canonical signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! It is stored as topics[0] of every log the event emits.

use chainevents_core::{EventAbiEntry, Word};
use tiny_keccak::{Hasher, Keccak};

/// keccak256 of arbitrary bytes.
pub fn keccak256(bytes: &[u8]) -> Word {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(bytes);
    hasher.finalize(&mut output);
    output
}

/// Selector of an event entry: keccak256 of its canonical signature.
pub fn selector_for(entry: &EventAbiEntry) -> Word {
    keccak256(entry.signature().as_bytes())
}

/// `0x`-prefixed hex rendering of a selector or topic.
pub fn to_hex(word: &Word) -> String {
    format!("0x{}", hex::encode(word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainevents_core::{AbiParam, ParamType};

    #[test]
    fn erc20_transfer_selector() {
        let entry = EventAbiEntry::new(
            "Transfer",
            vec![
                AbiParam::new("from", ParamType::Address, true),
                AbiParam::new("to", ParamType::Address, true),
                AbiParam::new("value", ParamType::Uint(256), false),
            ],
        );
        assert_eq!(
            to_hex(&selector_for(&entry)),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn selector_ignores_names_and_indexing() {
        // Emitted by the `emitNow` test contract (PUSH32 before LOG2 in its bytecode).
        let entry = EventAbiEntry::new(
            "SomeEvent",
            vec![
                AbiParam::new("a", ParamType::Address, false),
                AbiParam::new("b", ParamType::Address, true),
                AbiParam::new("c", ParamType::Uint(256), false),
            ],
        );
        assert_eq!(
            to_hex(&selector_for(&entry)),
            "0x9f08738e168c835bbaf7483705fb1c0a04a1a3258dd9687f14d430948e04e329"
        );
    }
}
