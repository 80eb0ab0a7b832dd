//! Converts alloy-core `DynSolValue` → ChainEvents `FieldValue`.

use alloy_core::dyn_abi::DynSolValue;
use chainevents_core::FieldValue;

/// Convert a decoded `DynSolValue` into a `FieldValue`.
pub fn normalize(val: DynSolValue) -> FieldValue {
    match val {
        DynSolValue::Bool(b) => FieldValue::Bool(b),

        DynSolValue::Int(i, _bits) => match i128::try_from(i) {
            Ok(v) => FieldValue::Int(v),
            Err(_) => FieldValue::BigInt(i.to_string()),
        },

        DynSolValue::Uint(u, _bits) => match u128::try_from(u) {
            Ok(v) => FieldValue::Uint(v),
            Err(_) => FieldValue::BigUint(u.to_string()),
        },

        // The word is right-padded; keep only the declared width
        DynSolValue::FixedBytes(word, size) => FieldValue::FixedBytes(word[..size].to_vec()),

        DynSolValue::Bytes(b) => FieldValue::Bytes(b),

        DynSolValue::String(s) => FieldValue::Str(s),

        // Leading padding is already dropped; render the 20 bytes as plain hex
        DynSolValue::Address(a) => FieldValue::Address(format!("0x{}", hex::encode(a.as_slice()))),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            FieldValue::Array(vals.into_iter().map(normalize).collect())
        }

        DynSolValue::Tuple(fields) => FieldValue::Tuple(fields.into_iter().map(normalize).collect()),

        DynSolValue::Function(f) => FieldValue::Bytes(f.to_vec()),

        #[allow(unreachable_patterns)]
        other => FieldValue::Str(format!("{other:?}")),
    }
}
