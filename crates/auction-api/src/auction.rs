//! Validation of incoming auction creation requests. Nothing in here talks
//! to the network so invalid requests never cause any chain interaction.

use {
    alloy::primitives::U256,
    serde_json::value::RawValue,
    std::collections::HashMap,
};

/// A request that passed validation and can be turned into a
/// `createAuction` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionCreationRequest {
    pub auction_type: u8,
    pub start_price: U256,
    /// Unix timestamp in seconds.
    pub end_time: u64,
    pub price_decrement: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid data types provided.")]
    InvalidType,
    #[error("End time must be in the future.")]
    PastEndTime,
}

/// Parses and validates a raw JSON request body. `now` is the current Unix
/// time in seconds.
///
/// All four fields have to be non-negative JSON numbers with an integral
/// value (`100`, `100.0` and `1e2` are the same number). `auctionType` must
/// fit into a `uint8`, `endTime` into a `u64` and the prices into a
/// `uint256`.
pub fn validate(body: &[u8], now: u64) -> Result<AuctionCreationRequest, ValidationError> {
    // Numbers are kept as raw text so prices beyond `u64` keep full precision.
    let fields = serde_json::from_slice::<HashMap<String, &RawValue>>(body)
        .map_err(|_| ValidationError::InvalidType)?;

    let auction_type = integer(&fields, "auctionType")?;
    let start_price = integer(&fields, "startPrice")?;
    let end_time = integer(&fields, "endTime")?;
    let price_decrement = integer(&fields, "priceDecrement")?;

    let auction_type = u8::try_from(auction_type).map_err(|_| ValidationError::InvalidType)?;
    let end_time = u64::try_from(end_time).map_err(|_| ValidationError::InvalidType)?;
    if end_time <= now {
        return Err(ValidationError::PastEndTime);
    }

    Ok(AuctionCreationRequest {
        auction_type,
        start_price,
        end_time,
        price_decrement,
    })
}

fn integer(fields: &HashMap<String, &RawValue>, name: &str) -> Result<U256, ValidationError> {
    fields
        .get(name)
        .and_then(|value| parse_integer(value.get()))
        .ok_or(ValidationError::InvalidType)
}

/// Parses the text of a JSON value into a non-negative integer. Returns
/// `None` for anything that is not a number, for negative numbers, for
/// numbers with a fractional part and for numbers exceeding `uint256`.
fn parse_integer(raw: &str) -> Option<U256> {
    // Strings, `null`, booleans, arrays, objects and negative numbers.
    if !raw.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let (mantissa, exponent) = match raw.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
        None => (raw, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    let scale = exponent.checked_sub(i64::try_from(fraction.len()).ok()?)?;

    let (digits, scale) = if scale < 0 {
        // Shifting right must only drop zeros, otherwise there is a fraction.
        let shift = usize::try_from(scale.unsigned_abs()).ok()?;
        match digits.len().checked_sub(shift) {
            Some(len) if digits[len..].bytes().all(|digit| digit == b'0') => (&digits[..len], 0),
            _ if digits.bytes().all(|digit| digit == b'0') => ("", 0),
            _ => return None,
        }
    } else {
        (digits, scale)
    };

    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    let value = U256::from_str_radix(digits, 10).ok()?;
    let factor = U256::from(10).checked_pow(U256::from(u64::try_from(scale).ok()?))?;
    value.checked_mul(factor)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::{Value, json},
    };

    const NOW: u64 = 1_700_000_000;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn accepts_valid_requests() {
        let request = validate(
            &body(json!({
                "auctionType": 1,
                "startPrice": 100,
                "endTime": NOW + 3600,
                "priceDecrement": 1,
            })),
            NOW,
        )
        .unwrap();

        assert_eq!(
            request,
            AuctionCreationRequest {
                auction_type: 1,
                start_price: U256::from(100),
                end_time: NOW + 3600,
                price_decrement: U256::from(1),
            }
        );
    }

    #[test]
    fn ignores_unknown_fields() {
        assert!(
            validate(
                &body(json!({
                    "auctionType": 0,
                    "startPrice": 100,
                    "endTime": NOW + 1,
                    "priceDecrement": 0,
                    "name": "vintage guitar",
                })),
                NOW,
            )
            .is_ok()
        );
    }

    #[test]
    fn rejects_missing_or_mistyped_fields() {
        let valid = json!({
            "auctionType": 0,
            "startPrice": 100,
            "endTime": NOW + 3600,
            "priceDecrement": 1,
        });

        for field in ["auctionType", "startPrice", "endTime", "priceDecrement"] {
            let mut missing = valid.clone();
            missing.as_object_mut().unwrap().remove(field);
            assert_eq!(
                validate(&body(missing), NOW),
                Err(ValidationError::InvalidType),
                "missing {field}"
            );

            for bad in [json!("100"), json!(null), json!(true), json!([1]), json!(-1), json!(1.5)] {
                let mut mistyped = valid.clone();
                mistyped[field] = bad.clone();
                assert_eq!(
                    validate(&body(mistyped), NOW),
                    Err(ValidationError::InvalidType),
                    "{field} = {bad}"
                );
            }
        }
    }

    #[test]
    fn accepts_prices_beyond_u64() {
        let request = validate(
            br#"{
                "auctionType": 0,
                "startPrice": 20000000000000000000,
                "endTime": 1700003600,
                "priceDecrement": 115792089237316195423570985008687907853269984665640564039457584007913129639935
            }"#,
            NOW,
        )
        .unwrap();
        assert_eq!(
            request.start_price,
            U256::from(20_000_000_000_000_000_000_u128)
        );
        assert_eq!(request.price_decrement, U256::MAX);

        // One above `uint256::MAX`.
        assert_eq!(
            validate(
                br#"{
                    "auctionType": 0,
                    "startPrice": 115792089237316195423570985008687907853269984665640564039457584007913129639936,
                    "endTime": 1700003600,
                    "priceDecrement": 1
                }"#,
                NOW,
            ),
            Err(ValidationError::InvalidType)
        );
    }

    #[test]
    fn accepts_integral_floats() {
        let request = validate(
            br#"{"auctionType": 1.0, "startPrice": 100.0, "endTime": 1.7000036e9, "priceDecrement": 5E2}"#,
            NOW,
        )
        .unwrap();
        assert_eq!(
            request,
            AuctionCreationRequest {
                auction_type: 1,
                start_price: U256::from(100),
                end_time: NOW + 3600,
                price_decrement: U256::from(500),
            }
        );
    }

    #[test]
    fn parses_integer_text() {
        for (raw, expected) in [
            ("0", Some(0_u64)),
            ("0.000", Some(0)),
            ("42", Some(42)),
            ("4200e-2", Some(42)),
            ("0.42e2", Some(42)),
            ("1E3", Some(1000)),
            ("0e999999", Some(0)),
            ("0.5", None),
            ("42.01", None),
            ("1e-1", None),
            ("1e100", None),
            ("-1", None),
            ("-0", None),
            ("\"1\"", None),
            ("null", None),
            ("[1]", None),
        ] {
            assert_eq!(parse_integer(raw), expected.map(U256::from), "{raw}");
        }
    }

    #[test]
    fn rejects_end_times_beyond_u64() {
        let request = br#"{"auctionType": 0, "startPrice": 100, "endTime": 18446744073709551616, "priceDecrement": 1}"#;
        assert_eq!(validate(request, NOW), Err(ValidationError::InvalidType));
    }

    #[test]
    fn rejects_out_of_range_auction_types() {
        let request = json!({
            "auctionType": 256,
            "startPrice": 100,
            "endTime": NOW + 3600,
            "priceDecrement": 1,
        });
        assert_eq!(
            validate(&body(request), NOW),
            Err(ValidationError::InvalidType)
        );
    }

    #[test]
    fn rejects_non_objects() {
        for raw in [&b""[..], b"not json", b"[]", b"42", b"{\"auctionType\": 1"] {
            assert_eq!(validate(raw, NOW), Err(ValidationError::InvalidType));
        }
    }

    #[test]
    fn rejects_end_times_not_in_the_future() {
        for end_time in [NOW - 10, NOW] {
            let request = json!({
                "auctionType": 0,
                "startPrice": 100,
                "endTime": end_time,
                "priceDecrement": 1,
            });
            assert_eq!(
                validate(&body(request), NOW),
                Err(ValidationError::PastEndTime)
            );
        }
    }

    #[test]
    fn type_errors_take_precedence_over_end_time() {
        let request = json!({
            "auctionType": "english",
            "startPrice": 100,
            "endTime": NOW - 10,
            "priceDecrement": 1,
        });
        assert_eq!(
            validate(&body(request), NOW),
            Err(ValidationError::InvalidType)
        );
    }
}
