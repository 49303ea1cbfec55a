//! The [`Dec`] value type.

use crate::{MathError, MathResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exact decimal number.
///
/// `Dec` is an immutable value: every arithmetic operation returns a new
/// `Dec`, so a weight read from one record can never be changed through a
/// tally that borrowed it. Values serialize as their canonical string form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dec(Decimal);

impl Dec {
    pub const ZERO: Dec = Dec(Decimal::ZERO);
    pub const ONE: Dec = Dec(Decimal::ONE);

    /// Parse a decimal string. Accepts plain (`"1.5"`, `"-3"`) and
    /// scientific (`"15e-1"`) notation. Rejects infinities, NaN, empty
    /// input, surrounding whitespace and digit separators.
    pub fn parse(input: &str) -> MathResult<Dec> {
        let invalid = |reason: &str| MathError::InvalidFormat {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("empty string"));
        }
        if input.chars().any(|c| c.is_whitespace() || c == '_') {
            return Err(invalid("unexpected character"));
        }

        let parsed = if input.contains(['e', 'E']) {
            Decimal::from_scientific(input)
        } else {
            Decimal::from_str_exact(input)
        };

        parsed
            .map(|d| Dec(d.normalize()))
            .map_err(|e| invalid(&e.to_string()))
    }

    /// Parse a decimal that must be `>= 0`.
    pub fn parse_non_negative(input: &str) -> MathResult<Dec> {
        let dec = Self::parse(input)?;
        if dec.is_negative() {
            return Err(MathError::Negative(input.to_string()));
        }
        Ok(dec)
    }

    /// Parse a decimal that must be `> 0`.
    pub fn parse_positive(input: &str) -> MathResult<Dec> {
        let dec = Self::parse(input)?;
        if !dec.is_positive() {
            return Err(MathError::NonPositive(input.to_string()));
        }
        Ok(dec)
    }

    pub fn from_u64(value: u64) -> Dec {
        Dec(Decimal::from(value))
    }

    /// Exact addition. Fails with [`MathError::Overflow`] when the sum does
    /// not fit the available precision instead of rounding it.
    pub fn checked_add(self, other: Dec) -> MathResult<Dec> {
        exact(self.0, other.0, self.0.checked_add(other.0), "add")
    }

    /// Exact subtraction, see [`Dec::checked_add`].
    pub fn checked_sub(self, other: Dec) -> MathResult<Dec> {
        exact(self.0, other.0, self.0.checked_sub(other.0), "sub")
    }

    /// Subtract `other`, failing when the result would drop below zero.
    pub fn sub_non_negative(self, other: Dec) -> MathResult<Dec> {
        let result = self.checked_sub(other)?;
        if result.is_negative() {
            return Err(MathError::WouldBeNegative {
                minuend: self.to_string(),
                subtrahend: other.to_string(),
            });
        }
        Ok(result)
    }

    /// Divide by `other`, rounding to the widest precision available.
    pub fn checked_div(self, other: Dec) -> MathResult<Dec> {
        if other.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        self.0
            .checked_div(other.0)
            .map(|d| Dec(d.normalize()))
            .ok_or(MathError::Overflow("div"))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

/// Accept `result` only if it kept the scale of the finer operand.
/// `rust_decimal` drops fractional digits when a sum or difference needs
/// more than 96 bits of mantissa at that scale.
fn exact(
    a: Decimal,
    b: Decimal,
    result: Option<Decimal>,
    op: &'static str,
) -> MathResult<Dec> {
    match result {
        Some(d) if d.scale() == a.scale().max(b.scale()) => Ok(Dec(d.normalize())),
        _ => Err(MathError::Overflow(op)),
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Dec {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dec::parse(s)
    }
}

impl TryFrom<String> for Dec {
    type Error = MathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dec::parse(&value)
    }
}

impl From<Dec> for String {
    fn from(value: Dec) -> Self {
        value.to_string()
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Dec::from_u64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Dec {
        Dec::parse(s).unwrap()
    }

    #[test]
    fn test_parse_plain_and_scientific() {
        assert_eq!(dec("1.5"), dec("15e-1"));
        assert_eq!(dec("100"), dec("1E2"));
        assert_eq!(dec("-0.25").to_string(), "-0.25");
        assert_eq!(dec("2.500").to_string(), "2.5");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", " 1", "1 ", "abc", "1_000", "inf", "NaN", "1.2.3", "--1"] {
            let err = Dec::parse(input).unwrap_err();
            assert!(
                matches!(err, MathError::InvalidFormat { .. }),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let z = dec("-0");
        assert!(z.is_zero());
        assert!(!z.is_negative());
        assert_eq!(z.to_string(), "0");
        assert!(Dec::parse_non_negative("-0.000").is_ok());
    }

    #[test]
    fn test_parse_non_negative_and_positive() {
        assert_eq!(
            Dec::parse_non_negative("-1"),
            Err(MathError::Negative("-1".into()))
        );
        assert!(Dec::parse_non_negative("0").is_ok());
        assert_eq!(
            Dec::parse_positive("0"),
            Err(MathError::NonPositive("0".into()))
        );
        assert!(Dec::parse_positive("0.0001").is_ok());
    }

    #[test]
    fn test_sub_non_negative() {
        assert_eq!(dec("3").sub_non_negative(dec("1.5")).unwrap(), dec("1.5"));
        assert_eq!(dec("3").sub_non_negative(dec("3")).unwrap(), Dec::ZERO);
        assert!(matches!(
            dec("1").sub_non_negative(dec("1.01")),
            Err(MathError::WouldBeNegative { .. })
        ));
    }

    #[test]
    fn test_div() {
        assert_eq!(dec("1").checked_div(dec("4")).unwrap(), dec("0.25"));
        assert_eq!(
            dec("1").checked_div(Dec::ZERO),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let max = Dec(Decimal::MAX);
        assert_eq!(max.checked_add(Dec::ONE), Err(MathError::Overflow("add")));
    }

    #[test]
    fn test_add_never_rounds() {
        let whale = dec("1000000000000000000000000000");
        let minnow = dec("0.01");
        assert_eq!(whale.checked_add(minnow), Err(MathError::Overflow("add")));
        assert_eq!(minnow.checked_add(whale), Err(MathError::Overflow("add")));
        assert_eq!(whale.checked_sub(minnow), Err(MathError::Overflow("sub")));
    }

    #[test]
    fn test_add_at_precision_limit() {
        // 29 significant digits still fit in the 96-bit mantissa.
        let sum = dec("100000000000000000000000000")
            .checked_add(dec("0.01"))
            .unwrap();
        assert_eq!(sum, dec("100000000000000000000000000.01"));
        assert_eq!(sum.checked_sub(dec("0.01")).unwrap(), dec("1e26"));

        let nines = dec("9999999999999999999999999999");
        assert_eq!(nines.checked_add(Dec::ONE).unwrap(), dec("1e28"));
        assert_eq!(
            nines.checked_add(dec("0.1")),
            Err(MathError::Overflow("add"))
        );
    }

    #[test]
    fn test_arithmetic_does_not_alias() {
        let weight = dec("2");
        let total = weight.checked_add(dec("3")).unwrap();
        assert_eq!(weight, dec("2"));
        assert_eq!(total, dec("5"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&dec("1.25")).unwrap();
        assert_eq!(json, "\"1.25\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dec("1.25"));
        assert!(serde_json::from_str::<Dec>("\"nope\"").is_err());
    }

    fn arb_dec() -> impl Strategy<Value = Dec> {
        let small = (any::<i64>(), 0u32..10)
            .prop_map(|(mantissa, scale)| Dec(Decimal::new(mantissa, scale).normalize()));
        let wide = (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28).prop_map(
            |(lo, mid, hi, negative, scale)| {
                Dec(Decimal::from_parts(lo, mid, hi, negative, scale).normalize())
            },
        );
        prop_oneof![small, wide]
    }

    proptest! {
        #[test]
        fn display_parses_back(d in arb_dec()) {
            prop_assert_eq!(Dec::parse(&d.to_string()).unwrap(), d);
        }

        #[test]
        fn add_then_sub_is_identity(a in arb_dec(), b in arb_dec()) {
            if let Ok(sum) = a.checked_add(b) {
                if let Ok(back) = sum.checked_sub(b) {
                    prop_assert_eq!(back, a);
                }
            }
        }

        #[test]
        fn sub_then_add_is_identity(a in arb_dec(), b in arb_dec()) {
            if let Ok(diff) = a.checked_sub(b) {
                if let Ok(back) = diff.checked_add(b) {
                    prop_assert_eq!(back, a);
                }
            }
        }

        #[test]
        fn add_is_commutative(a in arb_dec(), b in arb_dec()) {
            prop_assert_eq!(a.checked_add(b), b.checked_add(a));
        }

        #[test]
        fn cmp_is_antisymmetric(a in arb_dec(), b in arb_dec()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn add_matches_integer_sum(m1 in any::<i64>(), m2 in any::<i64>(), scale in 0u32..=28) {
            let a = Dec(Decimal::new(m1, scale).normalize());
            let b = Dec(Decimal::new(m2, scale).normalize());
            let expected = Decimal::from_i128_with_scale(i128::from(m1) + i128::from(m2), scale);
            prop_assert_eq!(a.checked_add(b).unwrap().as_decimal(), expected);
        }

        #[test]
        fn sub_non_negative_never_goes_below_zero(a in arb_dec(), b in arb_dec()) {
            match a.sub_non_negative(b) {
                Ok(r) => prop_assert!(!r.is_negative()),
                Err(MathError::WouldBeNegative { .. }) => prop_assert!(a < b),
                Err(e) => prop_assert_eq!(e, MathError::Overflow("sub")),
            }
        }
    }
}
