//! Exact rational numbers for price math.
//!
//! Raw token amounts routinely exceed the range an `f64` can represent exactly,
//! and bracket prices must compare exactly on ties, so every price comparison
//! in the crate goes through [`Fraction`].
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FractionError {
    #[error("denominator must not be zero")]
    ZeroDenominator,
    #[error("cannot represent non-finite number {0} as a fraction")]
    NonFinite(f64),
    #[error("negative value {0} cannot be expressed in token units")]
    Negative(String),
    #[error("malformed decimal number '{0}'")]
    Malformed(String),
}

/// A reduced fraction with a strictly positive denominator.
#[derive(Debug, Clone)]
pub struct Fraction {
    numerator: BigInt,
    denominator: BigInt,
}

impl Fraction {
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, FractionError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self::reduced(numerator.into(), denominator))
    }

    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    /// Exact fraction of the shortest decimal rendering of `value`, so `0.1`
    /// becomes `1/10` rather than the binary approximation stored in the float.
    pub fn from_f64(value: f64) -> Result<Self, FractionError> {
        if !value.is_finite() {
            return Err(FractionError::NonFinite(value));
        }
        // `Display` for f64 never uses exponent notation.
        value.to_string().parse()
    }

    /// `10^exponent` as a fraction denominator/numerator building block.
    pub fn pow10(exponent: u32) -> BigInt {
        BigInt::from(10u8).pow(exponent)
    }

    fn reduced(mut numerator: BigInt, mut denominator: BigInt) -> Self {
        if denominator.is_negative() {
            numerator = -numerator;
            denominator = -denominator;
        }
        let gcd = numerator.gcd(&denominator);
        if !gcd.is_one() {
            numerator /= &gcd;
            denominator /= &gcd;
        }
        Self {
            numerator,
            denominator,
        }
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    pub fn abs(&self) -> Self {
        Self {
            numerator: self.numerator.abs(),
            denominator: self.denominator.clone(),
        }
    }

    pub fn inverted(&self) -> Result<Self, FractionError> {
        if self.numerator.is_zero() {
            return Err(FractionError::ZeroDenominator);
        }
        Ok(Self::reduced(self.denominator.clone(), self.numerator.clone()))
    }

    /// Integer token units, truncating any fractional part.
    pub fn to_token_units(&self) -> Result<BigUint, FractionError> {
        if self.is_negative() {
            return Err(FractionError::Negative(self.to_string()));
        }
        let (_, magnitude) = (&self.numerator / &self.denominator).into_parts();
        Ok(magnitude)
    }

    /// Lossy conversion, for display and logging only.
    pub fn to_f64(&self) -> f64 {
        match (self.numerator.to_f64(), self.denominator.to_f64()) {
            (Some(n), Some(d)) => n / d,
            _ => f64::NAN,
        }
    }
}

impl FromStr for Fraction {
    type Err = FractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FractionError::Malformed(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part
            .chars()
            .chain(frac_part.chars())
            .all(|c| c.is_ascii_digit())
        {
            return Err(malformed());
        }

        let mut numerator =
            BigInt::from_str(&format!("{}{}", int_part, frac_part)).map_err(|_| malformed())?;
        if negative {
            numerator = -numerator;
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| malformed())?;
        Fraction::new(numerator, Fraction::pow10(scale))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator.is_one() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplying preserves order.
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl Mul<&Fraction> for &Fraction {
    type Output = Fraction;

    fn mul(self, rhs: &Fraction) -> Fraction {
        Fraction::reduced(
            &self.numerator * &rhs.numerator,
            &self.denominator * &rhs.denominator,
        )
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, rhs: Fraction) -> Fraction {
        &self * &rhs
    }
}

impl Add<&Fraction> for &Fraction {
    type Output = Fraction;

    fn add(self, rhs: &Fraction) -> Fraction {
        Fraction::reduced(
            &self.numerator * &rhs.denominator + &rhs.numerator * &self.denominator,
            &self.denominator * &rhs.denominator,
        )
    }
}

impl Sub<&Fraction> for &Fraction {
    type Output = Fraction;

    fn sub(self, rhs: &Fraction) -> Fraction {
        Fraction::reduced(
            &self.numerator * &rhs.denominator - &rhs.numerator * &self.denominator,
            &self.denominator * &rhs.denominator,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Fraction {
        Fraction::new(n, d).unwrap()
    }

    #[test]
    fn test_new_reduces_and_normalizes_sign() {
        let f = frac(6, -4);
        assert_eq!(f.numerator(), &BigInt::from(-3));
        assert_eq!(f.denominator(), &BigInt::from(2));
        assert_eq!(frac(0, 7).denominator(), &BigInt::one());
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert_eq!(Fraction::new(1, 0), Err(FractionError::ZeroDenominator));
        assert_eq!(frac(0, 3).inverted(), Err(FractionError::ZeroDenominator));
    }

    #[test]
    fn test_from_f64_uses_decimal_rendering() {
        assert_eq!(Fraction::from_f64(0.1).unwrap(), frac(1, 10));
        assert_eq!(Fraction::from_f64(200.0).unwrap(), frac(200, 1));
        assert_eq!(Fraction::from_f64(-2.5).unwrap(), frac(-5, 2));
        assert_eq!(Fraction::from_f64(1e-7).unwrap(), frac(1, 10_000_000));
        assert!(matches!(
            Fraction::from_f64(f64::NAN),
            Err(FractionError::NonFinite(_))
        ));
        assert!(Fraction::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!("12.50".parse::<Fraction>().unwrap(), frac(25, 2));
        assert_eq!(".5".parse::<Fraction>().unwrap(), frac(1, 2));
        assert_eq!("+3".parse::<Fraction>().unwrap(), frac(3, 1));
        assert!("1.2.3".parse::<Fraction>().is_err());
        assert!("abc".parse::<Fraction>().is_err());
        assert!(".".parse::<Fraction>().is_err());
        assert!("".parse::<Fraction>().is_err());
    }

    #[test]
    fn test_ordering_is_exact() {
        assert!(frac(1, 3) < frac(334, 1000));
        assert!(frac(-1, 2) < frac(1, 1_000_000));
        assert_eq!(frac(2, 4), frac(1, 2));
        let huge = Fraction::new(Fraction::pow10(40) + 1, Fraction::pow10(40)).unwrap();
        assert!(huge > Fraction::from_integer(1));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(&frac(1, 2) * &frac(2, 3), frac(1, 3));
        assert_eq!(&frac(1, 2) + &frac(1, 3), frac(5, 6));
        assert_eq!(&frac(1, 2) - &frac(3, 4), frac(-1, 4));
        assert_eq!(frac(-3, 4).abs(), frac(3, 4));
        assert_eq!(frac(-3, 4).inverted().unwrap(), frac(-4, 3));
    }

    #[test]
    fn test_to_token_units_truncates() {
        assert_eq!(frac(7, 2).to_token_units().unwrap(), BigUint::from(3u8));
        assert_eq!(frac(1, 3).to_token_units().unwrap(), BigUint::zero());
        assert!(matches!(
            frac(-7, 2).to_token_units(),
            Err(FractionError::Negative(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(frac(10, 2).to_string(), "5");
        assert_eq!(frac(-1, 3).to_string(), "-1/3");
        assert!((frac(1, 4).to_f64() - 0.25).abs() < f64::EPSILON);
    }
}
