use core::cmp::Ordering;
use core::fmt;
use core::ops::*;
use core::str::FromStr;

use bincode::{Decode, Encode};
use num_integer::Integer;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// `Fraction` represents an exact rational number `numerator / denominator`, both `i64`.
///
/// The denominator is kept positive. Results are not brought to lowest terms unless that is
/// required to fit the representation back into `i64`, so `1/3 + 1/6` is `9/18`. Equality and
/// ordering compare values, not representations.
///
/// Unless otherwise specified, all operations will panic if underflow/overflow.
#[derive(Clone, Copy, Encode, Decode)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Fraction {
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Creates a fraction, panicking on a zero denominator.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self::try_new(numerator, denominator).expect("Zero denominator")
    }

    /// Creates a fraction, or [`None`] if the denominator is zero or the sign cannot be normalized.
    pub fn try_new(numerator: i64, denominator: i64) -> Option<Self> {
        match denominator.cmp(&0) {
            Ordering::Equal => None,
            Ordering::Greater => Some(Self {
                numerator,
                denominator,
            }),
            Ordering::Less => Some(Self {
                numerator: numerator.checked_neg()?,
                denominator: denominator.checked_neg()?,
            }),
        }
    }

    pub fn from_int(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    pub fn percent(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 100,
        }
    }

    pub fn permille(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1000,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    pub fn is_positive(&self) -> bool {
        self.numerator > 0
    }

    /// Brings the fraction to lowest terms.
    pub fn reduce(&self) -> Self {
        let gcd = self.numerator.gcd(&self.denominator);
        if gcd <= 1 {
            return *self;
        }
        Self {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    pub fn checked_neg(&self) -> Option<Self> {
        Some(Self {
            numerator: self.numerator.checked_neg()?,
            denominator: self.denominator,
        })
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        let numerator = (i128::from(self.numerator) * i128::from(other.denominator))
            .checked_add(i128::from(other.numerator) * i128::from(self.denominator))?;
        let denominator = i128::from(self.denominator) * i128::from(other.denominator);
        Self::fit(numerator, denominator)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.checked_add(other.checked_neg()?)
    }

    pub fn checked_mul(&self, other: Self) -> Option<Self> {
        let numerator = i128::from(self.numerator) * i128::from(other.numerator);
        let denominator = i128::from(self.denominator) * i128::from(other.denominator);
        Self::fit_reduced(numerator, denominator)
    }

    pub fn checked_div(&self, other: Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let mut numerator = i128::from(self.numerator) * i128::from(other.denominator);
        let mut denominator = i128::from(self.denominator) * i128::from(other.numerator);
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        Self::fit_reduced(numerator, denominator)
    }

    pub fn checked_mul_int(&self, other: i64) -> Option<Self> {
        self.checked_mul(Self::from_int(other))
    }

    pub fn checked_div_int(&self, other: i64) -> Option<Self> {
        self.checked_div(Self::from_int(other))
    }

    /// Integer part, rounding towards zero.
    pub fn truncate(&self) -> i64 {
        self.numerator / self.denominator
    }

    /// Largest integer not greater than the value.
    pub fn floor(&self) -> i64 {
        Integer::div_floor(&self.numerator, &self.denominator)
    }

    /// Multiplies a non-negative amount by this fraction and rounds the result down.
    ///
    /// Returns [`None`] if the result is negative or does not fit into `u64`.
    pub fn mul_floor(&self, amount: u64) -> Option<u64> {
        let product = i128::from(self.numerator).checked_mul(i128::from(amount))?;
        let result = Integer::div_floor(&product, &i128::from(self.denominator));
        u64::try_from(result).ok()
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    fn fit(numerator: i128, denominator: i128) -> Option<Self> {
        match (i64::try_from(numerator), i64::try_from(denominator)) {
            (Ok(numerator), Ok(denominator)) => Some(Self {
                numerator,
                denominator,
            }),
            _ => Self::fit_reduced(numerator, denominator),
        }
    }

    fn fit_reduced(numerator: i128, denominator: i128) -> Option<Self> {
        let gcd = numerator.gcd(&denominator);
        let (numerator, denominator) = if gcd > 1 {
            (numerator / gcd, denominator / gcd)
        } else {
            (numerator, denominator)
        };
        Some(Self {
            numerator: i64::try_from(numerator).ok()?,
            denominator: i64::try_from(denominator).ok()?,
        })
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * i128::from(other.denominator);
        let rhs = i128::from(other.numerator) * i128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl Add<Fraction> for Fraction {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(other).expect("Overflow")
    }
}

impl Sub<Fraction> for Fraction {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(other).expect("Overflow")
    }
}

impl Mul<Fraction> for Fraction {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.checked_mul(other).expect("Overflow")
    }
}

impl Div<Fraction> for Fraction {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        self.checked_div(other).expect("Overflow")
    }
}

impl Neg for Fraction {
    type Output = Self;

    fn neg(self) -> Self {
        self.checked_neg().expect("Overflow")
    }
}

//========
// text
//========

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFractionError {
    InvalidFormat(String),
    ZeroDenominator,
    Overflow,
}

#[cfg(feature = "std")]
impl std::error::Error for ParseFractionError {}

impl fmt::Display for ParseFractionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn parse_digits(s: &str, allow_sign: bool) -> Option<&str> {
    let digits = match s.strip_prefix('-') {
        Some(rest) if allow_sign => rest,
        Some(_) => return None,
        None => s,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s)
}

fn parse_i64(s: &str) -> Result<i64, ParseFractionError> {
    s.parse::<i64>().map_err(|_| ParseFractionError::Overflow)
}

impl FromStr for Fraction {
    type Err = ParseFractionError;

    /// Accepts `"N%"`, `"N"` and `"N/M"`, where `N` may carry a minus sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseFractionError::InvalidFormat(s.to_string());

        if let Some(percent) = s.strip_suffix('%') {
            let numerator = parse_digits(percent, true).ok_or_else(invalid)?;
            return Ok(Self::percent(parse_i64(numerator)?));
        }

        let (numerator, denominator) = match s.split_once('/') {
            Some((numerator, denominator)) => (
                parse_digits(numerator, true).ok_or_else(invalid)?,
                Some(parse_digits(denominator, false).ok_or_else(invalid)?),
            ),
            None => (parse_digits(s, true).ok_or_else(invalid)?, None),
        };

        let numerator = parse_i64(numerator)?;
        let denominator = match denominator {
            Some(denominator) => parse_i64(denominator)?,
            None => 1,
        };
        Self::try_new(numerator, denominator).ok_or(ParseFractionError::ZeroDenominator)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.denominator {
            1 => write!(f, "{}", self.numerator),
            100 => write!(f, "{}%", self.numerator),
            denominator => write!(f, "{}/{}", self.numerator, denominator),
        }
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}
