//! Exact rationals over ℚ ∪ {±∞}.
//!
//! Backed by [`num_rational::BigRational`] rather than a hand-rolled
//! numerator/denominator pair: reduction to lowest terms, `gcd`, and the
//! arithmetic operator overloads all come from the crate, which is exactly
//! the ecosystem-standard representation for arbitrary-precision exact
//! fractions.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::errors::RationalError;

/// A rational number, or one of the two sentinels `+∞`/`-∞`.
///
/// The three-variant shape gives a total order for free via the derived
/// `Ord`: `NegInfinity < Finite(_) < PosInfinity`, with `Finite` ordering by
/// its underlying `BigRational`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rational {
    NegInfinity,
    Finite(BigRational),
    PosInfinity,
}

impl Rational {
    /// A small positive rational used as a last-resort nudge by the delay
    /// solver when no simpler strictly-interior witness exists.
    pub fn epsilon() -> Rational {
        Rational::from_ratio(1, 1_000_000_000)
    }

    pub fn zero() -> Rational {
        Rational::Finite(BigRational::zero())
    }

    pub fn from_integer(n: i64) -> Rational {
        Rational::Finite(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn from_ratio(num: i64, den: i64) -> Rational {
        Rational::Finite(BigRational::new(BigInt::from(num), BigInt::from(den)))
    }

    pub fn pos_infinity() -> Rational {
        Rational::PosInfinity
    }

    pub fn neg_infinity() -> Rational {
        Rational::NegInfinity
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Rational::Finite(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Rational::Finite(r) if r.is_zero())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Rational::NegInfinity => true,
            Rational::Finite(r) => r.is_negative(),
            Rational::PosInfinity => false,
        }
    }

    /// `true` iff this rational is finite with denominator 1.
    pub fn is_integer(&self) -> bool {
        match self {
            Rational::Finite(r) => r.is_integer(),
            _ => false,
        }
    }

    /// Greatest integer `<=` this value. Defined only on finite values.
    pub fn floor(&self) -> Result<BigInt, RationalError> {
        match self {
            Rational::Finite(r) => Ok(r.floor().to_integer()),
            _ => Err(RationalError::NotFinite),
        }
    }

    /// `self - floor(self)`, in `[0, 1)`. Defined only on finite values.
    pub fn frac(&self) -> Result<Rational, RationalError> {
        match self {
            Rational::Finite(r) => {
                let floor = r.floor();
                Ok(Rational::Finite(r - floor))
            }
            _ => Err(RationalError::NotFinite),
        }
    }

    pub fn neg(&self) -> Rational {
        match self {
            Rational::NegInfinity => Rational::PosInfinity,
            Rational::Finite(r) => Rational::Finite(-r.clone()),
            Rational::PosInfinity => Rational::NegInfinity,
        }
    }

    pub fn checked_add(&self, other: &Rational) -> Result<Rational, RationalError> {
        use Rational::*;
        match (self, other) {
            (Finite(a), Finite(b)) => Ok(Finite(a + b)),
            (PosInfinity, NegInfinity) | (NegInfinity, PosInfinity) => {
                Err(RationalError::InfinityMinusInfinity)
            }
            (PosInfinity, _) | (_, PosInfinity) => Ok(PosInfinity),
            (NegInfinity, _) | (_, NegInfinity) => Ok(NegInfinity),
        }
    }

    pub fn checked_sub(&self, other: &Rational) -> Result<Rational, RationalError> {
        self.checked_add(&other.neg())
    }

    pub fn checked_mul(&self, other: &Rational) -> Result<Rational, RationalError> {
        use Rational::*;
        match (self, other) {
            (Finite(a), Finite(b)) => Ok(Finite(a * b)),
            (inf @ (PosInfinity | NegInfinity), Finite(f))
            | (Finite(f), inf @ (PosInfinity | NegInfinity)) => {
                if f.is_zero() {
                    Err(RationalError::ZeroOverZero)
                } else if f.is_negative() {
                    Ok(inf.neg())
                } else {
                    Ok(inf.clone())
                }
            }
            (PosInfinity, PosInfinity) | (NegInfinity, NegInfinity) => Ok(PosInfinity),
            (PosInfinity, NegInfinity) | (NegInfinity, PosInfinity) => Ok(NegInfinity),
        }
    }

    pub fn checked_div(&self, other: &Rational) -> Result<Rational, RationalError> {
        use Rational::*;
        match (self, other) {
            (Finite(a), Finite(b)) => {
                if b.is_zero() {
                    if a.is_zero() {
                        Err(RationalError::ZeroOverZero)
                    } else if a.is_negative() {
                        Ok(NegInfinity)
                    } else {
                        Ok(PosInfinity)
                    }
                } else {
                    Ok(Finite(a / b))
                }
            }
            (Finite(_), PosInfinity | NegInfinity) => Ok(Rational::zero()),
            (inf @ (PosInfinity | NegInfinity), Finite(f)) => {
                if f.is_zero() {
                    Err(RationalError::ZeroOverZero)
                } else if f.is_negative() {
                    Ok(inf.neg())
                } else {
                    Ok(inf.clone())
                }
            }
            (PosInfinity | NegInfinity, PosInfinity | NegInfinity) => {
                Err(RationalError::InfinityMinusInfinity)
            }
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rational::NegInfinity => write!(f, "-inf"),
            Rational::Finite(r) if r.is_integer() => write!(f, "{}", r.to_integer()),
            Rational::Finite(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Rational::PosInfinity => write!(f, "+inf"),
        }
    }
}

// Operator overloads panic on the two algebraically-undefined cases, mirroring
// the way `std::ops` impls on checked-arithmetic-free numeric wrappers behave;
// call the `checked_*` methods directly when infallibility isn't guaranteed by
// the caller's context.
impl Add for &Rational {
    type Output = Rational;
    fn add(self, rhs: Self) -> Rational {
        self.checked_add(rhs).expect("invalid rational addition")
    }
}

impl Sub for &Rational {
    type Output = Rational;
    fn sub(self, rhs: Self) -> Rational {
        self.checked_sub(rhs)
            .expect("invalid rational subtraction")
    }
}

impl Mul for &Rational {
    type Output = Rational;
    fn mul(self, rhs: Self) -> Rational {
        self.checked_mul(rhs)
            .expect("invalid rational multiplication")
    }
}

impl Div for &Rational {
    type Output = Rational;
    fn div(self, rhs: Self) -> Rational {
        self.checked_div(rhs).expect("invalid rational division")
    }
}

impl Neg for &Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational::neg(self)
    }
}

impl PartialOrd<Rational> for &Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        (*self).partial_cmp(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_finite(n: i64, d: i64) -> Rational {
        Rational::from_ratio(n, d.max(1))
    }

    #[test]
    fn integer_and_frac() {
        let r = Rational::from_ratio(7, 2);
        assert!(!r.is_integer());
        assert_eq!(r.floor().unwrap(), BigInt::from(3));
        assert_eq!(r.frac().unwrap(), Rational::from_ratio(1, 2));
    }

    #[test]
    fn infinity_rules() {
        let x = Rational::from_integer(5);
        assert_eq!(
            x.checked_add(&Rational::pos_infinity()).unwrap(),
            Rational::pos_infinity()
        );
        assert!(Rational::pos_infinity()
            .checked_add(&Rational::neg_infinity())
            .is_err());
        assert!(Rational::neg_infinity() < Rational::from_integer(-1_000_000));
        assert!(Rational::from_integer(1_000_000) < Rational::pos_infinity());
    }

    #[test]
    fn zero_over_zero_fails() {
        assert!(Rational::zero().checked_div(&Rational::zero()).is_err());
    }

    proptest! {
        #[test]
        fn add_commutes(an in -1000i64..1000, ad in 1i64..50, bn in -1000i64..1000, bd in 1i64..50) {
            let a = small_finite(an, ad);
            let b = small_finite(bn, bd);
            prop_assert_eq!(a.checked_add(&b).unwrap(), b.checked_add(&a).unwrap());
        }

        #[test]
        fn add_associates(an in -200i64..200, bn in -200i64..200, cn in -200i64..200) {
            let a = small_finite(an, 3);
            let b = small_finite(bn, 5);
            let c = small_finite(cn, 7);
            let lhs = a.checked_add(&b).unwrap().checked_add(&c).unwrap();
            let rhs = a.checked_add(&b.checked_add(&c).unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn mul_distributes_over_add(an in -50i64..50, bn in -50i64..50, cn in -50i64..50) {
            let a = small_finite(an, 3);
            let b = small_finite(bn, 5);
            let c = small_finite(cn, 7);
            let lhs = a.checked_mul(&b.checked_add(&c).unwrap()).unwrap();
            let rhs = a.checked_mul(&b).unwrap().checked_add(&a.checked_mul(&c).unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn mul_inverse(an in 1i64..50) {
            let a = small_finite(an, 3);
            let inv = Rational::from_ratio(3, an);
            let prod = a.checked_mul(&inv).unwrap();
            prop_assert_eq!(prod, Rational::from_integer(1));
        }
    }
}
