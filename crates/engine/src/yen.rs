use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use crate::EngineError;

/// Signed yen amount.
///
/// The yen has no minor unit, so the value is a plain integer:
/// - positive = income / gain
/// - negative = expense
///
/// # Examples
///
/// ```rust
/// use engine::Yen;
///
/// assert_eq!(Yen::new(1234).format_signed(), "+1,234円");
/// assert_eq!("-1,500円".parse::<Yen>().unwrap(), Yen::new(-1500));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Yen(i64);

impl Yen {
    pub const ZERO: Yen = Yen(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Yen) -> Option<Yen> {
        self.0.checked_add(rhs.0).map(Yen)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Yen) -> Option<Yen> {
        self.0.checked_sub(rhs.0).map(Yen)
    }

    /// Formats the amount the way a Japanese locale does with the sign
    /// always shown except for zero: `+1,234円`, `-500円`, `0円`.
    #[must_use]
    pub fn format_signed(self) -> String {
        let sign = match self.0 {
            v if v > 0 => "+",
            v if v < 0 => "-",
            _ => "",
        };
        format!("{sign}{}円", group_thousands(self.0.unsigned_abs()))
    }

    /// Formats the absolute amount, without sign: `1,234円`.
    #[must_use]
    pub fn format_plain(self) -> String {
        format!("{}円", group_thousands(self.0.unsigned_abs()))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Yen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Yen {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Yen> for i64 {
    fn from(value: Yen) -> Self {
        value.0
    }
}

impl Add for Yen {
    type Output = Yen;

    fn add(self, rhs: Yen) -> Self::Output {
        Yen(self.0 + rhs.0)
    }
}

impl AddAssign for Yen {
    fn add_assign(&mut self, rhs: Yen) {
        self.0 += rhs.0;
    }
}

impl Sub for Yen {
    type Output = Yen;

    fn sub(self, rhs: Yen) -> Self::Output {
        Yen(self.0 - rhs.0)
    }
}

impl Neg for Yen {
    type Output = Yen;

    fn neg(self) -> Self::Output {
        Yen(-self.0)
    }
}

impl FromStr for Yen {
    type Err = EngineError;

    /// Parses user input into yen.
    ///
    /// Accepts an optional leading `+`/`-`, an optional `¥`/`￥` prefix or
    /// `円` suffix, and `,` thousands separators. Decimals are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("\"{}\" is not a yen amount", s.trim()));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest
            .trim()
            .trim_start_matches(['¥', '￥'])
            .trim_end_matches('円')
            .trim();
        if rest.is_empty() {
            return Err(empty());
        }
        if rest.starts_with(',') || rest.ends_with(',') || rest.contains(",,") {
            return Err(invalid());
        }

        let digits: String = rest.chars().filter(|c| *c != ',').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let value: i64 = digits.parse().map_err(|_| overflow())?;
        Ok(Yen(if negative { -value } else { value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_signed_matches_locale_except_zero() {
        assert_eq!(Yen::new(0).format_signed(), "0円");
        assert_eq!(Yen::new(5).format_signed(), "+5円");
        assert_eq!(Yen::new(-500).format_signed(), "-500円");
        assert_eq!(Yen::new(1234).format_signed(), "+1,234円");
        assert_eq!(Yen::new(-1_234_567).format_signed(), "-1,234,567円");
        assert_eq!(Yen::new(100_000).format_plain(), "100,000円");
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Yen::new(2).checked_add(Yen::new(3)), Some(Yen::new(5)));
        assert_eq!(Yen::new(i64::MAX).checked_add(Yen::new(1)), None);
        assert_eq!(Yen::new(i64::MIN).checked_sub(Yen::new(1)), None);
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!("1200".parse::<Yen>().unwrap(), Yen::new(1200));
        assert_eq!(" 1,200円 ".parse::<Yen>().unwrap(), Yen::new(1200));
        assert_eq!("￥3,000".parse::<Yen>().unwrap(), Yen::new(3000));
        assert_eq!("-15".parse::<Yen>().unwrap(), Yen::new(-15));
        assert_eq!("+7".parse::<Yen>().unwrap(), Yen::new(7));
    }

    #[test]
    fn parse_rejects_decimals_and_garbage() {
        assert!("12.5".parse::<Yen>().is_err());
        assert!("abc".parse::<Yen>().is_err());
        assert!("1,,000".parse::<Yen>().is_err());
        assert!(",100".parse::<Yen>().is_err());
        assert_eq!(
            "".parse::<Yen>().unwrap_err(),
            EngineError::InvalidAmount("empty amount".to_string())
        );
    }
}
