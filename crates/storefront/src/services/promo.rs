//! Promo codes.

use std::collections::HashMap;

use audie_boutique_core::{Discount, PricingError, ValidationError};

/// Promo codes accepted at checkout, keyed by upper-cased code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoCodes {
    codes: HashMap<String, Discount>,
}

impl PromoCodes {
    /// Register one code.
    #[must_use]
    pub fn with_code(mut self, code: &str, discount: Discount) -> Self {
        self.codes.insert(normalize(code), discount);
        self
    }

    /// Discount for an optional code. No code (or a blank one) means no
    /// discount.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPromoCode`] for a code that is not
    /// configured.
    pub fn resolve(&self, code: Option<&str>) -> Result<Discount, ValidationError> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(Discount::None);
        };
        self.codes
            .get(&normalize(code))
            .copied()
            .ok_or_else(|| ValidationError::UnknownPromoCode(code.to_owned()))
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

impl core::str::FromStr for PromoCodes {
    type Err = PricingError;

    /// Parses `CODE=10%,OTHER=5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut codes = Self::default();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (code, value) = entry
                .split_once('=')
                .ok_or_else(|| PricingError::Unparseable(entry.to_owned()))?;
            if code.trim().is_empty() {
                return Err(PricingError::Unparseable(entry.to_owned()));
            }
            codes = codes.with_code(code, value.parse()?);
        }
        Ok(codes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use audie_boutique_core::Money;

    use super::*;

    #[test]
    fn test_parse_and_resolve() {
        let codes: PromoCodes = "BIENVENUE=10%, noel=5".parse().unwrap();
        assert_eq!(
            codes.resolve(Some("bienvenue")).unwrap(),
            Discount::Percent(Decimal::TEN)
        );
        assert_eq!(
            codes.resolve(Some(" NOEL ")).unwrap(),
            Discount::Fixed(Money::from_cents(500))
        );
        assert_eq!(codes.resolve(None).unwrap(), Discount::None);
        assert_eq!(codes.resolve(Some("  ")).unwrap(), Discount::None);
        assert_eq!(
            codes.resolve(Some("SOLDES")).unwrap_err(),
            ValidationError::UnknownPromoCode("SOLDES".into())
        );
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        assert!("BIENVENUE".parse::<PromoCodes>().is_err());
        assert!("=10%".parse::<PromoCodes>().is_err());
        assert!("X=150%".parse::<PromoCodes>().is_err());
        assert!("X=-3".parse::<PromoCodes>().is_err());
        assert_eq!("".parse::<PromoCodes>().unwrap(), PromoCodes::default());
    }
}
