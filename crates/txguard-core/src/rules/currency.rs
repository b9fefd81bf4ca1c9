//! Currency rule: the currency must be an ISO 4217 alphabetic code.
//!
//! Lookup is a plain set membership test and never fails; an unknown or
//! malformed code is a validation failure, not a fault.

use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::record::fields::CURRENCY;
use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

lazy_static! {
    /// Active ISO 4217 alphabetic codes, including funds and precious-metal codes.
    static ref ISO_4217_CODES: HashSet<&'static str> = [
        "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN",
        "BAM", "BBD", "BDT", "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BOV",
        "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD", "CDF", "CHE", "CHF",
        "CHW", "CLF", "CLP", "CNY", "COP", "COU", "CRC", "CUC", "CUP", "CVE",
        "CZK", "DJF", "DKK", "DOP", "DZD", "EGP", "ERN", "ETB", "EUR", "FJD",
        "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ", "GYD", "HKD",
        "HNL", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD",
        "JOD", "JPY", "KES", "KGS", "KHR", "KMF", "KPW", "KRW", "KWD", "KYD",
        "KZT", "LAK", "LBP", "LKR", "LRD", "LSL", "LYD", "MAD", "MDL", "MGA",
        "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR", "MWK", "MXN", "MXV",
        "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB",
        "PEN", "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB",
        "RWF", "SAR", "SBD", "SCR", "SDG", "SEK", "SGD", "SHP", "SLE", "SLL",
        "SOS", "SRD", "SSP", "STN", "SVC", "SYP", "SZL", "THB", "TJS", "TMT",
        "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "USN",
        "UYI", "UYU", "UYW", "UZS", "VED", "VES", "VND", "VUV", "WST", "XAF",
        "XAG", "XAU", "XBA", "XBB", "XBC", "XBD", "XCD", "XCG", "XDR", "XOF",
        "XPD", "XPF", "XPT", "XSU", "XTS", "XUA", "XXX", "YER", "ZAR", "ZMW",
        "ZWG", "ZWL",
    ]
    .into_iter()
    .collect();
}

/// Whether `code` is a recognised ISO 4217 alphabetic code (case-sensitive).
pub fn is_valid_currency(code: &str) -> bool {
    ISO_4217_CODES.contains(code)
}

/// The currency rule.
pub struct CurrencyRule;

impl CurrencyRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrencyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CurrencyRule {
    fn id(&self) -> RuleId {
        RuleId::Currency
    }

    fn description(&self) -> &'static str {
        "Currency is a valid ISO 4217 code"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        let valid = ctx.record.text(CURRENCY).is_some_and(is_valid_currency);

        if !valid {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Currency should be a valid ISO 4217 currency code",
                "Action: Ensure the currency code is valid and follows ISO 4217 standards.",
                2,
            )]);
        }

        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::rules::testing::run;

    #[test]
    fn test_known_codes() {
        for code in ["USD", "EUR", "JPY", "GBP", "INR", "XAU"] {
            assert!(is_valid_currency(code), "{}", code);
        }
    }

    #[test]
    fn test_unknown_codes_never_panic() {
        for code in ["", "US", "USDD", "usd", "ABC", "€", "12$"] {
            assert!(!is_valid_currency(code), "{}", code);
        }
    }

    #[test]
    fn test_valid_currency_passes() {
        let record = Record::new().with(CURRENCY, " USD ");
        assert!(run(&CurrencyRule::new(), &record).unwrap().is_empty());
    }

    #[test]
    fn test_missing_currency() {
        let findings = run(&CurrencyRule::new(), &Record::new()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score_delta, 2);
    }

    #[test]
    fn test_non_text_currency_is_a_violation() {
        let record = Record::new().with(CURRENCY, 840i64);
        let findings = run(&CurrencyRule::new(), &record).unwrap();
        assert_eq!(findings.len(), 1);
    }
}
