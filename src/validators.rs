//! Format checks for Mexican HR identifiers.
//!
//! These run before create/update submissions and produce warnings, not
//! hard failures; the backend remains the authority on validity.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_CURP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}\d{6}[HM][A-Z]{5}\d{2}$").unwrap());
static RE_RFC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-ZÑ&]{3,4}\d{6}[A-Z0-9]{3}$").unwrap());
static RE_NSS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{11}$").unwrap());
static RE_CLABE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{18}$").unwrap());
static RE_CUENTA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,20}$").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9\s-]{7,20}$").unwrap());

pub fn is_valid_curp(value: &str) -> bool {
    RE_CURP.is_match(&normalize_upper(value))
}

pub fn is_valid_rfc(value: &str) -> bool {
    RE_RFC.is_match(&normalize_upper(value))
}

pub fn is_valid_nss(value: &str) -> bool {
    RE_NSS.is_match(value.trim())
}

pub fn is_valid_clabe(value: &str) -> bool {
    RE_CLABE.is_match(value.trim())
}

pub fn is_valid_cuenta(value: &str) -> bool {
    RE_CUENTA.is_match(value.trim())
}

pub fn is_valid_phone(value: &str) -> bool {
    RE_PHONE.is_match(value.trim())
}

fn normalize_upper(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Collect format warnings for a submission payload. Only fields that
/// are present and non-empty are checked.
pub fn collect_warnings(payload: &serde_json::Value) -> Vec<String> {
    let mut warnings = Vec::new();

    let checks: &[(&str, fn(&str) -> bool, &str)] = &[
        ("curp", is_valid_curp, "CURP con formato inválido"),
        ("rfc", is_valid_rfc, "RFC con formato inválido"),
        ("nss", is_valid_nss, "NSS debe tener 11 dígitos"),
        ("clabe", is_valid_clabe, "CLABE debe tener 18 dígitos"),
        (
            "cuenta",
            is_valid_cuenta,
            "cuenta bancaria debe tener entre 10 y 20 dígitos",
        ),
        ("telefono", is_valid_phone, "teléfono con formato inválido"),
        ("celular", is_valid_phone, "celular con formato inválido"),
    ];

    for (field, check, message) in checks {
        if let Some(value) = payload.get(*field).and_then(|v| v.as_str()) {
            if !value.trim().is_empty() && !check(value) {
                warnings.push(format!("{}: {}", field, message));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod unit {
        use super::*;

        #[test]
        fn curp_format() {
            assert!(is_valid_curp("GAML900412MDFRRR05"));
            assert!(is_valid_curp("gaml900412mdfrrr05"));
            assert!(!is_valid_curp("GAML900412XDFRRR05")); // sex marker must be H or M
            assert!(!is_valid_curp("GAML900412MDFRRR0"));
        }

        #[test]
        fn rfc_format() {
            assert!(is_valid_rfc("GAML900412AB1"));
            assert!(is_valid_rfc("ÑAME900412AB1"));
            assert!(is_valid_rfc("ABC900412AB1")); // moral person, 3 letters
            assert!(!is_valid_rfc("GA900412AB1"));
            assert!(!is_valid_rfc("GAML90041AB1"));
        }

        #[test]
        fn numeric_identifiers() {
            assert!(is_valid_nss("12345678901"));
            assert!(!is_valid_nss("1234567890"));

            assert!(is_valid_clabe("123456789012345678"));
            assert!(!is_valid_clabe("12345678901234567"));

            assert!(is_valid_cuenta("1234567890"));
            assert!(is_valid_cuenta("12345678901234567890"));
            assert!(!is_valid_cuenta("123456789"));
        }

        #[test]
        fn phone_format() {
            assert!(is_valid_phone("555-010-2030"));
            assert!(is_valid_phone("+52 55 1234 5678"));
            assert!(!is_valid_phone("123"));
            assert!(!is_valid_phone("llámame"));
        }

        #[test]
        fn warnings_skip_absent_and_empty_fields() {
            let warnings = collect_warnings(&json!({
                "nombres": "María",
                "curp": "",
            }));
            assert!(warnings.is_empty());
        }

        #[test]
        fn warnings_name_the_offending_field() {
            let warnings = collect_warnings(&json!({
                "curp": "not-a-curp",
                "nss": "12345678901",
                "celular": "x",
            }));
            assert_eq!(warnings.len(), 2);
            assert!(warnings.iter().any(|w| w.starts_with("curp:")));
            assert!(warnings.iter().any(|w| w.starts_with("celular:")));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn nss_accepts_exactly_eleven_digits(digits in "[0-9]{11}") {
                prop_assert!(is_valid_nss(&digits));
            }

            #[test]
            fn clabe_rejects_non_digits(s in "[0-9]{17}[a-zA-Z]") {
                prop_assert!(!is_valid_clabe(&s));
            }
        }
    }
}
