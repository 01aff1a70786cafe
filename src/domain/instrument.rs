use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Card-issuing network, inferred from the number's leading digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brand {
    Visa,
    Mastercard,
    AmericanExpress,
    Discover,
    Jcb,
    DinersClub,
    Maestro,
    Hipercard,
    Elo,
    Unknown,
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Brand::Visa => "Visa",
            Brand::Mastercard => "Mastercard",
            Brand::AmericanExpress => "American Express",
            Brand::Discover => "Discover",
            Brand::Jcb => "JCB",
            Brand::DinersClub => "Diners Club",
            Brand::Maestro => "Maestro",
            Brand::Hipercard => "Hipercard",
            Brand::Elo => "Elo",
            Brand::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

// Precedence-ordered: the first matching pattern wins. Do not reorder.
static BRAND_PATTERNS: LazyLock<Vec<(Regex, Brand)>> = LazyLock::new(|| {
    [
        (r"^4", Brand::Visa),
        (r"^5[1-5]", Brand::Mastercard),
        (r"^3[47]", Brand::AmericanExpress),
        (r"^6(?:011|5)", Brand::Discover),
        (r"^35", Brand::Jcb),
        (r"^(?:2131|1800|35)", Brand::Jcb),
        (r"^3(?:0[0-5]|[68])", Brand::DinersClub),
        (
            r"^(?:5018|5020|5038|5893|6304|6759|6761|6762|6763)",
            Brand::Maestro,
        ),
        (r"^(?:606282|3841)", Brand::Hipercard),
        (r"^636368", Brand::Elo),
    ]
    .into_iter()
    .map(|(pattern, brand)| (Regex::new(pattern).expect("invalid brand pattern"), brand))
    .collect()
});

fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Luhn checksum over a digit string: doubling every second digit from the
/// right, subtracting 9 from doubled values above 9, total must be 0 mod 10.
fn luhn(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, byte) in digits.bytes().rev().enumerate() {
        let mut digit = u32::from(byte - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

/// Validates a card number: 13 to 19 digits (whitespace ignored) passing the
/// Luhn checksum.
pub fn validate_card_number(raw: &str) -> bool {
    let cleaned = strip_whitespace(raw);
    if cleaned.len() < 13 || cleaned.len() > 19 {
        return false;
    }
    if !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn(&cleaned)
}

/// Classifies a card number by its digit prefix.
pub fn detect_brand(raw: &str) -> Brand {
    let cleaned = strip_whitespace(raw);
    BRAND_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&cleaned))
        .map(|(_, brand)| *brand)
        .unwrap_or(Brand::Unknown)
}

/// Validates an expiry against `today`. A card expiring exactly in the
/// current month is still valid.
pub fn validate_expiry(month: u8, year: u8, today: NaiveDate) -> bool {
    if !(1..=12).contains(&month) {
        return false;
    }
    let current_year = (today.year().rem_euclid(100)) as u8;
    let current_month = today.month() as u8;
    if year < current_year {
        return false;
    }
    if year == current_year && month < current_month {
        return false;
    }
    true
}

/// Validates a security code: exactly 3 or 4 digits, nothing else.
pub fn validate_security_code(raw: &str) -> bool {
    (raw.len() == 3 || raw.len() == 4) && raw.bytes().all(|b| b.is_ascii_digit())
}

/// Validates the 11-digit national taxpayer id: non-digits are stripped,
/// all-identical sequences are rejected, and both weighted check digits
/// (positions 9 and 10) must match.
pub fn validate_national_id(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }
    check_digit(&digits[..9], 10) == digits[9] && check_digit(&digits[..10], 11) == digits[10]
}

// Weighted sum with weights counting down from `first_weight` to 2, then
// `11 - (sum % 11)`, mapped to 0 when the result reaches 10.
fn check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let digit = 11 - (sum % 11);
    if digit >= 10 { 0 } else { digit }
}

/// Groups digits in blocks of four, capped at 16 digits worth of output.
pub fn format_card_number(raw: &str) -> String {
    let cleaned = strip_non_digits(raw);
    let mut out = String::with_capacity(cleaned.len() + cleaned.len() / 4);
    for (i, c) in cleaned.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out.truncate(19);
    out
}

/// Renders expiry digits as `MM/YY`, truncating overflow input.
pub fn format_expiry(raw: &str) -> String {
    let cleaned = strip_non_digits(raw);
    if cleaned.len() >= 2 {
        let year_end = cleaned.len().min(4);
        format!("{}/{}", &cleaned[..2], &cleaned[2..year_end])
    } else {
        cleaned
    }
}

/// Renders a national id as `XXX.XXX.XXX-XX`, truncating overflow input.
pub fn format_national_id(raw: &str) -> String {
    let cleaned = strip_non_digits(raw);
    let mut out = String::with_capacity(cleaned.len() + 3);
    for (i, c) in cleaned.chars().enumerate() {
        match i {
            3 | 6 => out.push('.'),
            9 => out.push('-'),
            _ => {}
        }
        out.push(c);
    }
    out.truncate(14);
    out
}

/// The five independently validated instrument fields, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentField {
    CardNumber,
    CardholderName,
    Expiry,
    SecurityCode,
    NationalId,
}

impl InstrumentField {
    pub const ALL: [InstrumentField; 5] = [
        InstrumentField::CardNumber,
        InstrumentField::CardholderName,
        InstrumentField::Expiry,
        InstrumentField::SecurityCode,
        InstrumentField::NationalId,
    ];
}

impl fmt::Display for InstrumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstrumentField::CardNumber => "card number",
            InstrumentField::CardholderName => "cardholder name",
            InstrumentField::Expiry => "expiry date",
            InstrumentField::SecurityCode => "security code",
            InstrumentField::NationalId => "national id",
        };
        write!(f, "{}", name)
    }
}

/// A payment instrument as entered in the checkout form.
///
/// The instrument is "valid" only when all five field checks pass; each
/// field has its own independent pass/fail and there is no partial validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstrument {
    pub card_number: String,
    pub cardholder_name: String,
    pub expiry_month: u8,
    pub expiry_year: u8,
    pub security_code: String,
    pub national_id: String,
}

impl PaymentInstrument {
    pub fn check_field(&self, field: InstrumentField, today: NaiveDate) -> bool {
        match field {
            InstrumentField::CardNumber => validate_card_number(&self.card_number),
            InstrumentField::CardholderName => !self.cardholder_name.trim().is_empty(),
            InstrumentField::Expiry => {
                validate_expiry(self.expiry_month, self.expiry_year, today)
            }
            InstrumentField::SecurityCode => validate_security_code(&self.security_code),
            InstrumentField::NationalId => validate_national_id(&self.national_id),
        }
    }

    /// First failing field in check order, if any.
    pub fn first_invalid_field(&self, today: NaiveDate) -> Option<InstrumentField> {
        InstrumentField::ALL
            .into_iter()
            .find(|field| !self.check_field(*field, today))
    }

    /// Pass/fail for every field, in check order. This is the per-keystroke
    /// contract the checkout form renders from.
    pub fn field_report(&self, today: NaiveDate) -> Vec<(InstrumentField, bool)> {
        InstrumentField::ALL
            .into_iter()
            .map(|field| (field, self.check_field(field, today)))
            .collect()
    }

    pub fn brand(&self) -> Brand {
        detect_brand(&self.card_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_instrument() -> PaymentInstrument {
        PaymentInstrument {
            card_number: "4532015112830366".to_string(),
            cardholder_name: "Maria Silva".to_string(),
            expiry_month: 12,
            expiry_year: 30,
            security_code: "123".to_string(),
            national_id: "52998224725".to_string(),
        }
    }

    #[test]
    fn test_luhn_valid_vectors() {
        assert!(validate_card_number("4532015112830366"));
        assert!(validate_card_number("5425233430109903"));
        // Whitespace is ignored
        assert!(validate_card_number("4532 0151 1283 0366"));
    }

    #[test]
    fn test_luhn_checksum_failure() {
        assert!(!validate_card_number("4532015112830367"));
    }

    #[test]
    fn test_card_number_shape() {
        assert!(!validate_card_number("453201511283")); // 12 digits
        assert!(!validate_card_number("45320151128303661234")); // 20 digits
        assert!(!validate_card_number("4532o15112830366")); // non-digit
        assert!(!validate_card_number(""));
    }

    #[test]
    fn test_brand_detection() {
        assert_eq!(detect_brand("4532015112830366"), Brand::Visa);
        assert_eq!(detect_brand("5425233430109903"), Brand::Mastercard);
        assert_eq!(detect_brand("378282246310005"), Brand::AmericanExpress);
        assert_eq!(detect_brand("6011111111111117"), Brand::Discover);
        assert_eq!(detect_brand("3530111333300000"), Brand::Jcb);
        assert_eq!(detect_brand("2131000000000008"), Brand::Jcb);
        assert_eq!(detect_brand("30569309025904"), Brand::DinersClub);
        assert_eq!(detect_brand("6304000000000000"), Brand::Maestro);
        assert_eq!(detect_brand("6062820000000000"), Brand::Hipercard);
        assert_eq!(detect_brand("6363680000000000"), Brand::Elo);
        assert_eq!(detect_brand("9999999999999999"), Brand::Unknown);
    }

    #[test]
    fn test_brand_precedence_first_match_wins() {
        // 5018 falls outside Mastercard's 51-55 range and lands on Maestro
        assert_eq!(detect_brand("5018000000000000"), Brand::Maestro);
        // 51xx stays Mastercard even though Maestro lists other 5-prefixes
        assert_eq!(detect_brand("5120000000000000"), Brand::Mastercard);
        // 35xx hits the earlier JCB entry before Diners Club's 36/38 block
        assert_eq!(detect_brand("3528000000000000"), Brand::Jcb);
    }

    #[test]
    fn test_expiry_boundaries() {
        let today = fixed_today(); // 2024-06
        assert!(validate_expiry(6, 24, today)); // current month is valid
        assert!(!validate_expiry(5, 24, today)); // previous month is expired
        assert!(validate_expiry(6, 25, today)); // next year
        assert!(!validate_expiry(12, 23, today)); // previous year
        assert!(!validate_expiry(0, 25, today));
        assert!(!validate_expiry(13, 25, today));
    }

    #[test]
    fn test_security_code() {
        assert!(validate_security_code("123"));
        assert!(validate_security_code("1234"));
        assert!(!validate_security_code("12"));
        assert!(!validate_security_code("12345"));
        assert!(!validate_security_code("12a"));
        assert!(!validate_security_code(""));
    }

    #[test]
    fn test_national_id_valid() {
        assert!(validate_national_id("52998224725"));
        // Formatting separators are stripped before checking
        assert!(validate_national_id("529.982.247-25"));
    }

    #[test]
    fn test_national_id_rejects_mutation_of_last_digit() {
        assert!(validate_national_id("52998224725"));
        for wrong in ["52998224720", "52998224721", "52998224726", "52998224729"] {
            assert!(!validate_national_id(wrong), "{} should fail", wrong);
        }
    }

    #[test]
    fn test_national_id_rejects_repeated_digits() {
        assert!(!validate_national_id("00000000000"));
        assert!(!validate_national_id("11111111111"));
    }

    #[test]
    fn test_national_id_shape() {
        assert!(!validate_national_id("5299822472")); // 10 digits
        assert!(!validate_national_id("529982247255")); // 12 digits
        assert!(!validate_national_id(""));
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4532015112830366"), "4532 0151 1283 0366");
        assert_eq!(format_card_number("4532"), "4532");
        assert_eq!(format_card_number("45320"), "4532 0");
        // Overflow is truncated, not an error
        assert_eq!(
            format_card_number("45320151128303669999"),
            "4532 0151 1283 0366"
        );
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12/");
        assert_eq!(format_expiry("1225"), "12/25");
        assert_eq!(format_expiry("12/25"), "12/25");
        assert_eq!(format_expiry("122599"), "12/25");
    }

    #[test]
    fn test_format_national_id() {
        assert_eq!(format_national_id("529"), "529");
        assert_eq!(format_national_id("529982"), "529.982");
        assert_eq!(format_national_id("529982247"), "529.982.247");
        assert_eq!(format_national_id("52998224725"), "529.982.247-25");
        assert_eq!(format_national_id("5299822472599"), "529.982.247-25");
    }

    #[test]
    fn test_field_report_flags_each_field_independently() {
        let today = fixed_today();
        let mut instrument = valid_instrument();
        assert!(instrument.first_invalid_field(today).is_none());

        instrument.security_code = "12".to_string();
        instrument.national_id = "11111111111".to_string();
        let report = instrument.field_report(today);
        let failed: Vec<InstrumentField> = report
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(field, _)| field)
            .collect();
        assert_eq!(
            failed,
            vec![InstrumentField::SecurityCode, InstrumentField::NationalId]
        );
    }

    #[test]
    fn test_first_invalid_field_order() {
        let today = fixed_today();
        let mut instrument = valid_instrument();
        instrument.card_number = "1234".to_string();
        instrument.cardholder_name = " ".to_string();
        assert_eq!(
            instrument.first_invalid_field(today),
            Some(InstrumentField::CardNumber)
        );
    }
}
