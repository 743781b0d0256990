//! Menu rules: featured ranking, prices and taxonomy slugs.

use slug::slugify;

use super::error::DomainError;

/// Highest featured rank; 0 means "not featured".
pub const MAX_FEATURED_RANK: i32 = 9;

/// Number of items the JSON featured-order endpoint ranks.
pub const FEATURED_ORDER_LIMIT: usize = 3;

/// Upper bound of a `NUMERIC(8, 2)` price.
pub const MAX_PRICE_CENTS: i64 = 99_999_999;

pub fn clamp_featured_rank(value: i64) -> i32 {
    value.clamp(0, i64::from(MAX_FEATURED_RANK)) as i32
}

/// Parse a decimal price such as `9.99`, `$12` or `.5` into cents.
pub fn parse_price_cents(input: &str) -> Result<i64, DomainError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("price is required"));
    }

    let invalid = || DomainError::validation(format!("invalid price `{}`", input.trim()));

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if (whole.is_empty() && fraction.is_empty())
        || fraction.len() > 2
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    let cents = whole_value
        .checked_mul(100)
        .and_then(|value| value.checked_add(fraction_value))
        .ok_or_else(invalid)?;
    ensure_price_range(cents)
}

/// Convert a JSON amount (dollars as a float) into cents.
pub fn price_cents_from_amount(amount: f64) -> Result<i64, DomainError> {
    if !amount.is_finite() {
        return Err(DomainError::validation("price must be a finite number"));
    }
    let cents = (amount * 100.0).round();
    if cents < 0.0 || cents > MAX_PRICE_CENTS as f64 {
        return Err(DomainError::validation(format!(
            "price {amount} is outside the supported range"
        )));
    }
    Ok(cents as i64)
}

pub fn price_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn ensure_price_range(cents: i64) -> Result<i64, DomainError> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(DomainError::validation(format!(
            "price {} is outside the supported range",
            format_price(cents)
        )));
    }
    Ok(cents)
}

/// Resolve the slug for a category or tag: an explicit slug is normalised,
/// a blank one is derived from the name.
pub fn resolve_slug(name: &str, slug: Option<&str>) -> Result<String, DomainError> {
    let source = slug
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(name);
    let resolved = slugify(source);
    if resolved.is_empty() {
        return Err(DomainError::validation("slug must contain letters or digits"));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn featured_rank_is_clamped_into_range() {
        assert_eq!(clamp_featured_rank(15), 9);
        assert_eq!(clamp_featured_rank(-4), 0);
        assert_eq!(clamp_featured_rank(3), 3);
        assert_eq!(clamp_featured_rank(i64::MAX), 9);
    }

    #[test]
    fn prices_parse_to_cents() {
        assert_eq!(parse_price_cents("9.99").expect("price"), 999);
        assert_eq!(parse_price_cents("$12").expect("price"), 1200);
        assert_eq!(parse_price_cents("4.5").expect("price"), 450);
        assert_eq!(parse_price_cents(".75").expect("price"), 75);
    }

    #[test]
    fn malformed_prices_are_rejected() {
        for input in ["", "abc", "1.234", "-3", "1.2.3", "999999999"] {
            assert!(parse_price_cents(input).is_err(), "{input} should fail");
        }
    }

    #[test]
    fn json_amounts_round_to_cents() {
        assert_eq!(price_cents_from_amount(9.99).expect("price"), 999);
        assert!(price_cents_from_amount(-1.0).is_err());
        assert!(price_cents_from_amount(f64::NAN).is_err());
        assert_eq!(format_price(999), "9.99");
        assert_eq!(format_price(1200), "12.00");
    }

    #[test]
    fn slug_falls_back_to_name() {
        assert_eq!(resolve_slug("Gluten Free", None).expect("slug"), "gluten-free");
        assert_eq!(
            resolve_slug("Gluten Free", Some("  GF ")).expect("slug"),
            "gf"
        );
        assert!(resolve_slug("!!!", Some("")).is_err());
    }
}
