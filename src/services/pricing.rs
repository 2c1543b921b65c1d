use chrono::NaiveDate;
use serde::Serialize;

/// Tax policy constant. Hard-coded on purpose: there is one jurisdiction.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Price breakdown for a stay, in whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub nights: i64,
    pub subtotal: i64,
    pub taxes: i64,
    pub total: i64,
}

/// Computes the quote for a stay. A non-positive night count here is a
/// defect: the search guard must have rejected it already, so this fails
/// hard instead of clamping.
pub fn quote(check_in: NaiveDate, check_out: NaiveDate, price_per_night: i64) -> anyhow::Result<Quote> {
    let nights = (check_out - check_in).num_days();
    anyhow::ensure!(
        nights >= 1,
        "pricing reached with {nights} nights ({check_in} to {check_out}); search validation must reject this"
    );

    let subtotal = nights * price_per_night;
    // Half-up rounding to the smallest currency unit
    let taxes = (subtotal * TAX_RATE_PERCENT + 50) / 100;

    Ok(Quote {
        nights,
        subtotal,
        taxes,
        total: subtotal + taxes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_three_nights_at_200() {
        let q = quote(date("2025-10-04"), date("2025-10-07"), 200).unwrap();
        assert_eq!(q.nights, 3);
        assert_eq!(q.subtotal, 600);
        assert_eq!(q.taxes, 60);
        assert_eq!(q.total, 660);
    }

    #[test]
    fn test_one_night_at_400() {
        let q = quote(date("2025-10-04"), date("2025-10-05"), 400).unwrap();
        assert_eq!(q.nights, 1);
        assert_eq!(q.subtotal, 400);
        assert_eq!(q.taxes, 40);
        assert_eq!(q.total, 440);
    }

    #[test]
    fn test_half_up_rounding() {
        // 5 nights x 121 = 605, 10% = 60.5, rounds up to 61
        let q = quote(date("2025-10-04"), date("2025-10-09"), 121).unwrap();
        assert_eq!(q.subtotal, 605);
        assert_eq!(q.taxes, 61);
        assert_eq!(q.total, 666);

        // 2 nights x 152 = 304, 10% = 30.4, rounds down to 30
        let q = quote(date("2025-10-04"), date("2025-10-06"), 152).unwrap();
        assert_eq!(q.taxes, 30);
        assert_eq!(q.total, 334);
    }

    #[test]
    fn test_total_identity() {
        for price in [1, 85, 180, 260, 400] {
            let q = quote(date("2025-10-04"), date("2025-10-11"), price).unwrap();
            assert_eq!(q.total, q.subtotal + q.taxes);
            assert_eq!(q.subtotal, q.nights * price);
        }
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let a = quote(date("2025-10-04"), date("2025-10-07"), 200).unwrap();
        let b = quote(date("2025-10-04"), date("2025-10-07"), 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_or_negative_nights_is_an_error() {
        assert!(quote(date("2025-10-04"), date("2025-10-04"), 200).is_err());
        assert!(quote(date("2025-10-04"), date("2025-10-02"), 200).is_err());
    }
}
