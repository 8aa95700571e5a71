use regex::Regex;
use store_common::Money;

use crate::CashfreeApiError;

/// Cashfree rejects anything but a bare 10-digit mobile number.
pub fn validate_phone(phone: &str) -> Result<(), CashfreeApiError> {
    let re = Regex::new(r"^\d{10}$").map_err(|e| CashfreeApiError::InvalidRequest(e.to_string()))?;
    if re.is_match(phone) {
        Ok(())
    } else {
        Err(CashfreeApiError::InvalidRequest(format!("'{phone}' is not a 10-digit phone number")))
    }
}

/// The order amount as Cashfree wants it: a float in major units.
pub fn cashfree_amount(amount: Money) -> f64 {
    amount.as_major_f64()
}
