//! Money formatting

use rusty_money::{Money, iso::Currency};

use crate::items::Amount;

/// Currency every storefront amount is denominated in.
pub const STORE_CURRENCY: &Currency = rusty_money::iso::INR;

/// Format an amount given in whole units of [`STORE_CURRENCY`].
pub fn format_amount(amount: Amount) -> String {
    Money::from_major(amount, STORE_CURRENCY).to_string()
}
