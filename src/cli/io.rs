use std::fmt;

use dialoguer::{theme::ColorfulTheme, Confirm};
use rust_decimal::Decimal;

use crate::cli::core::CommandError;
use crate::cli::output;

pub fn print_info(message: impl fmt::Display) {
    output::info(message);
}

pub fn print_warning(message: impl fmt::Display) {
    output::warning(message);
}

pub fn print_error(message: impl fmt::Display) {
    output::error(message);
}

pub fn print_success(message: impl fmt::Display) {
    output::success(message);
}

pub fn print_hint(message: impl fmt::Display) {
    output::hint(message);
}

/// Prompt the user for confirmation with a yes/no question.
pub fn confirm_action(prompt: &str, default: bool) -> Result<bool, CommandError> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(CommandError::from)
}

/// Formats an amount with two decimal places after the currency code.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{} {:.2}", currency, amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_is_rounded_to_cents() {
        assert_eq!(format_money(dec!(250), "BRL"), "BRL 250.00");
        assert_eq!(format_money(dec!(99.999), "USD"), "USD 100.00");
        assert_eq!(format_money(dec!(-12.5), "EUR"), "EUR -12.50");
    }
}
