use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceClass {
    /// The participant is owed money.
    Credit,
    /// The participant owes money.
    Debt,
    Even,
}

impl BalanceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debt => "debt",
            Self::Even => "even",
        }
    }
}

pub fn classify(balance: Decimal) -> BalanceClass {
    if balance.is_zero() {
        BalanceClass::Even
    } else if balance.is_sign_positive() {
        BalanceClass::Credit
    } else {
        BalanceClass::Debt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocaleStyle {
    group_separator: char,
    decimal_separator: char,
    symbol_first: bool,
}

impl LocaleStyle {
    fn lookup(locale: &str) -> Option<Self> {
        let style = |group_separator, decimal_separator, symbol_first| Self {
            group_separator,
            decimal_separator,
            symbol_first,
        };
        match locale.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "tr-tr" | "tr" => Some(style('.', ',', true)),
            "en-us" | "en-gb" | "en" => Some(style(',', '.', true)),
            "de-de" | "de" | "nl-nl" | "nl" => Some(style('.', ',', false)),
            "fr-fr" | "fr" => Some(style('\u{202f}', ',', false)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    locale: String,
    symbol: String,
}

impl CurrencyFormatter {
    pub fn new(locale: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            symbol: symbol.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.locale.clone(), settings.currency_symbol.clone())
    }

    /// Two decimals with the locale's grouping, or `"{:.2} {symbol}"` when
    /// the locale is unknown.
    pub fn format(&self, amount: Decimal) -> String {
        let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if amount.is_zero() {
            amount.set_sign_positive(true);
        }
        let Some(style) = LocaleStyle::lookup(&self.locale) else {
            return format!("{amount:.2} {}", self.symbol);
        };

        let fixed = format!("{:.2}", amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let grouped = group_digits(int_part, style.group_separator);
        let number = format!("{grouped}{}{frac_part}", style.decimal_separator);
        let sign = if amount.is_sign_negative() { "-" } else { "" };

        if style.symbol_first {
            format!("{sign}{}{number}", self.symbol)
        } else {
            format!("{sign}{number} {}", self.symbol)
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceLine {
    pub participant: String,
    pub balance: Decimal,
    pub class: BalanceClass,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePresenter {
    currency: CurrencyFormatter,
}

impl BalancePresenter {
    pub fn new(currency: CurrencyFormatter) -> Self {
        Self { currency }
    }

    pub fn currency(&self) -> &CurrencyFormatter {
        &self.currency
    }

    pub fn classify(&self, balance: Decimal) -> BalanceClass {
        classify(balance)
    }

    pub fn magnitude(&self, balance: Decimal) -> Decimal {
        balance.abs()
    }

    pub fn describe(&self, balance: Decimal) -> String {
        match classify(balance) {
            BalanceClass::Credit => format!("+{} to receive", self.currency.format(balance)),
            BalanceClass::Debt => format!("{} to pay", self.currency.format(balance.abs())),
            BalanceClass::Even => format!("{} even", self.currency.format(Decimal::ZERO)),
        }
    }

    pub fn lines(&self, balances: &[(String, Decimal)]) -> Vec<BalanceLine> {
        balances
            .iter()
            .map(|(participant, balance)| BalanceLine {
                participant: participant.clone(),
                balance: *balance,
                class: classify(*balance),
                text: self.describe(*balance),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/balance_tests.rs"]
mod tests;
