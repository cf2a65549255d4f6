pub mod utils;

pub use utils::{
    convert_amount, currency_symbol, detect_currency, extract_currency_symbol, extract_number,
    format_currency, LocaleHints,
};
