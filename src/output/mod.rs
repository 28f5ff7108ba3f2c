pub mod formatter;
pub mod number;

pub use formatter::{
    format_age, format_customer_detail, format_empty_results, format_results_table,
    format_summary, format_tsv, get_terminal_width, level_hint, should_use_colors,
    NO_REASONS_PLACEHOLDER,
};
pub use number::{decimal_formatter, format_amount, format_trimmed, parse_locale, CurrencyFormat};
