use crate::transpiler::dialect::{
    BitwiseStyle, ConcatStyle, DialectConfig, Pagination, PlaceholderStyle, UpsertStyle,
};

/// SQLite.
///
/// LIKE is case-insensitive here, so case-sensitive matching maps to GLOB and
/// ILIKE maps to LIKE. Patterns are passed through unchanged.
pub fn config() -> DialectConfig {
    DialectConfig {
        name: "sqlite".to_string(),
        quote_open: '"',
        quote_close: '"',
        placeholder: PlaceholderStyle::Qmark,
        pagination: Pagination::LimitOffset {
            limit_max: Some("-1".to_string()),
        },
        true_literal: "1".to_string(),
        false_literal: "0".to_string(),
        upsert: UpsertStyle::OnConflict,
        returning: true,
        like_operator: "GLOB".to_string(),
        ilike_operator: Some("LIKE".to_string()),
        concat: ConcatStyle::Operator {
            symbol: "||".to_string(),
        },
        bitwise: BitwiseStyle::Native,
        compound_parentheses: false,
        recursive_keyword: true,
        row_locking: false,
        nulls_ordering: true,
        full_join: true,
        default_values: "DEFAULT VALUES".to_string(),
    }
}
