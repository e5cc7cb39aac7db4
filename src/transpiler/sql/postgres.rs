use crate::transpiler::dialect::{
    BitwiseStyle, ConcatStyle, DialectConfig, Pagination, PlaceholderStyle, UpsertStyle,
};

/// PostgreSQL: `"` quoting, `$n` placeholders, native ILIKE, ON CONFLICT and RETURNING.
pub fn config() -> DialectConfig {
    DialectConfig {
        name: "postgres".to_string(),
        quote_open: '"',
        quote_close: '"',
        placeholder: PlaceholderStyle::Numbered {
            prefix: "$".to_string(),
        },
        pagination: Pagination::LimitOffset { limit_max: None },
        true_literal: "TRUE".to_string(),
        false_literal: "FALSE".to_string(),
        upsert: UpsertStyle::OnConflict,
        returning: true,
        like_operator: "LIKE".to_string(),
        ilike_operator: Some("ILIKE".to_string()),
        concat: ConcatStyle::Operator {
            symbol: "||".to_string(),
        },
        bitwise: BitwiseStyle::Native,
        compound_parentheses: true,
        recursive_keyword: true,
        row_locking: true,
        nulls_ordering: true,
        full_join: true,
        default_values: "DEFAULT VALUES".to_string(),
    }
}
