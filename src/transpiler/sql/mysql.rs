use crate::transpiler::dialect::{
    BitwiseStyle, ConcatStyle, DialectConfig, Pagination, PlaceholderStyle, UpsertStyle,
};

/// Largest LIMIT MySQL accepts; stands in when only an OFFSET is requested.
const MAX_LIMIT: &str = "18446744073709551615";

/// MySQL / MariaDB.
pub fn config() -> DialectConfig {
    DialectConfig {
        name: "mysql".to_string(),
        quote_open: '`',
        quote_close: '`',
        placeholder: PlaceholderStyle::Qmark,
        pagination: Pagination::LimitOffset {
            limit_max: Some(MAX_LIMIT.to_string()),
        },
        true_literal: "TRUE".to_string(),
        false_literal: "FALSE".to_string(),
        upsert: UpsertStyle::OnDuplicateKey,
        returning: false,
        like_operator: "LIKE BINARY".to_string(),
        ilike_operator: Some("LIKE".to_string()),
        concat: ConcatStyle::Function {
            name: "CONCAT".to_string(),
        },
        bitwise: BitwiseStyle::Native,
        compound_parentheses: true,
        recursive_keyword: true,
        row_locking: true,
        nulls_ordering: false,
        full_join: false,
        default_values: "() VALUES ()".to_string(),
    }
}
