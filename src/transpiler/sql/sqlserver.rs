use crate::transpiler::dialect::{
    BitwiseStyle, ConcatStyle, DialectConfig, Pagination, PlaceholderStyle, UpsertStyle,
};

/// SQL Server (T-SQL).
pub fn config() -> DialectConfig {
    DialectConfig {
        name: "sqlserver".to_string(),
        quote_open: '[',
        quote_close: ']',
        placeholder: PlaceholderStyle::Numbered {
            prefix: "@p".to_string(),
        },
        pagination: Pagination::OffsetFetch,
        // No boolean type: constant predicates are spelled as comparisons
        true_literal: "(1 = 1)".to_string(),
        false_literal: "(1 = 0)".to_string(),
        upsert: UpsertStyle::Unsupported,
        returning: false,
        like_operator: "LIKE".to_string(),
        ilike_operator: Some("LIKE".to_string()),
        concat: ConcatStyle::Operator {
            symbol: "+".to_string(),
        },
        bitwise: BitwiseStyle::Native,
        compound_parentheses: true,
        recursive_keyword: false,
        row_locking: false,
        nulls_ordering: false,
        full_join: true,
        default_values: "DEFAULT VALUES".to_string(),
    }
}
