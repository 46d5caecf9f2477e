//! Filter expression AST for EdgeVec.
//!
//! This module defines the `FilterExpr` enum with all 27 AST node variants
//! as specified in FILTER_EVALUATOR.md.
//!
//! # Variant Categories
//!
//! | Category | Count | Variants |
//! |:---------|:------|:---------|
//! | Literals | 5 | String, Int, Float, Bool, Array |
//! | Field Reference | 1 | Field |
//! | Comparison | 6 | Eq, Ne, Lt, Le, Gt, Ge |
//! | String Operators | 4 | Contains, StartsWith, EndsWith, Like |
//! | Array/Set Operators | 5 | In, NotIn, Any, All, None |
//! | Range | 1 | Between |
//! | Logical | 3 | And, Or, Not |
//! | Null Checks | 2 | IsNull, IsNotNull |
//!
//! # Memory Layout
//!
//! All recursive variants use `Box<FilterExpr>` to ensure:
//! - Fixed-size enum (single pointer width per child)
//! - Heap allocation for nested expressions
//! - Prevents stack overflow with deep nesting
//!
//! # Serialization
//!
//! The AST is serializable with serde for:
//! - WASM boundary crossing (JSON serialization)
//! - Debug logging and visualization
//! - Potential caching of parsed expressions

use serde::{Deserialize, Serialize};

/// Filter expression AST node.
///
/// Represents a parsed filter expression that can be evaluated
/// against vector metadata. The enum has exactly 27 variants
/// covering all supported filter operations.
///
/// # Recursive Structure
///
/// Binary operators store left and right operands as `Box<FilterExpr>`,
/// enabling arbitrarily nested expressions like:
/// ```text
/// (category = "gpu" AND price < 500) OR rating >= 4.5
/// ```
///
/// # Example
///
/// ```rust
/// use noema::filter::FilterExpr;
///
/// // Simple equality check
/// let expr = FilterExpr::Eq(
///     Box::new(FilterExpr::Field("category".to_string())),
///     Box::new(FilterExpr::LiteralString("gpu".to_string())),
/// );
///
/// // Compound expression
/// let compound = FilterExpr::And(
///     Box::new(expr),
///     Box::new(FilterExpr::Lt(
///         Box::new(FilterExpr::Field("price".to_string())),
///         Box::new(FilterExpr::LiteralInt(500)),
///     )),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FilterExpr {
    // ═══════════════════════════════════════════════════════════════════════
    // LITERALS (5 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// String literal: `"hello"`, `"gpu"`, `"category name"`
    ///
    /// Supports escape sequences: `\"`, `\\`, `\n`, `\r`, `\t`
    LiteralString(String),

    /// Integer literal: `42`, `-1`, `0`, `9999`
    ///
    /// Stored as i64 for maximum range compatibility.
    LiteralInt(i64),

    /// Float literal: `3.14159`, `-0.5`, `100.0`
    ///
    /// Stored as f64 (IEEE 754 double precision).
    /// Note: NaN and Infinity are not valid in filter expressions.
    LiteralFloat(f64),

    /// Boolean literal: `true`, `false`
    ///
    /// Case-insensitive parsing: `TRUE`, `True`, `true` all valid.
    LiteralBool(bool),

    /// Array literal: `[1, 2, 3]`, `["a", "b"]`, `[true, false]`
    ///
    /// Used with `IN`, `NOT IN`, `ANY`, `ALL`, `NONE` operators.
    /// Elements must be homogeneous in type.
    LiteralArray(Vec<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // FIELD REFERENCE (1 variant)
    // ═══════════════════════════════════════════════════════════════════════
    /// Field reference: `category`, `price`, `tags`, `created_at`
    ///
    /// References a metadata field by name. Field names must:
    /// - Start with a letter or underscore
    /// - Contain only alphanumeric characters and underscores
    /// - Be case-sensitive (recommended: snake_case)
    Field(String),

    // ═══════════════════════════════════════════════════════════════════════
    // COMPARISON OPERATORS (6 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// Equality: `field = value`
    ///
    /// Supports all comparable types: string, int, float, bool.
    /// String comparison is case-sensitive.
    Eq(Box<FilterExpr>, Box<FilterExpr>),

    /// Inequality: `field != value`
    ///
    /// Logically equivalent to `NOT (field = value)`.
    Ne(Box<FilterExpr>, Box<FilterExpr>),

    /// Less than: `field < value`
    ///
    /// Supports numeric types (int, float) and strings (lexicographic).
    Lt(Box<FilterExpr>, Box<FilterExpr>),

    /// Less than or equal: `field <= value`
    ///
    /// Supports numeric types (int, float) and strings (lexicographic).
    Le(Box<FilterExpr>, Box<FilterExpr>),

    /// Greater than: `field > value`
    ///
    /// Supports numeric types (int, float) and strings (lexicographic).
    Gt(Box<FilterExpr>, Box<FilterExpr>),

    /// Greater than or equal: `field >= value`
    ///
    /// Supports numeric types (int, float) and strings (lexicographic).
    Ge(Box<FilterExpr>, Box<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // STRING OPERATORS (4 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// Contains substring: `field CONTAINS "value"`
    ///
    /// Case-sensitive substring match.
    /// Example: `description CONTAINS "fast"` matches "ultra-fast processor"
    Contains(Box<FilterExpr>, Box<FilterExpr>),

    /// Starts with prefix: `field STARTS_WITH "prefix"`
    ///
    /// Case-sensitive prefix match.
    /// Example: `name STARTS_WITH "GPU"` matches "GPU-1080"
    StartsWith(Box<FilterExpr>, Box<FilterExpr>),

    /// Ends with suffix: `field ENDS_WITH "suffix"`
    ///
    /// Case-sensitive suffix match.
    /// Example: `filename ENDS_WITH ".pdf"` matches "document.pdf"
    EndsWith(Box<FilterExpr>, Box<FilterExpr>),

    /// SQL-style LIKE pattern: `field LIKE "pattern%"`
    ///
    /// Supports wildcards:
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    ///
    /// Example: `name LIKE "GPU_%"` matches "GPU_1080", "GPU_3090"
    Like(Box<FilterExpr>, Box<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // ARRAY/SET OPERATORS (5 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// In set: `field IN [v1, v2, v3]`
    ///
    /// True if field value equals any element in the array.
    /// Example: `category IN ["gpu", "cpu", "ram"]`
    In(Box<FilterExpr>, Box<FilterExpr>),

    /// Not in set: `field NOT IN [v1, v2, v3]`
    ///
    /// True if field value does not equal any element in the array.
    /// Logically equivalent to `NOT (field IN [v1, v2, v3])`.
    NotIn(Box<FilterExpr>, Box<FilterExpr>),

    /// Any match: `field ANY [v1, v2]`
    ///
    /// For array-valued fields: true if field contains any of the specified values.
    /// Example: `tags ANY ["rust", "wasm"]` matches if tags contains "rust" OR "wasm"
    Any(Box<FilterExpr>, Box<FilterExpr>),

    /// All match: `field ALL [v1, v2]`
    ///
    /// For array-valued fields: true if field contains all of the specified values.
    /// Example: `tags ALL ["rust", "wasm"]` matches if tags contains "rust" AND "wasm"
    All(Box<FilterExpr>, Box<FilterExpr>),

    /// None match: `field NONE [v1, v2]`
    ///
    /// For array-valued fields: true if field contains none of the specified values.
    /// Example: `tags NONE ["deprecated"]` matches if tags does not contain "deprecated"
    None(Box<FilterExpr>, Box<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // RANGE OPERATOR (1 variant)
    // ═══════════════════════════════════════════════════════════════════════
    /// Between range: `field BETWEEN low AND high` (inclusive)
    ///
    /// Logically equivalent to `field >= low AND field <= high`.
    /// Supports numeric types and strings.
    ///
    /// Example: `price BETWEEN 100 AND 500`
    Between(Box<FilterExpr>, Box<FilterExpr>, Box<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // LOGICAL OPERATORS (3 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// Logical AND: `expr1 AND expr2`
    ///
    /// True if both operands are true. Short-circuit evaluation.
    /// Alternative syntax: `&&`
    And(Box<FilterExpr>, Box<FilterExpr>),

    /// Logical OR: `expr1 OR expr2`
    ///
    /// True if either operand is true. Short-circuit evaluation.
    /// Alternative syntax: `||`
    Or(Box<FilterExpr>, Box<FilterExpr>),

    /// Logical NOT: `NOT expr`
    ///
    /// Inverts the boolean result of the operand.
    /// Alternative syntax: `!`
    Not(Box<FilterExpr>),

    // ═══════════════════════════════════════════════════════════════════════
    // NULL OPERATORS (2 variants)
    // ═══════════════════════════════════════════════════════════════════════
    /// Is null check: `field IS NULL`
    ///
    /// True if the field does not exist or has a null value.
    IsNull(Box<FilterExpr>),

    /// Is not null check: `field IS NOT NULL`
    ///
    /// True if the field exists and has a non-null value.
    /// Logically equivalent to `NOT (field IS NULL)`.
    IsNotNull(Box<FilterExpr>),
}

impl FilterExpr {
    // ═══════════════════════════════════════════════════════════════════════
    // TYPE CHECKING METHODS
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns true if this is a literal value.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            FilterExpr::LiteralString(_)
                | FilterExpr::LiteralInt(_)
                | FilterExpr::LiteralFloat(_)
                | FilterExpr::LiteralBool(_)
                | FilterExpr::LiteralArray(_)
        )
    }

    /// Returns true if this is a field reference.
    #[must_use]
    pub fn is_field(&self) -> bool {
        matches!(self, FilterExpr::Field(_))
    }

    /// Returns true if this is a comparison operator.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            FilterExpr::Eq(_, _)
                | FilterExpr::Ne(_, _)
                | FilterExpr::Lt(_, _)
                | FilterExpr::Le(_, _)
                | FilterExpr::Gt(_, _)
                | FilterExpr::Ge(_, _)
        )
    }

    /// Returns true if this is a string operator.
    #[must_use]
    pub fn is_string_op(&self) -> bool {
        matches!(
            self,
            FilterExpr::Contains(_, _)
                | FilterExpr::StartsWith(_, _)
                | FilterExpr::EndsWith(_, _)
                | FilterExpr::Like(_, _)
        )
    }

    /// Returns true if this is an array/set operator.
    #[must_use]
    pub fn is_array_op(&self) -> bool {
        matches!(
            self,
            FilterExpr::In(_, _)
                | FilterExpr::NotIn(_, _)
                | FilterExpr::Any(_, _)
                | FilterExpr::All(_, _)
                | FilterExpr::None(_, _)
        )
    }

    /// Returns true if this is a logical operator.
    #[must_use]
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            FilterExpr::And(_, _) | FilterExpr::Or(_, _) | FilterExpr::Not(_)
        )
    }

    /// Returns true if this is a null check operator.
    #[must_use]
    pub fn is_null_check(&self) -> bool {
        matches!(self, FilterExpr::IsNull(_) | FilterExpr::IsNotNull(_))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // VALUE EXTRACTION METHODS
    // ═══════════════════════════════════════════════════════════════════════

    /// Extracts string literal value if this is a LiteralString.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FilterExpr::LiteralString(s) => Some(s),
            _ => Option::None,
        }
    }

    /// Extracts integer literal value if this is a LiteralInt.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FilterExpr::LiteralInt(i) => Some(*i),
            _ => Option::None,
        }
    }

    /// Extracts float literal value if this is a LiteralFloat.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FilterExpr::LiteralFloat(f) => Some(*f),
            _ => Option::None,
        }
    }

    /// Extracts boolean literal value if this is a LiteralBool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterExpr::LiteralBool(b) => Some(*b),
            _ => Option::None,
        }
    }

    /// Extracts field name if this is a Field reference.
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            FilterExpr::Field(name) => Some(name),
            _ => Option::None,
        }
    }

    /// Extracts array elements if this is a LiteralArray.
    #[must_use]
    pub fn as_array(&self) -> Option<&[FilterExpr]> {
        match self {
            FilterExpr::LiteralArray(arr) => Some(arr),
            _ => Option::None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // UTILITY METHODS
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns the operator name for display/debugging.
    #[must_use]
    pub fn operator_name(&self) -> &'static str {
        match self {
            FilterExpr::LiteralString(_) => "LiteralString",
            FilterExpr::LiteralInt(_) => "LiteralInt",
            FilterExpr::LiteralFloat(_) => "LiteralFloat",
            FilterExpr::LiteralBool(_) => "LiteralBool",
            FilterExpr::LiteralArray(_) => "LiteralArray",
            FilterExpr::Field(_) => "Field",
            FilterExpr::Eq(_, _) => "Eq",
            FilterExpr::Ne(_, _) => "Ne",
            FilterExpr::Lt(_, _) => "Lt",
            FilterExpr::Le(_, _) => "Le",
            FilterExpr::Gt(_, _) => "Gt",
            FilterExpr::Ge(_, _) => "Ge",
            FilterExpr::Contains(_, _) => "Contains",
            FilterExpr::StartsWith(_, _) => "StartsWith",
            FilterExpr::EndsWith(_, _) => "EndsWith",
            FilterExpr::Like(_, _) => "Like",
            FilterExpr::In(_, _) => "In",
            FilterExpr::NotIn(_, _) => "NotIn",
            FilterExpr::Any(_, _) => "Any",
            FilterExpr::All(_, _) => "All",
            FilterExpr::None(_, _) => "None",
            FilterExpr::Between(_, _, _) => "Between",
            FilterExpr::And(_, _) => "And",
            FilterExpr::Or(_, _) => "Or",
            FilterExpr::Not(_) => "Not",
            FilterExpr::IsNull(_) => "IsNull",
            FilterExpr::IsNotNull(_) => "IsNotNull",
        }
    }

    /// Counts the depth of nesting in this expression tree.
    ///
    /// Used for enforcing maximum nesting limits to prevent stack overflow.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            // Leaf nodes have depth 1
            FilterExpr::LiteralString(_)
            | FilterExpr::LiteralInt(_)
            | FilterExpr::LiteralFloat(_)
            | FilterExpr::LiteralBool(_)
            | FilterExpr::Field(_) => 1,

            // Array depth is max of element depths + 1
            FilterExpr::LiteralArray(arr) => {
                1 + arr.iter().map(FilterExpr::depth).max().unwrap_or(0)
            }

            // Unary operators: child depth + 1
            FilterExpr::Not(expr) | FilterExpr::IsNull(expr) | FilterExpr::IsNotNull(expr) => {
                1 + expr.depth()
            }

            // Binary operators: max of children + 1
            FilterExpr::Eq(l, r)
            | FilterExpr::Ne(l, r)
            | FilterExpr::Lt(l, r)
            | FilterExpr::Le(l, r)
            | FilterExpr::Gt(l, r)
            | FilterExpr::Ge(l, r)
            | FilterExpr::Contains(l, r)
            | FilterExpr::StartsWith(l, r)
            | FilterExpr::EndsWith(l, r)
            | FilterExpr::Like(l, r)
            | FilterExpr::In(l, r)
            | FilterExpr::NotIn(l, r)
            | FilterExpr::Any(l, r)
            | FilterExpr::All(l, r)
            | FilterExpr::None(l, r)
            | FilterExpr::And(l, r)
            | FilterExpr::Or(l, r) => 1 + l.depth().max(r.depth()),

            // Ternary operator (Between)
            FilterExpr::Between(field, low, high) => {
                1 + field.depth().max(low.depth()).max(high.depth())
            }
        }
    }

    /// Collects all field names referenced in this expression.
    ///
    /// Useful for determining which metadata fields are needed for evaluation.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Field(name) => fields.push(name),
            FilterExpr::LiteralArray(arr) => {
                for elem in arr {
                    elem.collect_fields(fields);
                }
            }
            FilterExpr::Not(expr) | FilterExpr::IsNull(expr) | FilterExpr::IsNotNull(expr) => {
                expr.collect_fields(fields);
            }
            FilterExpr::Eq(l, r)
            | FilterExpr::Ne(l, r)
            | FilterExpr::Lt(l, r)
            | FilterExpr::Le(l, r)
            | FilterExpr::Gt(l, r)
            | FilterExpr::Ge(l, r)
            | FilterExpr::Contains(l, r)
            | FilterExpr::StartsWith(l, r)
            | FilterExpr::EndsWith(l, r)
            | FilterExpr::Like(l, r)
            | FilterExpr::In(l, r)
            | FilterExpr::NotIn(l, r)
            | FilterExpr::Any(l, r)
            | FilterExpr::All(l, r)
            | FilterExpr::None(l, r)
            | FilterExpr::And(l, r)
            | FilterExpr::Or(l, r) => {
                l.collect_fields(fields);
                r.collect_fields(fields);
            }
            FilterExpr::Between(field, low, high) => {
                field.collect_fields(fields);
                low.collect_fields(fields);
                high.collect_fields(fields);
            }
            // Literals don't have fields
            FilterExpr::LiteralString(_)
            | FilterExpr::LiteralInt(_)
            | FilterExpr::LiteralFloat(_)
            | FilterExpr::LiteralBool(_) => {}
        }
    }
}
