//! Filter expressions for metadata-scoped search (`findSimilar`/`searchText`
//! queries that restrict results to nouns matching a predicate).
//!
//! # Architecture
//!
//! - **AST (`ast.rs`)**: `FilterExpr` enum representing parsed filter expressions
//! - **Parser (`parser.rs`)**: Pest-based parser converting filter strings to AST
//! - **Evaluator (`evaluator.rs`)**: Recursive evaluator with short-circuit optimization
//! - **Error (`error.rs`)**: Comprehensive error types with position information
//! - **Strategy (`strategy.rs`)**: pre/post/hybrid-filter selectivity estimation
//! - **Filtered search (`filtered_search.rs`)**: wires the above into a live
//!   [`crate::hnsw::HnswIndex`] and [`crate::storage::adapter::StorageAdapter`]
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use noema::filter::{parse, evaluate, FilterExpr};
//! use noema::model::MetadataValue;
//!
//! // Parse a filter expression
//! let expr = parse("category = \"gpu\" AND price < 500").unwrap();
//!
//! // Evaluate against metadata
//! let mut metadata = HashMap::new();
//! metadata.insert("category".to_string(), MetadataValue::String("gpu".to_string()));
//! metadata.insert("price".to_string(), MetadataValue::Integer(450));
//!
//! let result = evaluate(&expr, &metadata).unwrap();
//! assert!(result);
//! ```
//!
//! # Grammar
//!
//! The filter syntax supports:
//! - Comparison operators: `=`, `!=`, `<`, `<=`, `>`, `>=`
//! - String operators: `CONTAINS`, `STARTS_WITH`, `ENDS_WITH`, `LIKE`
//! - Array operators: `IN`, `NOT IN`, `ANY`, `ALL`, `NONE`
//! - Range operator: `BETWEEN`
//! - Logical operators: `AND`, `OR`, `NOT`
//! - Null checks: `IS NULL`, `IS NOT NULL`

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod filtered_search;
pub mod parser;
pub mod strategy;

// Re-exports for convenience
pub use ast::FilterExpr;
pub use error::FilterError;
pub use evaluator::evaluate;
pub use filtered_search::{search_filtered, FilteredSearchError, FilteredSearchResult};
pub use parser::parse;
pub use strategy::{estimate_selectivity, FilterStrategy, MetadataStore, SelectivityEstimate};
