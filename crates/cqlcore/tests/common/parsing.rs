//! Parsing test helpers
//!
//! Utilities for testing CQL parsing, including assertion helpers
//! and utilities for working with parse results and diagnostics.

use cqlcore_ast::*;
use cqlcore_diagnostics::CqlError;

/// Parse a CQL expression and return the result
pub fn parse_expression(input: &str) -> Result<Expression, CqlError> {
    cqlcore_parser::parse_expression(input).map(|spanned| spanned.inner)
}

/// Parse a CQL expression and expect success
#[track_caller]
pub fn parse_expression_ok(input: &str) -> Expression {
    parse_expression(input).unwrap_or_else(|e| panic!("Failed to parse expression {input:?}: {e}"))
}

/// Parse a CQL expression and expect an error
#[track_caller]
pub fn parse_expression_err(input: &str) -> CqlError {
    match parse_expression(input) {
        Ok(expr) => panic!("Expected parse error but got success for {input:?}: {expr:?}"),
        Err(e) => e,
    }
}

/// Parse a CQL library and return the result
pub fn parse_library(input: &str) -> Result<Library, CqlError> {
    cqlcore_parser::parse(input)
}

/// Parse a CQL library and expect success
#[track_caller]
pub fn parse_library_ok(input: &str) -> Library {
    parse_library(input).unwrap_or_else(|e| panic!("Failed to parse library: {e}"))
}

/// Parse a CQL library and expect an error
#[track_caller]
pub fn parse_library_err(input: &str) -> CqlError {
    match parse_library(input) {
        Ok(_) => panic!("Expected parse error but got success"),
        Err(e) => e,
    }
}

/// Assert that an expression is a literal
#[track_caller]
pub fn assert_literal(expr: &Expression) -> &Literal {
    match expr {
        Expression::Literal(lit) => lit,
        _ => panic!("Expected Literal, got: {:?}", expr),
    }
}

/// Assert that an expression is an integer literal
#[track_caller]
pub fn assert_integer_literal(expr: &Expression, expected: i32) {
    let lit = assert_literal(expr);
    match lit {
        Literal::Integer(val) => assert_eq!(*val, expected),
        _ => panic!("Expected Integer literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a string literal
#[track_caller]
pub fn assert_string_literal(expr: &Expression, expected: &str) {
    let lit = assert_literal(expr);
    match lit {
        Literal::String(val) => assert_eq!(val, expected),
        _ => panic!("Expected String literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a boolean literal
#[track_caller]
pub fn assert_boolean_literal(expr: &Expression, expected: bool) {
    let lit = assert_literal(expr);
    match lit {
        Literal::Boolean(val) => assert_eq!(*val, expected),
        _ => panic!("Expected Boolean literal, got: {:?}", lit),
    }
}

/// Assert that an expression is a binary operation, returning its operands and operator symbol
#[track_caller]
pub fn assert_binary_op(expr: &Expression) -> (&Expression, &'static str, &Expression) {
    match expr {
        Expression::BinaryOp(BinaryOpExpr { left, op, right }) => {
            (&**left, op.symbol(), &**right)
        }
        _ => panic!("Expected BinaryOp, got: {:?}", expr),
    }
}

/// Assert that an expression is a unary operation
#[track_caller]
pub fn assert_unary_op(expr: &Expression) -> (&'static str, &Expression) {
    match expr {
        Expression::UnaryOp(UnaryOpExpr { op, operand }) => (op.symbol(), &**operand),
        _ => panic!("Expected UnaryOp, got: {:?}", expr),
    }
}

/// Assert that an expression is an identifier reference
#[track_caller]
pub fn assert_identifier(expr: &Expression, expected: &str) {
    match expr {
        Expression::IdentifierRef(IdentifierRef { name }) => assert_eq!(name.name, expected),
        _ => panic!("Expected IdentifierRef, got: {:?}", expr),
    }
}

/// Assert that an expression is a function reference (unqualified call)
#[track_caller]
pub fn assert_function_ref(expr: &Expression) -> (&str, &[Spanned<Expression>]) {
    match expr {
        Expression::FunctionRef(FunctionRefExpr { name, arguments, .. }) => {
            (name.name.as_str(), arguments.as_slice())
        }
        _ => panic!("Expected FunctionRef, got: {:?}", expr),
    }
}

/// Assert that an expression is a query
#[track_caller]
pub fn assert_query(expr: &Expression) -> &Query {
    match expr {
        Expression::Query(query) => query.as_ref(),
        _ => panic!("Expected Query, got: {:?}", expr),
    }
}

/// Assert that an expression is a property access, returning the source and property name
#[track_caller]
pub fn assert_property(expr: &Expression) -> (&Expression, &str) {
    match expr {
        Expression::Property(PropertyAccess { source, property }) => {
            (&**source, property.name.as_str())
        }
        _ => panic!("Expected Property, got: {:?}", expr),
    }
}

/// Assert that an expression is a list literal
#[track_caller]
pub fn assert_list(expr: &Expression) -> &[Spanned<Expression>] {
    match expr {
        Expression::List(ListExpr { elements, .. }) => elements.as_slice(),
        _ => panic!("Expected List, got: {:?}", expr),
    }
}

/// Assert that an expression is a tuple literal
#[track_caller]
pub fn assert_tuple(expr: &Expression) -> &[TupleElement] {
    match expr {
        Expression::Tuple(TupleExpr { elements }) => elements.as_slice(),
        _ => panic!("Expected Tuple, got: {:?}", expr),
    }
}

/// Assert that an expression is an interval literal
#[track_caller]
pub fn assert_interval(
    expr: &Expression,
) -> (Option<&Expression>, Option<&Expression>, bool, bool) {
    match expr {
        Expression::Interval(IntervalExpr {
            low,
            low_closed,
            high,
            high_closed,
        }) => (
            low.as_deref().map(|b| &**b),
            high.as_deref().map(|b| &**b),
            *low_closed,
            *high_closed,
        ),
        _ => panic!("Expected Interval, got: {:?}", expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_literal() {
        let expr = parse_expression_ok("42");
        assert_integer_literal(&expr, 42);
    }

    #[test]
    fn test_parse_string_literal() {
        let expr = parse_expression_ok("'hello'");
        assert_string_literal(&expr, "hello");
    }

    #[test]
    fn test_parse_boolean_literal() {
        let expr = parse_expression_ok("true");
        assert_boolean_literal(&expr, true);
    }

    #[test]
    fn test_parse_binary_op() {
        let expr = parse_expression_ok("1 + 2");
        let (left, op, right) = assert_binary_op(&expr);
        assert_eq!(op, "+");
        assert_integer_literal(left, 1);
        assert_integer_literal(right, 2);
    }

    #[test]
    fn test_parse_identifier() {
        let expr = parse_expression_ok("PatientAge");
        assert_identifier(&expr, "PatientAge");
    }

    #[test]
    fn test_parse_error() {
        parse_expression_err("1 + + 2");
    }
}
