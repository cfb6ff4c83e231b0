//! Library structure parser

use chumsky::prelude::*;

use crate::combinators::{
    identifier_parser, preprocess, qualified_identifier_parser, string_parser,
    type_specifier_parser, version_specifier_parser,
};
use crate::expression::expression_parser;
use cqlcore_ast::{
    AccessModifier, CodeDefinition, CodeSystemRef, CodesystemDefinition, ConceptDefinition,
    ContextDefinition, ExpressionDefinition, FunctionDefinition, FunctionParameter,
    IncludeDefinition, Library, LibraryDefinition, ParameterDefinition, Spanned, Statement,
    UsingDefinition, ValuesetDefinition,
};
use cqlcore_diagnostics::{CqlError, Result, Span, CQL0001};

/// Parse CQL source into a Library AST
pub fn parse(source: &str) -> Result<Library> {
    let cleaned = preprocess(source);
    let parser = library_parser();

    parser
        .parse(&cleaned)
        .into_result()
        .map_err(|errs| {
            let errors: Vec<CqlError> = errs
                .into_iter()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();
            if errors.len() == 1 {
                errors.into_iter().next().unwrap()
            } else {
                CqlError::Multiple(errors)
            }
        })
}

/// Parse a single CQL expression
pub fn parse_expression(source: &str) -> Result<Spanned<cqlcore_ast::Expression>> {
    let cleaned = preprocess(source);
    let parser = expression_parser().padded().then_ignore(end());

    parser
        .parse(&cleaned)
        .into_result()
        .map_err(|errs| {
            let errors: Vec<CqlError> = errs
                .into_iter()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();
            if errors.len() == 1 {
                errors.into_iter().next().unwrap()
            } else {
                CqlError::Multiple(errors)
            }
        })
}

/// Parse CQL source with specified mode
///
/// In Fast mode: fails on first error (default behavior)
/// In Analysis mode: collects all errors and returns partial AST if possible
pub fn parse_with_mode(source: &str, mode: crate::ParseMode) -> crate::ParseResult {
    let cleaned = preprocess(source);
    let parser = library_parser();

    match mode {
        crate::ParseMode::Fast => {
            // Fast mode: same as parse(), but returns ParseResult
            match parser.parse(&cleaned).into_result() {
                Ok(library) => crate::ParseResult::success(library),
                Err(errs) => {
                    let errors: Vec<CqlError> = errs
                        .into_iter()
                        .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                        .collect();
                    crate::ParseResult::error(errors)
                }
            }
        }
        crate::ParseMode::Analysis => {
            // Analysis mode: collect all errors
            let result = parser.parse(&cleaned);

            // Collect all errors from the parse result
            let errors: Vec<CqlError> = result
                .errors()
                .map(|e| CqlError::parse(CQL0001, format!("Parse error: {}", e), source))
                .collect();

            // Try to get a partial or complete AST
            match result.into_output() {
                Some(library) => crate::ParseResult {
                    library: Some(library),
                    errors,
                },
                None => crate::ParseResult {
                    library: None,
                    errors,
                },
            }
        }
    }
}

/// Library parser
fn library_parser<'a>() -> impl Parser<'a, &'a str, Library, extra::Err<Rich<'a, char>>> {
    let lib_def = library_definition().or_not();
    let using_defs = using_definition().repeated().collect::<Vec<_>>();
    let include_defs = include_definition().repeated().collect::<Vec<_>>();
    let context_defs = context_definition().repeated().collect::<Vec<_>>();
    let param_defs = parameter_definition().repeated().collect::<Vec<_>>();
    let codesystem_defs = codesystem_definition().repeated().collect::<Vec<_>>();
    let valueset_defs = valueset_definition().repeated().collect::<Vec<_>>();
    let code_defs = code_definition().repeated().collect::<Vec<_>>();
    let concept_defs = concept_definition().repeated().collect::<Vec<_>>();
    let statements = statement_parser().repeated().collect::<Vec<_>>();

    lib_def
        .then(using_defs)
        .then(include_defs)
        .map(|((lib, usings), includes)| (lib, usings, includes))
        .then(context_defs)
        .map(|((lib, usings, includes), contexts)| (lib, usings, includes, contexts))
        .then(param_defs)
        .map(|((lib, usings, includes, contexts), params)| {
            (lib, usings, includes, contexts, params)
        })
        .then(codesystem_defs)
        .map(|((lib, usings, includes, contexts, params), codesystems)| {
            (lib, usings, includes, contexts, params, codesystems)
        })
        .then(valueset_defs)
        .map(|((lib, usings, includes, contexts, params, codesystems), valuesets)| {
            (lib, usings, includes, contexts, params, codesystems, valuesets)
        })
        .then(code_defs)
        .map(|((lib, usings, includes, contexts, params, codesystems, valuesets), codes)| {
            (lib, usings, includes, contexts, params, codesystems, valuesets, codes)
        })
        .then(concept_defs)
        .map(
            |((lib, usings, includes, contexts, params, codesystems, valuesets, codes), concepts)| {
                (
                    lib, usings, includes, contexts, params, codesystems, valuesets, codes,
                    concepts,
                )
            },
        )
        .then(statements)
        .padded()
        .then_ignore(end())
        .map(
            |(
                (lib, usings, includes, contexts, params, codesystems, valuesets, codes, concepts),
                statements,
            )| {
                let mut library = Library::new();
                library.definition = lib;
                library.usings = usings;
                library.includes = includes;
                library.contexts = contexts;
                library.parameters = params;
                library.codesystems = codesystems;
                library.valuesets = valuesets;
                library.codes = codes;
                library.concepts = concepts;
                library.statements = statements;
                library
            },
        )
}

/// Parse library definition
fn library_definition<'a>(
) -> impl Parser<'a, &'a str, LibraryDefinition, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("library")
        .padded()
        .ignore_then(qualified_identifier_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .map(|(name, version)| LibraryDefinition { name, version })
}

/// Parse using definition
fn using_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<UsingDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("using")
        .padded()
        .ignore_then(identifier_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .map_with(|(model, version), e| {
            Spanned::new(
                UsingDefinition { model, version },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Matches any keyword that can start a library-level declaration, used to
/// stop an optional type-specifier from swallowing the next declaration's
/// leading keyword when no type is actually present.
fn declaration_keyword<'a>() -> impl Parser<'a, &'a str, &'a str, extra::Err<Rich<'a, char>>> + Clone
{
    choice((
        text::keyword("default"),
        text::keyword("context"),
        text::keyword("define"),
        text::keyword("parameter"),
        text::keyword("codesystem"),
        text::keyword("valueset"),
        text::keyword("code"),
        text::keyword("concept"),
        text::keyword("include"),
        text::keyword("public"),
        text::keyword("private"),
    ))
}

/// Parse an access modifier prefix (`public`/`private`), defaulting to public.
fn access_modifier_parser<'a>(
) -> impl Parser<'a, &'a str, AccessModifier, extra::Err<Rich<'a, char>>> + Clone {
    choice((
        text::keyword("public").to(AccessModifier::Public),
        text::keyword("private").to(AccessModifier::Private),
    ))
    .padded()
    .or_not()
    .map(|a| a.unwrap_or(AccessModifier::Public))
}

/// Parse an include definition: `include Id [version 'v'] [called Alias]`
fn include_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<IncludeDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("include")
        .padded()
        .ignore_then(qualified_identifier_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .then(
            text::keyword("called")
                .padded()
                .ignore_then(identifier_parser())
                .or_not(),
        )
        .map_with(|((library, version), alias), e| {
            Spanned::new(
                IncludeDefinition {
                    library,
                    version,
                    alias,
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse context definition
fn context_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ContextDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    text::keyword("context")
        .padded()
        .ignore_then(identifier_parser())
        .map_with(|ctx, e| {
            Spanned::new(
                ContextDefinition { context: ctx },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse parameter definition
fn parameter_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ParameterDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    access_modifier_parser()
        .then_ignore(text::keyword("parameter").padded())
        .then(identifier_parser())
        .then(
            type_specifier_parser()
                .and_is(declaration_keyword().not())
                .or_not(),
        )
        .then(
            text::keyword("default")
                .padded()
                .ignore_then(expression_parser())
                .or_not(),
        )
        .map_with(|(((access, name), type_specifier), default), e| {
            let span = Span::from(e.span().start..e.span().end);
            Spanned::new(
                ParameterDefinition {
                    access,
                    name,
                    type_specifier: type_specifier.map(|t| Spanned::new(t, span)),
                    default: default.map(Box::new),
                },
                span,
            )
        })
}

/// Parse a codesystem definition: `codesystem "Name": 'uri' [version 'v']`
fn codesystem_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<CodesystemDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    access_modifier_parser()
        .then_ignore(text::keyword("codesystem").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(string_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .map_with(|(((access, name), uri), version), e| {
            Spanned::new(
                CodesystemDefinition {
                    access,
                    name,
                    uri,
                    version,
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse a valueset definition:
/// `valueset "Name": 'uri' [version 'v'] [codesystems { CS1, CS2 }]`
fn valueset_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ValuesetDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    let codesystems = text::keyword("codesystems")
        .padded()
        .ignore_then(
            qualified_identifier_parser()
                .map(|name| CodeSystemRef { name })
                .separated_by(just(',').padded())
                .collect::<Vec<_>>()
                .delimited_by(just('{').padded(), just('}').padded()),
        )
        .or_not()
        .map(Option::unwrap_or_default);

    access_modifier_parser()
        .then_ignore(text::keyword("valueset").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(string_parser())
        .then(
            text::keyword("version")
                .padded()
                .ignore_then(version_specifier_parser())
                .or_not(),
        )
        .then(codesystems)
        .map_with(|((((access, name), uri), version), codesystems), e| {
            Spanned::new(
                ValuesetDefinition {
                    access,
                    name,
                    uri,
                    version,
                    codesystems,
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse a code definition: `code "Name": 'value' from "CS" [display 'text']`
fn code_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<CodeDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    access_modifier_parser()
        .then_ignore(text::keyword("code").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(string_parser())
        .then_ignore(text::keyword("from").padded())
        .then(qualified_identifier_parser())
        .then(
            text::keyword("display")
                .padded()
                .ignore_then(string_parser())
                .or_not(),
        )
        .map_with(|((((access, name), code), codesystem), display), e| {
            Spanned::new(
                CodeDefinition {
                    access,
                    name,
                    code,
                    codesystem,
                    display,
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse a concept definition: `concept "Name": { Code1, Code2 } [display 'text']`
fn concept_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ConceptDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    access_modifier_parser()
        .then_ignore(text::keyword("concept").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(
            qualified_identifier_parser()
                .separated_by(just(',').padded())
                .collect::<Vec<_>>()
                .delimited_by(just('{').padded(), just('}').padded()),
        )
        .then(
            text::keyword("display")
                .padded()
                .ignore_then(string_parser())
                .or_not(),
        )
        .map_with(|(((access, name), codes), display), e| {
            Spanned::new(
                ConceptDefinition {
                    access,
                    name,
                    codes,
                    display,
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse expression definition
fn expression_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<ExpressionDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    let access = choice((
        text::keyword("public").to(AccessModifier::Public),
        text::keyword("private").to(AccessModifier::Private),
    ))
    .padded()
    .or_not()
    .map(|a| a.unwrap_or(AccessModifier::Public));

    access
        .then_ignore(text::keyword("define").padded())
        .then(identifier_parser())
        .then_ignore(just(':').padded())
        .then(expression_parser())
        .map_with(|((access, name), expr), e| {
            Spanned::new(
                ExpressionDefinition {
                    access,
                    name,
                    expression: Box::new(expr),
                },
                Span::from(e.span().start..e.span().end),
            )
        })
}

/// Parse a single `Name Type` function parameter
fn function_parameter<'a>(
) -> impl Parser<'a, &'a str, FunctionParameter, extra::Err<Rich<'a, char>>> + Clone {
    identifier_parser()
        .then(type_specifier_parser())
        .map_with(|(name, type_specifier), e| FunctionParameter {
            name,
            type_specifier: Spanned::new(
                type_specifier,
                Span::from(e.span().start..e.span().end),
            ),
        })
}

/// Parse a function definition:
/// `define [fluent] function Name(Param Type, ...) [returns Type]: expr | external`
fn function_definition<'a>(
) -> impl Parser<'a, &'a str, Spanned<FunctionDefinition>, extra::Err<Rich<'a, char>>> + Clone {
    access_modifier_parser()
        .then_ignore(text::keyword("define").padded())
        .then(
            text::keyword("fluent")
                .padded()
                .or_not()
                .map(|f| f.is_some()),
        )
        .then_ignore(text::keyword("function").padded())
        .then(identifier_parser())
        .then(
            function_parameter()
                .separated_by(just(',').padded())
                .collect::<Vec<_>>()
                .delimited_by(just('(').padded(), just(')').padded()),
        )
        .then(
            text::keyword("returns")
                .padded()
                .ignore_then(type_specifier_parser())
                .or_not(),
        )
        .then_ignore(just(':').padded())
        .then(choice((
            text::keyword("external").to(None),
            expression_parser().map(Some),
        )))
        .map_with(
            |(((((access, fluent), name), parameters), return_type), body), e| {
                let span = Span::from(e.span().start..e.span().end);
                Spanned::new(
                    FunctionDefinition {
                        access,
                        fluent,
                        name,
                        parameters,
                        return_type: return_type.map(|t| Spanned::new(t, span)),
                        external: body.is_none(),
                        body: body.map(Box::new),
                    },
                    span,
                )
            },
        )
}

/// Parse either a function definition or a plain named expression definition,
/// trying the (longer) function form first since both start with `define`.
fn statement_parser<'a>(
) -> impl Parser<'a, &'a str, Spanned<Statement>, extra::Err<Rich<'a, char>>> + Clone {
    choice((
        function_definition().map(|s| Spanned::new(Statement::FunctionDef(s.inner), s.span)),
        expression_definition().map(|s| Spanned::new(Statement::ExpressionDef(s.inner), s.span)),
    ))
}
