//! Grammar productions for Codec schemas.
//!
//! Each construct has its own production built on the primitives in
//! [`lexical`](super::lexical). Productions commit with [`committed`] once
//! their leading keyword has matched, so an error inside a declaration is
//! reported where it happens instead of being backtracked into a vague
//! "expected declaration" at the keyword.
//!
//! The public entry points are [`parse_project`] for whole files and
//! [`parse_fragment`] for single productions.

use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{alt, cut_err, delimited, eof, opt, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, one_of, take_while},
};

use codec_core::{
    annotation::Annotation,
    options::Recovery,
    primitive::PrimitiveType,
    schema::{
        CollectionKind, CompareOp, ConstraintKind, InheritanceKind, InheritanceStrategy, Literal,
        OnDelete,
    },
};

use crate::{
    ast::{
        AbstractEntityDefinition, CodecProject, ConfigDefinition, ConstraintDefinition,
        EntityDefinition, FieldDefinition, FieldPath, FromClause, FunctionDefinition, Operand,
        ParameterDefinition, QueryBlock, RelationKind, RelationshipDefinition, SelectClause,
        SelectField, ServiceDefinition, Setting, Statement, TraitDefinition, TypeAlias, TypeRef,
        ViewDefinition, WhereClause,
    },
    error::{Diagnostic, ErrorCode},
    lexical::{
        Context, Error, IResult, Input, declaration_name, integer_literal, keyword, opaque_text,
        pascal_identifier, snake_identifier, spanned, string_literal, ws0, ws1,
    },
    span::{Span, Spanned},
};

/// Keywords that may start a top-level declaration.
const TOP_LEVEL_KEYWORDS: [&str; 8] = [
    "package", "type", "trait", "abstract", "entity", "service", "view", "config",
];

const TOP_LEVEL_EXPECTATION: &str = "a top-level declaration (`package`, `type`, `trait`, \
     `abstract entity`, `entity`, `service`, `view` or `config`)";

/// Run `parser` as the committed remainder of a production.
///
/// Any backtrack becomes a cut, labelled with the production being parsed.
fn committed<'src, O>(
    input: &mut Input<'src>,
    label: &'static str,
    parser: impl FnOnce(&mut Input<'src>) -> IResult<O>,
) -> IResult<O> {
    parser(input).map_err(|err| {
        err.cut().map(|mut err| {
            err.push(Context::Label(label));
            err
        })
    })
}

/// Parse a punctuation character after optional whitespace.
fn punct<'src>(c: char, label: &'static str) -> impl winnow::Parser<Input<'src>, char, Error> {
    preceded(ws0, c.context(Context::Label(label)))
}

/// Parse an optional trailing semicolon.
fn semicolon_opt(input: &mut Input<'_>) -> IResult<()> {
    opt(preceded(ws0, ';')).void().parse_next(input)
}

/// Parse `( parser )` with whitespace allowed inside the parentheses.
fn parenthesized<'src, O, P>(parser: P) -> impl winnow::Parser<Input<'src>, O, Error>
where
    P: winnow::Parser<Input<'src>, O, Error>,
{
    delimited(
        (ws0, '(', ws0),
        parser,
        (ws0, ')'.context(Context::Label("`)`"))),
    )
}

/// Parse a comma separated, non-empty list of PascalCase names.
fn pascal_list(input: &mut Input<'_>) -> IResult<Vec<Spanned<String>>> {
    separated(1.., pascal_identifier, (ws0, ',', ws0)).parse_next(input)
}

/// Parse a comma separated, non-empty list of snake_case names.
fn snake_list(input: &mut Input<'_>) -> IResult<Vec<Spanned<String>>> {
    separated(1.., snake_identifier, (ws0, ',', ws0)).parse_next(input)
}

/// Parse an optional `: A, B` supertype list, including trailing whitespace.
fn supertypes(input: &mut Input<'_>) -> IResult<Vec<Spanned<String>>> {
    opt(delimited((':', ws0), pascal_list, ws0))
        .map(Option::unwrap_or_default)
        .parse_next(input)
}

/// Parse a primitive type keyword, trying longer keywords first.
fn primitive_type(input: &mut Input<'_>) -> IResult<PrimitiveType> {
    for primitive in PrimitiveType::BY_LENGTH_DESC {
        let checkpoint = input.checkpoint();
        if keyword(primitive.name()).parse_next(input).is_ok() {
            return Ok(primitive);
        }
        input.reset(&checkpoint);
    }

    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Parse a type reference: a primitive keyword or a PascalCase name.
///
/// `StringList` is a named reference: the primitive `String` does not match
/// because it is not followed by a word boundary.
pub(crate) fn type_ref(input: &mut Input<'_>) -> IResult<Spanned<TypeRef>> {
    alt((
        spanned(primitive_type.map(TypeRef::Primitive)),
        pascal_identifier.map(|name| name.map(|name| TypeRef::Named(name.clone()))),
    ))
    .context(Context::Label("type"))
    .parse_next(input)
}

fn annotation_kind(input: &mut Input<'_>) -> IResult<Annotation> {
    alt((
        preceded(alt((keyword("min_len"), keyword("min"))), parenthesized(integer_literal))
            .map(|bound| Annotation::Min(*bound.inner())),
        preceded(alt((keyword("max_len"), keyword("max"))), parenthesized(integer_literal))
            .map(|bound| Annotation::Max(*bound.inner())),
        preceded(keyword("regex"), parenthesized(string_literal))
            .map(|pattern| Annotation::Regex(pattern.into_inner())),
        keyword("unique").value(Annotation::Unique),
    ))
    .context(Context::Label(
        "`min`, `max`, `min_len`, `max_len`, `regex` or `unique`",
    ))
    .parse_next(input)
}

/// Parse a single `constraint` annotation inside a field or alias block.
fn annotation(input: &mut Input<'_>) -> IResult<Spanned<Annotation>> {
    let start = input.current_token_start();
    keyword("constraint").parse_next(input)?;

    committed(input, "constraint", |input| {
        ws1.parse_next(input)?;
        let annotation = annotation_kind.parse_next(input)?;
        let end = input.current_token_start();
        Ok(Spanned::new(annotation, Span::new(start..end)))
    })
}

/// Parse a `{ constraint ... }` block. Every annotation is kept.
fn annotations(input: &mut Input<'_>) -> IResult<Vec<Spanned<Annotation>>> {
    '{'.parse_next(input)?;

    committed(input, "constraint block", |input| {
        ws0.parse_next(input)?;
        let annotations = repeat(0.., terminated(annotation, ws0)).parse_next(input)?;
        '}'.context(Context::Label("`constraint` or `}`"))
            .parse_next(input)?;
        Ok(annotations)
    })
}

fn opt_annotations(input: &mut Input<'_>) -> IResult<Vec<Spanned<Annotation>>> {
    opt(preceded(ws0, annotations))
        .map(Option::unwrap_or_default)
        .parse_next(input)
}

fn package_segment(input: &mut Input<'_>) -> IResult<()> {
    (
        one_of(|c: char| c.is_ascii_alphabetic()),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .void()
        .parse_next(input)
}

/// Parse a package declaration.
///
/// Syntax: `package Samples.People;`
fn package(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    keyword("package").parse_next(input)?;

    committed(input, "package declaration", |input| {
        ws1.parse_next(input)?;
        let name = spanned(
            (
                package_segment,
                repeat(0.., ('.', package_segment)).map(|()| ()),
            )
                .take()
                .map(|name: &str| name.to_string()),
        )
        .context(Context::Label("package name"))
        .parse_next(input)?;
        semicolon_opt.parse_next(input)?;
        Ok(name)
    })
}

/// Parse a type alias.
///
/// Syntax: `type Email = String { constraint max_len(254) }`
pub(crate) fn type_alias(input: &mut Input<'_>) -> IResult<TypeAlias> {
    keyword("type").parse_next(input)?;

    committed(input, "type alias", |input| {
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        punct('=', "`=`").parse_next(input)?;
        ws0.parse_next(input)?;
        let target = type_ref.parse_next(input)?;
        let annotations = opt_annotations.parse_next(input)?;

        Ok(TypeAlias {
            name,
            target,
            annotations,
        })
    })
}

/// Parse a field.
///
/// Syntax: `var name: String` or `val id: Uuid { constraint unique };`
pub(crate) fn field(input: &mut Input<'_>) -> IResult<FieldDefinition> {
    let mutable = alt((keyword("var").value(true), keyword("val").value(false)))
        .parse_next(input)?;

    committed(input, "field", |input| {
        ws1.parse_next(input)?;
        let name = snake_identifier.parse_next(input)?;
        punct(':', "`:`").parse_next(input)?;
        ws0.parse_next(input)?;
        let ty = type_ref.parse_next(input)?;
        let annotations = opt_annotations.parse_next(input)?;
        semicolon_opt.parse_next(input)?;

        Ok(FieldDefinition {
            name,
            ty,
            mutable,
            annotations,
        })
    })
}

/// Parse a trait.
///
/// Syntax: `trait Named : Auditable { var name: String }`
pub(crate) fn trait_definition(input: &mut Input<'_>) -> IResult<TraitDefinition> {
    keyword("trait").parse_next(input)?;

    committed(input, "trait declaration", |input| {
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        ws0.parse_next(input)?;
        let extends = supertypes.parse_next(input)?;
        '{'.context(Context::Label("`{`")).parse_next(input)?;
        ws0.parse_next(input)?;
        let fields = repeat(0.., terminated(field, ws0)).parse_next(input)?;
        '}'.context(Context::Label("field or `}`"))
            .parse_next(input)?;

        Ok(TraitDefinition {
            name,
            extends,
            fields,
        })
    })
}

/// Parse an inheritance clause.
///
/// Syntax: `inheritance joined_table` or
/// `inheritance single_table discriminator kind`
fn inheritance(input: &mut Input<'_>) -> IResult<Spanned<InheritanceStrategy>> {
    let start = input.current_token_start();
    keyword("inheritance").parse_next(input)?;

    committed(input, "inheritance clause", |input| {
        ws1.parse_next(input)?;
        let strategy = alt((
            keyword("joined_table").map(|()| InheritanceStrategy::joined_table()),
            preceded(
                keyword("single_table"),
                opt(preceded(
                    (ws1, keyword("discriminator")),
                    cut_err(preceded(ws1, snake_identifier)),
                )),
            )
            .map(|discriminator| {
                InheritanceStrategy::new(
                    InheritanceKind::SingleTable,
                    discriminator.map(Spanned::into_inner),
                )
            }),
        ))
        .context(Context::Label("`joined_table` or `single_table`"))
        .parse_next(input)?;
        let end = input.current_token_start();
        semicolon_opt.parse_next(input)?;

        Ok(Spanned::new(strategy, Span::new(start..end)))
    })
}

enum AbstractMember {
    Field(FieldDefinition),
    Inheritance(Spanned<InheritanceStrategy>),
}

/// Parse an abstract entity.
///
/// Syntax: `abstract entity Person : Named { inheritance joined_table; ... }`
pub(crate) fn abstract_entity(input: &mut Input<'_>) -> IResult<AbstractEntityDefinition> {
    keyword("abstract").parse_next(input)?;

    committed(input, "abstract entity declaration", |input| {
        ws1.parse_next(input)?;
        keyword("entity")
            .context(Context::Label("`entity`"))
            .parse_next(input)?;
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        ws0.parse_next(input)?;
        let traits = supertypes.parse_next(input)?;
        '{'.context(Context::Label("`{`")).parse_next(input)?;
        ws0.parse_next(input)?;
        let members: Vec<AbstractMember> = repeat(
            0..,
            terminated(
                alt((
                    inheritance.map(AbstractMember::Inheritance),
                    field.map(AbstractMember::Field),
                )),
                ws0,
            ),
        )
        .parse_next(input)?;
        '}'.context(Context::Label("field, `inheritance` or `}`"))
            .parse_next(input)?;

        let mut fields = Vec::new();
        let mut strategies = Vec::new();
        for member in members {
            match member {
                AbstractMember::Field(field) => fields.push(field),
                AbstractMember::Inheritance(strategy) => strategies.push(strategy),
            }
        }

        Ok(AbstractEntityDefinition {
            name,
            traits,
            fields,
            strategies,
        })
    })
}

fn relation_kind(input: &mut Input<'_>) -> IResult<RelationKind> {
    alt((
        keyword("one").value(RelationKind::Single),
        keyword("many").value(RelationKind::Collection(CollectionKind::List)),
        keyword("set").value(RelationKind::Collection(CollectionKind::Set)),
        preceded(keyword("map"), parenthesized(type_ref)).map(RelationKind::Dictionary),
    ))
    .context(Context::Label("`one`, `many`, `set` or `map(Key)`"))
    .parse_next(input)
}

fn on_delete(input: &mut Input<'_>) -> IResult<OnDelete> {
    alt((
        keyword("cascade").value(OnDelete::Cascade),
        keyword("set_null").value(OnDelete::SetNull),
        keyword("restrict").value(OnDelete::Restrict),
        keyword("none").value(OnDelete::None),
    ))
    .context(Context::Label("`cascade`, `set_null`, `restrict` or `none`"))
    .parse_next(input)
}

enum RelationOption {
    ForeignKey(Spanned<String>),
    MappedBy(Spanned<String>),
    OnDelete(OnDelete),
}

fn relation_option(input: &mut Input<'_>) -> IResult<RelationOption> {
    alt((
        preceded(keyword("foreign_key"), parenthesized(snake_identifier))
            .map(RelationOption::ForeignKey),
        preceded(keyword("mapped_by"), parenthesized(snake_identifier))
            .map(RelationOption::MappedBy),
        preceded(keyword("on_delete"), parenthesized(on_delete)).map(RelationOption::OnDelete),
    ))
    .parse_next(input)
}

/// Parse a relationship.
///
/// Syntax: `relation documents: many Document mapped_by(owner) on_delete(cascade)`
///
/// A repeated option overrides the earlier one.
fn relationship(input: &mut Input<'_>) -> IResult<RelationshipDefinition> {
    keyword("relation").parse_next(input)?;

    committed(input, "relationship", |input| {
        ws1.parse_next(input)?;
        let name = snake_identifier.parse_next(input)?;
        punct(':', "`:`").parse_next(input)?;
        ws0.parse_next(input)?;
        let kind = relation_kind.parse_next(input)?;
        ws1.parse_next(input)?;
        let target = pascal_identifier
            .context(Context::Label("target entity"))
            .parse_next(input)?;
        let options: Vec<RelationOption> =
            repeat(0.., preceded(ws0, relation_option)).parse_next(input)?;
        semicolon_opt.parse_next(input)?;

        let mut relationship = RelationshipDefinition {
            name,
            kind,
            target,
            foreign_key: None,
            mapped_by: None,
            on_delete: OnDelete::default(),
        };
        for option in options {
            match option {
                RelationOption::ForeignKey(column) => relationship.foreign_key = Some(column),
                RelationOption::MappedBy(property) => relationship.mapped_by = Some(property),
                RelationOption::OnDelete(action) => relationship.on_delete = action,
            }
        }

        Ok(relationship)
    })
}

/// Parse an entity constraint.
///
/// Syntax: `constraint unique(email)` or `constraint primary_key(id)`
fn entity_constraint(input: &mut Input<'_>) -> IResult<ConstraintDefinition> {
    keyword("constraint").parse_next(input)?;

    committed(input, "constraint", |input| {
        ws1.parse_next(input)?;
        let kind = alt((
            keyword("primary_key").value(ConstraintKind::PrimaryKey),
            keyword("unique").value(ConstraintKind::Unique),
            keyword("index").value(ConstraintKind::Index),
        ))
        .context(Context::Label("`primary_key`, `unique` or `index`"))
        .parse_next(input)?;
        let columns = parenthesized(snake_list.context(Context::Label("column list")))
            .parse_next(input)?;
        semicolon_opt.parse_next(input)?;

        Ok(ConstraintDefinition::new(kind, columns))
    })
}

enum EntityMember {
    Field(FieldDefinition),
    Relationship(RelationshipDefinition),
    Constraint(ConstraintDefinition),
}

/// Parse an entity.
///
/// Syntax: `entity Individual : Person, Named { fields, relations, constraints }`
pub(crate) fn entity(input: &mut Input<'_>) -> IResult<EntityDefinition> {
    keyword("entity").parse_next(input)?;

    committed(input, "entity declaration", |input| {
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        ws0.parse_next(input)?;
        let supertypes = supertypes.parse_next(input)?;
        '{'.context(Context::Label("`{`")).parse_next(input)?;
        ws0.parse_next(input)?;
        let members: Vec<EntityMember> = repeat(
            0..,
            terminated(
                alt((
                    field.map(EntityMember::Field),
                    relationship.map(EntityMember::Relationship),
                    entity_constraint.map(EntityMember::Constraint),
                )),
                ws0,
            ),
        )
        .parse_next(input)?;
        '}'.context(Context::Label("field, `relation`, `constraint` or `}`"))
            .parse_next(input)?;

        let mut entity = EntityDefinition {
            name,
            supertypes,
            fields: Vec::new(),
            relationships: Vec::new(),
            constraints: Vec::new(),
        };
        for member in members {
            match member {
                EntityMember::Field(field) => entity.fields.push(field),
                EntityMember::Relationship(relationship) => {
                    entity.relationships.push(relationship)
                }
                EntityMember::Constraint(constraint) => entity.constraints.push(constraint),
            }
        }

        Ok(entity)
    })
}

/// Parse a `{ statements }` block.
fn block(input: &mut Input<'_>) -> IResult<Vec<Statement>> {
    '{'.context(Context::Label("`{`")).parse_next(input)?;
    ws0.parse_next(input)?;
    let statements = repeat(0.., terminated(statement, ws0)).parse_next(input)?;
    '}'.context(Context::Label("`if`, `for`, `transaction` or `}`"))
        .parse_next(input)?;
    Ok(statements)
}

fn if_statement(input: &mut Input<'_>) -> IResult<Statement> {
    keyword("if").parse_next(input)?;

    committed(input, "`if` statement", |input| {
        ws1.parse_next(input)?;
        let condition = opaque_text.parse_next(input)?;
        ws0.parse_next(input)?;
        let then_branch = block.parse_next(input)?;
        let else_branch = opt(preceded((ws0, keyword("else"), ws0), cut_err(block)))
            .parse_next(input)?
            .unwrap_or_default();

        Ok(Statement::If {
            condition: condition.into_inner(),
            then_branch,
            else_branch,
        })
    })
}

fn for_statement(input: &mut Input<'_>) -> IResult<Statement> {
    keyword("for").parse_next(input)?;

    committed(input, "`for` loop", |input| {
        ws1.parse_next(input)?;
        let item = snake_identifier.parse_next(input)?;
        ws1.parse_next(input)?;
        keyword("in")
            .context(Context::Label("`in`"))
            .parse_next(input)?;
        ws1.parse_next(input)?;
        let collection = opaque_text.parse_next(input)?;
        ws0.parse_next(input)?;
        let body = block.parse_next(input)?;

        Ok(Statement::ForEach {
            item: item.into_inner(),
            collection: collection.into_inner(),
            body,
        })
    })
}

fn transaction_statement(input: &mut Input<'_>) -> IResult<Statement> {
    keyword("transaction").parse_next(input)?;

    committed(input, "`transaction` block", |input| {
        ws0.parse_next(input)?;
        let body = block.parse_next(input)?;
        Ok(Statement::Transaction { body })
    })
}

fn statement(input: &mut Input<'_>) -> IResult<Statement> {
    alt((if_statement, for_statement, transaction_statement)).parse_next(input)
}

fn parameter(input: &mut Input<'_>) -> IResult<ParameterDefinition> {
    let name = snake_identifier.parse_next(input)?;
    punct(':', "`:`").parse_next(input)?;
    ws0.parse_next(input)?;
    let ty = type_ref.parse_next(input)?;
    Ok(ParameterDefinition { name, ty })
}

/// Parse a service function.
///
/// Syntax: `fn register(name: String) -> Individual { transaction { } }`
fn function(input: &mut Input<'_>) -> IResult<FunctionDefinition> {
    keyword("fn").parse_next(input)?;

    committed(input, "function", |input| {
        ws1.parse_next(input)?;
        let name = snake_identifier.parse_next(input)?;
        punct('(', "`(`").parse_next(input)?;
        ws0.parse_next(input)?;
        let parameters = separated(0.., parameter, (ws0, ',', ws0)).parse_next(input)?;
        punct(')', "parameter or `)`").parse_next(input)?;
        ws0.parse_next(input)?;
        let returns = opt(delimited(("->", ws0), cut_err(type_ref), ws0)).parse_next(input)?;
        let body = block.parse_next(input)?;

        Ok(FunctionDefinition {
            name,
            parameters,
            returns,
            body,
        })
    })
}

/// Parse a service.
///
/// Syntax: `service Registry { fn ... }`
pub(crate) fn service(input: &mut Input<'_>) -> IResult<ServiceDefinition> {
    keyword("service").parse_next(input)?;

    committed(input, "service declaration", |input| {
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        punct('{', "`{`").parse_next(input)?;
        ws0.parse_next(input)?;
        let functions = repeat(0.., terminated(function, ws0)).parse_next(input)?;
        '}'.context(Context::Label("`fn` or `}`"))
            .parse_next(input)?;

        Ok(ServiceDefinition { name, functions })
    })
}

/// Parse a field path: `name`, `p.name` or `Person.name`.
fn field_path(input: &mut Input<'_>) -> IResult<FieldPath> {
    let qualifier = opt(terminated(
        alt((pascal_identifier, snake_identifier)),
        '.',
    ))
    .parse_next(input)?;
    let field = snake_identifier
        .context(Context::Label("field path"))
        .parse_next(input)?;
    Ok(FieldPath { qualifier, field })
}

/// Parse a comparison operator, trying longer operators first.
fn compare_op(input: &mut Input<'_>) -> IResult<CompareOp> {
    for op in CompareOp::BY_LENGTH_DESC {
        if literal::<_, _, Error>(op.symbol())
            .parse_next(input)
            .is_ok()
        {
            return Ok(op);
        }
    }

    Err(ErrMode::Backtrack(ContextError::new()))
}

fn operand(input: &mut Input<'_>) -> IResult<Operand> {
    alt((
        alt((
            string_literal.map(|value| value.map(|value| Literal::String(value.clone()))),
            integer_literal.map(|value| value.map(|value| Literal::Integer(*value))),
            spanned(keyword("true").value(Literal::Bool(true))),
            spanned(keyword("false").value(Literal::Bool(false))),
            spanned(keyword("null").value(Literal::Null)),
        ))
        .map(Operand::Literal),
        field_path.map(Operand::Field),
    ))
    .context(Context::Label("literal or field path"))
    .parse_next(input)
}

fn from_clause(input: &mut Input<'_>) -> IResult<FromClause> {
    keyword("from").parse_next(input)?;

    committed(input, "`from` clause", |input| {
        ws1.parse_next(input)?;
        let entity = pascal_identifier.parse_next(input)?;
        let alias = opt(preceded(
            (ws1, keyword("as")),
            cut_err(preceded(ws1, snake_identifier)),
        ))
        .parse_next(input)?;
        Ok(FromClause { entity, alias })
    })
}

fn where_clause(input: &mut Input<'_>) -> IResult<WhereClause> {
    keyword("where").parse_next(input)?;

    committed(input, "`where` clause", |input| {
        ws1.parse_next(input)?;
        let field = field_path.parse_next(input)?;
        ws0.parse_next(input)?;
        let op = compare_op
            .context(Context::Label("comparison operator"))
            .parse_next(input)?;
        ws0.parse_next(input)?;
        let operand = operand.parse_next(input)?;
        Ok(WhereClause { field, op, operand })
    })
}

fn select_field(input: &mut Input<'_>) -> IResult<SelectField> {
    let path = field_path.parse_next(input)?;
    let alias = opt(preceded(
        (ws1, keyword("as")),
        cut_err(preceded(ws1, snake_identifier)),
    ))
    .parse_next(input)?;
    Ok(SelectField { path, alias })
}

fn select_clause(input: &mut Input<'_>) -> IResult<SelectClause> {
    keyword("select").parse_next(input)?;

    committed(input, "`select` clause", |input| {
        ws1.parse_next(input)?;
        let fields = separated(1.., select_field, (ws0, ',', ws0)).parse_next(input)?;
        Ok(SelectClause { fields })
    })
}

/// Parse a query block.
///
/// Syntax: `query { from Person as p where p.age >= 18 select p.name }`
fn query_block(input: &mut Input<'_>) -> IResult<QueryBlock> {
    keyword("query").parse_next(input)?;

    committed(input, "query block", |input| {
        punct('{', "`{`").parse_next(input)?;
        ws0.parse_next(input)?;
        let from = repeat(1.., terminated(from_clause, ws0))
            .context(Context::Label("`from` clause"))
            .parse_next(input)?;
        let filters = repeat(0.., terminated(where_clause, ws0)).parse_next(input)?;
        let select = select_clause
            .context(Context::Label("`where` or `select` clause"))
            .parse_next(input)?;
        punct('}', "`,` or `}`").parse_next(input)?;

        Ok(QueryBlock {
            from,
            filters,
            select,
        })
    })
}

/// Parse a view. The single query block may sit among the fields.
///
/// Syntax: `view Adults : Named { var name: String query { ... } }`
pub(crate) fn view(input: &mut Input<'_>) -> IResult<ViewDefinition> {
    keyword("view").parse_next(input)?;

    committed(input, "view declaration", |input| {
        ws1.parse_next(input)?;
        let name = declaration_name.parse_next(input)?;
        ws0.parse_next(input)?;
        let traits = supertypes.parse_next(input)?;
        '{'.context(Context::Label("`{`")).parse_next(input)?;
        ws0.parse_next(input)?;
        let mut fields: Vec<FieldDefinition> =
            repeat(0.., terminated(field, ws0)).parse_next(input)?;
        let query = query_block
            .context(Context::Label("field or `query` block"))
            .parse_next(input)?;
        ws0.parse_next(input)?;
        let trailing: Vec<FieldDefinition> =
            repeat(0.., terminated(field, ws0)).parse_next(input)?;
        fields.extend(trailing);
        '}'.context(Context::Label("field or `}`"))
            .parse_next(input)?;

        Ok(ViewDefinition {
            name,
            traits,
            fields,
            query,
        })
    })
}

fn setting(input: &mut Input<'_>) -> IResult<Setting> {
    let key = snake_identifier.parse_next(input)?;

    committed(input, "setting", |input| {
        punct('=', "`=`").parse_next(input)?;
        ws0.parse_next(input)?;
        let value = string_literal.parse_next(input)?;
        semicolon_opt.parse_next(input)?;
        Ok(Setting { key, value })
    })
}

/// Parse a config block.
///
/// Syntax: `config { schema = "people" }`
pub(crate) fn config(input: &mut Input<'_>) -> IResult<ConfigDefinition> {
    keyword("config").parse_next(input)?;

    committed(input, "config block", |input| {
        punct('{', "`{`").parse_next(input)?;
        ws0.parse_next(input)?;
        let settings = repeat(0.., terminated(setting, ws0)).parse_next(input)?;
        '}'.context(Context::Label("setting or `}`"))
            .parse_next(input)?;
        Ok(ConfigDefinition { settings })
    })
}

enum Declaration {
    Package(Spanned<String>),
    TypeAlias(TypeAlias),
    Trait(TraitDefinition),
    AbstractEntity(AbstractEntityDefinition),
    Entity(EntityDefinition),
    Service(ServiceDefinition),
    View(ViewDefinition),
    Config(ConfigDefinition),
}

fn declaration(input: &mut Input<'_>) -> IResult<Declaration> {
    alt((
        package.map(Declaration::Package),
        type_alias.map(Declaration::TypeAlias),
        trait_definition.map(Declaration::Trait),
        abstract_entity.map(Declaration::AbstractEntity),
        entity.map(Declaration::Entity),
        service.map(Declaration::Service),
        view.map(Declaration::View),
        config.map(Declaration::Config),
    ))
    .parse_next(input)
}

impl CodecProject {
    fn add(&mut self, declaration: Declaration) {
        match declaration {
            Declaration::Package(name) => self.packages.push(name),
            Declaration::TypeAlias(alias) => self.type_aliases.push(alias),
            Declaration::Trait(definition) => self.traits.push(definition),
            Declaration::AbstractEntity(definition) => self.abstract_entities.push(definition),
            Declaration::Entity(definition) => self.entities.push(definition),
            Declaration::Service(definition) => self.services.push(definition),
            Declaration::View(definition) => self.views.push(definition),
            Declaration::Config(definition) => self.configs.push(definition),
        }
    }
}

/// Parse a whole source file.
///
/// With [`Recovery::Abort`] parsing stops at the first syntax error. With
/// [`Recovery::SkipDeclaration`] a broken declaration is reported and skipped,
/// and parsing resumes at the next line starting with a top-level keyword.
///
/// Returns the (possibly partial) project with every syntax diagnostic.
pub(crate) fn parse_project(source: &str, recovery: Recovery) -> (CodecProject, Vec<Diagnostic>) {
    let mut input = LocatingSlice::new(source);
    let mut project = CodecProject::default();
    let mut diagnostics = Vec::new();

    loop {
        if let Err(err) = ws0.parse_next(&mut input) {
            let position = input.current_token_start();
            diagnostics.push(convert_error(err, source, position, TOP_LEVEL_EXPECTATION));
            break;
        }
        if input.eof_offset() == 0 {
            break;
        }

        let checkpoint = input.checkpoint();
        let declaration_start = input.current_token_start();

        match declaration.parse_next(&mut input) {
            Ok(declaration) => {
                trace!(offset = declaration_start; "Parsed declaration");
                project.add(declaration);
            }
            Err(err) => {
                let position = input.current_token_start();
                diagnostics.push(convert_error(err, source, position, TOP_LEVEL_EXPECTATION));

                if recovery == Recovery::Abort {
                    break;
                }

                let resume = resume_offset(source, declaration_start, position);
                input.reset(&checkpoint);
                let skipped = input.next_slice(resume - declaration_start);
                debug!(
                    offset = declaration_start,
                    skipped = skipped.len();
                    "Skipped broken declaration"
                );
            }
        }
    }

    (project, diagnostics)
}

fn fragment<'src, O>(
    input: &mut Input<'src>,
    parser: &mut impl FnMut(&mut Input<'src>) -> IResult<O>,
) -> IResult<O> {
    ws0.parse_next(input)?;
    let output = parser(input)?;
    ws0.parse_next(input)?;
    eof.context(Context::Label("end of input"))
        .parse_next(input)?;
    Ok(output)
}

/// Parse `source` with a single production, requiring the whole input to be
/// consumed. Surrounding whitespace and comments are allowed.
pub(crate) fn parse_fragment<O>(
    source: &str,
    expected: &'static str,
    mut parser: impl FnMut(&mut Input<'_>) -> IResult<O>,
) -> Result<O, Diagnostic> {
    let mut input = LocatingSlice::new(source);
    match fragment(&mut input, &mut parser) {
        Ok(output) => Ok(output),
        Err(err) => {
            let position = input.current_token_start();
            Err(convert_error(err, source, position, expected))
        }
    }
}

/// Find where parsing resumes after a broken declaration.
///
/// Scanning starts on the line of the error if that line lies past the start
/// of the declaration, otherwise on the line after the declaration starts.
/// The first line whose first word is a top-level keyword wins.
fn resume_offset(source: &str, declaration_start: usize, error_position: usize) -> usize {
    let error_line_start = source[..error_position]
        .rfind('\n')
        .map_or(0, |newline| newline + 1);

    let mut offset = if error_line_start > declaration_start {
        error_line_start
    } else {
        next_line(source, declaration_start)
    };

    while offset < source.len() {
        if starts_with_top_level_keyword(&source[offset..]) {
            return offset;
        }
        offset = next_line(source, offset);
    }

    source.len()
}

fn next_line(source: &str, from: usize) -> usize {
    source[from..]
        .find('\n')
        .map_or(source.len(), |newline| from + newline + 1)
}

fn starts_with_top_level_keyword(line: &str) -> bool {
    let line = line.trim_start_matches([' ', '\t']);
    TOP_LEVEL_KEYWORDS.iter().any(|keyword| {
        line.strip_prefix(keyword).is_some_and(|rest| {
            !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        })
    })
}

/// Span of the word (or single character) starting at `position`.
fn token_span(source: &str, position: usize) -> Span {
    let rest = &source[position..];
    let word_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let len = if word_len > 0 {
        word_len
    } else {
        rest.chars().next().map_or(0, char::len_utf8)
    };
    Span::new(position..position + len)
}

/// Convert a winnow error into a diagnostic.
///
/// Lexical errors keep their own code and cover from their recorded start to
/// the error position. Other errors are reported at the token under the error
/// position: `E101` at end of input, `E100` otherwise. The innermost label
/// names what was expected, the outermost the production being parsed.
fn convert_error(error: Error, source: &str, position: usize, fallback: &str) -> Diagnostic {
    let err = match error {
        ErrMode::Backtrack(err) | ErrMode::Cut(err) => err,
        ErrMode::Incomplete(_) => {
            // Not reachable with complete input, which is all we parse.
            let end = source.len();
            return Diagnostic::error("incomplete input")
                .with_code(ErrorCode::E101)
                .with_label(Span::new(end..end), "input ends here");
        }
    };

    let lexical = err.context().find_map(|ctx| match ctx {
        Context::Lexical(lexical) => Some(lexical),
        Context::Label(_) => None,
    });
    if let Some(lexical) = lexical {
        let end = if lexical.code == ErrorCode::E002 {
            source[position..]
                .chars()
                .next()
                .map_or(position, |c| position + c.len_utf8())
        } else {
            position
        };
        let span = Span::new(lexical.start..end.max(lexical.start + 1).min(source.len()));
        let diagnostic = Diagnostic::error(lexical.message)
            .with_code(lexical.code)
            .with_label(span, lexical.message);
        return match lexical.help {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        };
    }

    let labels: Vec<&str> = err
        .context()
        .filter_map(|ctx| match ctx {
            Context::Label(label) => Some(*label),
            Context::Lexical(_) => None,
        })
        .collect();
    let expected = labels.first().copied().unwrap_or(fallback);

    let diagnostic = if position >= source.len() {
        Diagnostic::error(format!("unexpected end of input: expected {expected}"))
            .with_code(ErrorCode::E101)
            .with_label(Span::new(source.len()..source.len()), "input ends here")
    } else {
        let span = token_span(source, position);
        let found = &source[span.start()..span.end()];
        Diagnostic::error(format!("unexpected `{found}`: expected {expected}"))
            .with_code(ErrorCode::E100)
            .with_label(span, format!("expected {expected}"))
    };

    match labels.last() {
        Some(outer) if labels.len() > 1 => diagnostic.with_help(format!("while parsing {outer}")),
        _ => diagnostic,
    }
}
