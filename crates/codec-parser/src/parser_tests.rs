//! Scenario tests for the Codec grammar.
//!
//! These tests drive whole sources through the public parse entry points and
//! check both the trees they build and the diagnostics they report.

use codec_core::{
    annotation::Annotation,
    primitive::PrimitiveType,
    schema::{CollectionKind, CompareOp, InheritanceKind, Literal, OnDelete, RelationSide},
};

use crate::{
    ParseConfig, Parsed, Recovery,
    ast::{CodecProject, Operand, RelationKind, Statement, TypeRef},
    error::{Diagnostic, ErrorCode},
    parse, parse_abstract_entity, parse_config, parse_entity, parse_field, parse_service,
    parse_trait, parse_type_alias, parse_type_ref, parse_view, parse_with_config,
};

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) -> CodecProject {
    match parse(source) {
        Ok(project) => project,
        Err(err) => panic!("Expected parsing to succeed, but got error: {err}"),
    }
}

/// Helper function to parse a source string and assert failure, returning
/// the single diagnostic reported.
fn assert_parse_fails(source: &str) -> Diagnostic {
    match parse(source) {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(err) => {
            assert_eq!(err.diagnostics().len(), 1, "abort mode reports one error");
            err.into_diagnostics().remove(0)
        }
    }
}

fn parse_recovering(source: &str) -> Parsed {
    parse_with_config(source, &ParseConfig::new(Recovery::SkipDeclaration))
        .expect("recovering parse always succeeds")
}

mod declaration_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let project = assert_parses_successfully("");
        assert!(project.is_empty());

        let project = assert_parses_successfully("  // only a comment\n\n");
        assert!(project.is_empty());
    }

    #[test]
    fn test_package_declaration() {
        let project = assert_parses_successfully("package Samples.PersonManagement;");
        assert_eq!(
            project.package().map(|name| name.as_str()),
            Some("Samples.PersonManagement")
        );

        let project = assert_parses_successfully("package samples_v2");
        assert_eq!(project.package().map(|name| name.as_str()), Some("samples_v2"));
    }

    #[test]
    fn test_declarations_in_any_order() {
        let source = r#"
            entity Document { val id: Uuid }
            config { schema = "people" }
            type Email = String
            trait Named { var name: String }
            package Samples;
            abstract entity Person : Named { inheritance joined_table }
            service Registry { fn ping() { } }
            view Names { query { from Person select name } }
            type Phone = String
        "#;

        let project = assert_parses_successfully(source);
        assert_eq!(project.type_aliases.len(), 2);
        assert_eq!(project.traits.len(), 1);
        assert_eq!(project.abstract_entities.len(), 1);
        assert_eq!(project.entities.len(), 1);
        assert_eq!(project.services.len(), 1);
        assert_eq!(project.views.len(), 1);
        assert_eq!(project.configs.len(), 1);
        assert_eq!(project.declaration_count(), 9);
    }

    #[test]
    fn test_duplicate_declarations_are_kept_for_the_resolver() {
        let source = "package A;\npackage B;\ntype Email = String\ntype Email = Int32\n";
        let project = assert_parses_successfully(source);
        assert_eq!(project.packages.len(), 2);
        assert_eq!(project.type_aliases.len(), 2);
    }

    #[test]
    fn test_comments_between_declarations() {
        let source = r#"
            // aliases
            type Email = String // trailing comment
            // entities
            entity Person {
                // identity
                val id: Uuid
            }
        "#;
        let project = assert_parses_successfully(source);
        assert_eq!(project.entities[0].fields.len(), 1);
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        let diag = assert_parse_fails("entityIndividual { }");
        assert_eq!(diag.code(), Some(ErrorCode::E100));

        let diag = assert_parse_fails("typeEmail = String");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
    }
}

mod type_tests {
    use super::*;

    #[test]
    fn test_primitive_type_refs() {
        for (source, expected) in [
            ("String", PrimitiveType::String),
            ("Int64", PrimitiveType::Int64),
            ("UInt8", PrimitiveType::UInt8),
            ("DateTime", PrimitiveType::DateTime),
            ("Date", PrimitiveType::Date),
            ("ByteArray", PrimitiveType::ByteArray),
        ] {
            assert_eq!(parse_type_ref(source).unwrap(), TypeRef::Primitive(expected));
        }
    }

    #[test]
    fn test_primitive_prefix_is_a_named_reference() {
        assert_eq!(
            parse_type_ref("StringList").unwrap(),
            TypeRef::Named("StringList".to_string())
        );
        assert_eq!(
            parse_type_ref("Int32Range").unwrap(),
            TypeRef::Named("Int32Range".to_string())
        );
    }

    #[test]
    fn test_type_ref_rejects_other_identifier_classes() {
        assert!(parse_type_ref("string").is_err());
        assert!(parse_type_ref("Snake_Case").is_err());
        assert!(parse_type_ref("String garbage").is_err());
    }

    #[test]
    fn test_type_alias_with_annotations() {
        let alias = parse_type_alias(
            r#"type Email = String {
                constraint min_len(3)
                constraint max_len(254)
                constraint regex("^[^@]+@[^@]+$")
            }"#,
        )
        .unwrap();

        assert_eq!(alias.name.as_str(), "Email");
        assert_eq!(alias.target.inner(), &TypeRef::Primitive(PrimitiveType::String));
        let annotations: Vec<&Annotation> = alias.annotations.iter().map(|a| a.inner()).collect();
        assert_eq!(
            annotations,
            [
                &Annotation::Min(3),
                &Annotation::Max(254),
                &Annotation::Regex("^[^@]+@[^@]+$".to_string()),
            ]
        );
    }

    #[test]
    fn test_alias_of_alias() {
        let alias = parse_type_alias("type WorkEmail = Email { constraint unique }").unwrap();
        assert_eq!(alias.target.inner(), &TypeRef::Named("Email".to_string()));
        assert_eq!(alias.annotations[0].inner(), &Annotation::Unique);
    }

    #[test]
    fn test_min_and_max_bounds() {
        let alias = parse_type_alias("type Age = Int32 { constraint min(-1) constraint max(150) }")
            .unwrap();
        let annotations: Vec<&Annotation> = alias.annotations.iter().map(|a| a.inner()).collect();
        assert_eq!(annotations, [&Annotation::Min(-1), &Annotation::Max(150)]);
    }

    #[test]
    fn test_type_alias_rejects_snake_case_name() {
        assert!(parse_type_alias("type email = String").is_err());
    }

    #[test]
    fn test_unknown_annotation_is_rejected() {
        let err = parse_type_alias("type Age = Int32 { constraint between(1) }").unwrap_err();
        assert!(err.has_code(ErrorCode::E100));
    }
}

mod field_tests {
    use super::*;

    #[test]
    fn test_mutable_and_immutable_fields() {
        let field = parse_field("var name: String").unwrap();
        assert!(field.mutable);
        assert_eq!(field.name.as_str(), "name");

        let field = parse_field("val id: Uuid;").unwrap();
        assert!(!field.mutable);
        assert_eq!(field.ty.inner(), &TypeRef::Primitive(PrimitiveType::Uuid));
    }

    #[test]
    fn test_field_with_annotation_block() {
        let field = parse_field("var email: Email { constraint unique }").unwrap();
        assert_eq!(field.ty.inner(), &TypeRef::Named("Email".to_string()));
        assert_eq!(field.annotations.len(), 1);
    }

    #[test]
    fn test_field_name_must_be_snake_case() {
        assert!(parse_field("var firstName: String").is_err());
        assert!(parse_field("var Name: String").is_err());
        assert!(parse_field("var first_name: String").is_ok());
    }

    #[test]
    fn test_field_requires_whitespace_after_keyword() {
        assert!(parse_field("varname: String").is_err());
    }

    #[test]
    fn test_field_span_covers_name_and_type() {
        let field = parse_field("  var name: String").unwrap();
        assert_eq!(field.span().start(), 6);
        assert_eq!(field.span().end(), 18);
    }
}

mod trait_and_entity_tests {
    use super::*;

    #[test]
    fn test_trait_with_extensions() {
        let definition = parse_trait(
            r#"trait Contactable : Named, Auditable {
                var email: Email
                var phone: String
            }"#,
        )
        .unwrap();

        let extends: Vec<&str> = definition.extends.iter().map(|e| e.as_str()).collect();
        assert_eq!(extends, ["Named", "Auditable"]);
        assert_eq!(definition.fields.len(), 2);
    }

    #[test]
    fn test_abstract_entity_with_single_table_inheritance() {
        let definition = parse_abstract_entity(
            r#"abstract entity Party : Named {
                inheritance single_table discriminator kind;
                val id: Uuid
            }"#,
        )
        .unwrap();

        let strategy = definition.strategy();
        assert_eq!(strategy.kind(), InheritanceKind::SingleTable);
        assert_eq!(strategy.discriminator(), Some("kind"));
        assert_eq!(definition.fields.len(), 1);
    }

    #[test]
    fn test_abstract_entity_strategy_without_discriminator_parses() {
        let definition =
            parse_abstract_entity("abstract entity Party { inheritance single_table }").unwrap();
        assert_eq!(definition.strategy().discriminator(), None);
    }

    #[test]
    fn test_abstract_entity_keeps_every_inheritance_clause() {
        let definition = parse_abstract_entity(
            "abstract entity Party {\n inheritance joined_table\n inheritance single_table discriminator kind\n}",
        )
        .unwrap();
        assert_eq!(definition.strategies.len(), 2);
        assert_eq!(definition.strategy().kind(), InheritanceKind::JoinedTable);
    }

    #[test]
    fn test_abstract_requires_entity_keyword() {
        assert!(parse_abstract_entity("abstract Party {}").is_err());
    }

    #[test]
    fn test_entity_members() {
        let definition = parse_entity(
            r#"entity Individual : Person, Named {
                val id: Uuid
                var birth_date: Date
                relation documents: many Document mapped_by(owner) on_delete(cascade)
                relation tags: set Tag
                relation addresses: map(String) Address
                relation employer: one Company foreign_key(employer_id);
                constraint primary_key(id)
                constraint index(birth_date, id);
            }"#,
        )
        .unwrap();

        let supertypes: Vec<&str> = definition.supertypes.iter().map(|s| s.as_str()).collect();
        assert_eq!(supertypes, ["Person", "Named"]);
        assert_eq!(definition.fields.len(), 2);
        assert_eq!(definition.relationships.len(), 4);
        assert_eq!(definition.constraints.len(), 2);

        let documents = &definition.relationships[0];
        assert_eq!(documents.kind, RelationKind::Collection(CollectionKind::List));
        assert_eq!(documents.target.as_str(), "Document");
        assert_eq!(documents.mapped_by.as_ref().map(|m| m.as_str()), Some("owner"));
        assert_eq!(documents.on_delete, OnDelete::Cascade);
        assert_eq!(documents.side(), RelationSide::Inverse);

        assert_eq!(
            definition.relationships[1].kind,
            RelationKind::Collection(CollectionKind::Set)
        );
        match &definition.relationships[2].kind {
            RelationKind::Dictionary(key) => {
                assert_eq!(key.inner(), &TypeRef::Primitive(PrimitiveType::String))
            }
            other => panic!("expected a dictionary, got {other:?}"),
        }

        let employer = &definition.relationships[3];
        assert_eq!(employer.kind, RelationKind::Single);
        assert_eq!(employer.foreign_key.as_ref().map(|f| f.as_str()), Some("employer_id"));
        assert_eq!(employer.on_delete, OnDelete::None);
        assert_eq!(employer.side(), RelationSide::Owning);

        let columns: Vec<&str> = definition.constraints[1]
            .columns()
            .iter()
            .map(|c| c.as_str())
            .collect();
        assert_eq!(columns, ["birth_date", "id"]);
    }

    #[test]
    fn test_later_relation_option_overrides_earlier() {
        let definition = parse_entity(
            "entity Document { relation owner: one Person on_delete(cascade) on_delete(restrict) }",
        )
        .unwrap();
        assert_eq!(definition.relationships[0].on_delete, OnDelete::Restrict);
    }

    #[test]
    fn test_entity_name_must_be_pascal_case() {
        assert!(parse_entity("entity person {}").is_err());
        assert!(parse_entity("entity Snake_Case {}").is_err());
        assert!(parse_entity("entity camelCase {}").is_err());
    }

    #[test]
    fn test_relation_requires_known_kind() {
        let err = parse_entity("entity Document { relation owner: some Person }").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("`one`, `many`, `set` or `map(Key)`"));
    }
}

mod service_tests {
    use super::*;

    #[test]
    fn test_service_with_statements() {
        let definition = parse_service(
            r#"service Registry {
                fn register(name: String, email: Email) -> Individual {
                    transaction {
                        if name != "" {
                            for doc in pending_documents {
                            }
                        } else {
                        }
                    }
                }

                fn ping() { }
            }"#,
        )
        .unwrap();

        assert_eq!(definition.functions.len(), 2);
        let register = &definition.functions[0];
        assert_eq!(register.parameters.len(), 2);
        assert_eq!(
            register.returns.as_ref().map(|r| r.inner().clone()),
            Some(TypeRef::Named("Individual".to_string()))
        );

        let expected = vec![Statement::Transaction {
            body: vec![Statement::If {
                condition: "name != \"\"".to_string(),
                then_branch: vec![Statement::ForEach {
                    item: "doc".to_string(),
                    collection: "pending_documents".to_string(),
                    body: vec![],
                }],
                else_branch: vec![],
            }],
        }];
        assert_eq!(register.body, expected);

        let ping = &definition.functions[1];
        assert!(ping.parameters.is_empty());
        assert!(ping.returns.is_none());
    }

    #[test]
    fn test_if_requires_a_condition() {
        assert!(parse_service("service S { fn f() { if { } } }").is_err());
    }

    #[test]
    fn test_for_requires_in() {
        let err = parse_service("service S { fn f() { for doc of docs { } } }").unwrap_err();
        assert!(err.has_code(ErrorCode::E100));
    }
}

mod view_tests {
    use super::*;

    #[test]
    fn test_every_comparison_operator() {
        for op in CompareOp::BY_LENGTH_DESC {
            let source = format!(
                "view V {{ query {{ from Person as p where p.age {} 18 select p.name }} }}",
                op.symbol()
            );
            let definition = parse_view(&source)
                .unwrap_or_else(|err| panic!("`{}` should parse: {err}", op.symbol()));
            assert_eq!(definition.query.filters[0].op, op);
        }
    }

    #[test]
    fn test_unknown_comparison_operator() {
        let source = "view V { query { from Person as p where p.age =~ 18 select p.name } }";
        let err = parse_view(source).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
    }

    #[test]
    fn test_view_with_query() {
        let definition = parse_view(
            r#"view Adults : Named {
                var age: Int32
                query {
                    from Person as p
                    from Document
                    where p.age >= 18
                    where Document.title == "passport"
                    where active == true
                    where p.name != p.nickname
                    select p.name as person_name, Document.title
                }
                var note: String
            }"#,
        )
        .unwrap();

        assert_eq!(definition.traits.len(), 1);
        assert_eq!(definition.fields.len(), 2);

        let query = &definition.query;
        assert_eq!(query.from.len(), 2);
        assert_eq!(query.from[0].alias.as_ref().map(|a| a.as_str()), Some("p"));
        assert!(query.from[1].alias.is_none());

        assert_eq!(query.filters.len(), 4);
        assert_eq!(query.filters[0].op, CompareOp::GreaterEq);
        assert_eq!(query.filters[0].field.to_string(), "p.age");
        match &query.filters[0].operand {
            Operand::Literal(literal) => assert_eq!(literal.inner(), &Literal::Integer(18)),
            other => panic!("expected a literal, got {other:?}"),
        }
        match &query.filters[1].operand {
            Operand::Literal(literal) => {
                assert_eq!(literal.inner(), &Literal::String("passport".to_string()))
            }
            other => panic!("expected a literal, got {other:?}"),
        }
        assert!(query.filters[2].field.qualifier.is_none());
        match &query.filters[3].operand {
            Operand::Field(path) => assert_eq!(path.to_string(), "p.nickname"),
            other => panic!("expected a field path, got {other:?}"),
        }

        let select = &query.select.fields;
        assert_eq!(select.len(), 2);
        assert_eq!(select[0].alias.as_ref().map(|a| a.as_str()), Some("person_name"));
        assert_eq!(select[1].path.to_string(), "Document.title");
    }

    #[test]
    fn test_view_requires_query() {
        let err = parse_view("view Names { var name: String }").unwrap_err();
        assert!(err.has_code(ErrorCode::E100));
    }

    #[test]
    fn test_query_requires_select() {
        assert!(parse_view("view Names { query { from Person } }").is_err());
    }

    #[test]
    fn test_query_requires_from() {
        assert!(parse_view("view Names { query { select name } }").is_err());
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_config_settings_in_order() {
        let definition =
            parse_config(r#"config { schema = "people"; owner = "ops" retries = "3" }"#).unwrap();

        let settings: Vec<(&str, &str)> = definition
            .settings
            .iter()
            .map(|s| (s.key.as_str(), s.value.as_str()))
            .collect();
        assert_eq!(settings, [("schema", "people"), ("owner", "ops"), ("retries", "3")]);
    }

    #[test]
    fn test_config_value_escapes() {
        let definition = parse_config(r#"config { banner = "a \"quoted\"\tline\n" }"#).unwrap();
        assert_eq!(definition.settings[0].value.as_str(), "a \"quoted\"\tline\n");
    }

    #[test]
    fn test_config_value_must_be_a_string() {
        assert!(parse_config("config { retries = 3 }").is_err());
    }
}

mod error_handling_tests {
    use super::*;

    #[test]
    fn test_error_location_is_one_based() {
        let source = "type Email =\n  string";
        let diag = assert_parse_fails(source);

        assert_eq!(diag.code(), Some(ErrorCode::E100));
        let location = diag.primary_span().unwrap().location(source);
        assert_eq!((location.line, location.column), (2, 3));
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let diag = assert_parse_fails("entity Person {\n  val id: Uuid\n");
        assert_eq!(diag.code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_unterminated_string() {
        let diag = assert_parse_fails("config { schema = \"people }\n");
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.primary_span().map(|span| span.start()), Some(18));
    }

    #[test]
    fn test_invalid_escape() {
        let diag = assert_parse_fails(r#"config { schema = "a\qb" }"#);
        assert_eq!(diag.code(), Some(ErrorCode::E002));
    }

    #[test]
    fn test_error_names_enclosing_production() {
        let diag = assert_parse_fails("entity Person {\n  var name String\n}");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("`:`"));
        assert!(diag.help().is_some_and(|help| help.contains("entity")));
    }

    #[test]
    fn test_primitive_names_cannot_be_declared() {
        let diag = assert_parse_fails("type String = Int32");
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("unexpected `String`"));
        assert!(diag.message().contains("not a primitive type"));
        assert_eq!(diag.primary_span().map(|span| span.start()), Some(5));

        for source in [
            "entity Uuid { }",
            "abstract entity Date { inheritance joined_table }",
            "trait Json { }",
            "service Bool { }",
            "view DateTime { query { from Person select name } }",
        ] {
            assert!(parse(source).is_err(), "{source} should be rejected");
        }
    }

    #[test]
    fn test_primitive_prefixed_names_are_declarable() {
        let project = assert_parses_successfully("type StringList = Json\nentity UuidHolder { }");
        assert_eq!(project.type_aliases[0].name.inner(), "StringList");
        assert_eq!(project.entities[0].name.inner(), "UuidHolder");
    }

    #[test]
    fn test_abort_stops_at_first_error() {
        let source = "entity A { var x: ??? }\nentity B { var y: ??? }\n";
        let err = parse(source).unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
    }

    #[test]
    fn test_recovery_skips_broken_declarations() {
        let source = r#"entity A { var x: ??? }
entity B { var y: String }
trait T { var Bad: String }
type Email = String
"#;
        let parsed = parse_recovering(source);

        assert_eq!(parsed.diagnostics.len(), 2);
        let entities: Vec<&str> = parsed
            .project
            .entities
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(entities, ["B"]);
        assert!(parsed.project.traits.is_empty());
        assert_eq!(parsed.project.type_aliases.len(), 1);
        assert!(!parsed.is_clean());
        assert!(parsed.into_result().is_err());
    }

    #[test]
    fn test_recovery_resumes_on_error_line() {
        let source = "entity A {\n  val id: Uuid\nentity B {}\n";
        let parsed = parse_recovering(source);

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.project.entities.len(), 1);
        assert_eq!(parsed.project.entities[0].name.as_str(), "B");
    }

    #[test]
    fn test_recovery_on_clean_source() {
        let parsed = parse_recovering("type Email = String");
        assert!(parsed.is_clean());
        assert_eq!(parsed.into_result().unwrap().type_aliases.len(), 1);
    }
}
