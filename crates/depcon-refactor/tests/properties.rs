use depcon_refactor::{
    apply_text_edits, derive_parameter_name, is_dependency_constructor_applicable,
    resolve_class_dependencies, synthesize_dependency_constructor, to_async, to_sync,
    CancellationToken, RefactorError,
};
use depcon_syntax::{parse_class, Body, ClassNode, MethodMember, OpaqueText, TypeRef};
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 128;

const FIELD_NAMES: &[&str] = &["_a", "a", "_b", "__c", "d", "_e", "@class", "@_f"];
const PARAM_NAMES: &[&str] = &["a", "_a", "b", "c", "x"];
const TYPES: &[&str] = &[
    "A",
    "int",
    "List<string>",
    "Dictionary<string, int>",
    "string?",
    "(int Id, string Name)",
    "(int, List<string>)[]",
];

#[derive(Clone, Debug)]
struct FieldSpec {
    name: &'static str,
    ty: &'static str,
    readonly: bool,
}

#[derive(Clone, Debug)]
struct CtorSpec {
    params: Vec<&'static str>,
    assigned: Vec<&'static str>,
    extra_statement: bool,
}

fn arb_fields() -> impl Strategy<Value = Vec<FieldSpec>> {
    prop::sample::subsequence(FIELD_NAMES.to_vec(), 0..=FIELD_NAMES.len())
        .prop_flat_map(|names| {
            let len = names.len();
            (
                Just(names),
                prop::collection::vec((prop::sample::select(TYPES.to_vec()), any::<bool>()), len),
            )
        })
        .prop_map(|(names, attrs)| {
            names
                .into_iter()
                .zip(attrs)
                .map(|(name, (ty, readonly))| FieldSpec { name, ty, readonly })
                .collect()
        })
}

fn arb_ctor() -> impl Strategy<Value = Option<CtorSpec>> {
    proptest::option::of(
        (
            prop::sample::subsequence(PARAM_NAMES.to_vec(), 0..=PARAM_NAMES.len()),
            prop::sample::subsequence(FIELD_NAMES.to_vec(), 0..=FIELD_NAMES.len()),
            any::<bool>(),
        )
            .prop_map(|(params, assigned, extra_statement)| CtorSpec {
                params,
                assigned,
                extra_statement,
            }),
    )
}

fn render_source(fields: &[FieldSpec], ctor: &Option<CtorSpec>) -> String {
    let mut out = String::from("class Sample\n{\n");
    for field in fields {
        let readonly = if field.readonly { "readonly " } else { "" };
        out.push_str(&format!("    private {readonly}{} {};\n", field.ty, field.name));
    }
    if let Some(ctor) = ctor {
        let params: Vec<String> = ctor.params.iter().map(|name| format!("A {name}")).collect();
        out.push_str(&format!("\n    public Sample({})\n    {{\n", params.join(", ")));
        if ctor.extra_statement {
            out.push_str("        // setup\n        Log(\"ready\");\n");
        }
        for field in &ctor.assigned {
            out.push_str(&format!("        {field} = x;\n"));
        }
        out.push_str("    }\n");
    }
    out.push_str("}\n");
    out
}

fn arb_source() -> impl Strategy<Value = String> {
    arb_sample().prop_map(|(_, source)| source)
}

/// Generated source together with the fields it declares.
fn arb_sample() -> impl Strategy<Value = (Vec<FieldSpec>, String)> {
    (arb_fields(), arb_ctor()).prop_map(|(fields, ctor)| {
        let source = render_source(&fields, &ctor);
        (fields, source)
    })
}

fn parse(text: &str) -> ClassNode {
    parse_class(text).expect("generated source should parse").node
}

fn synthesize(class: &ClassNode) -> ClassNode {
    synthesize_dependency_constructor(class, &CancellationToken::new())
}

fn arb_plain_type() -> impl Strategy<Value = TypeRef> {
    prop_oneof![
        prop::sample::select(vec!["int", "string", "Foo", "System.Guid"])
            .prop_map(|name| TypeRef::named(name)),
        prop::sample::select(vec!["List", "IEnumerable"])
            .prop_map(|name| TypeRef::generic(name, vec![TypeRef::named("int")])),
    ]
}

fn arb_method() -> impl Strategy<Value = MethodMember> {
    (
        arb_plain_type(),
        prop::sample::subsequence(vec!["public", "static", "virtual"], 0..=3),
    )
        .prop_map(|(return_type, modifiers)| MethodMember {
            name: "Run".into(),
            type_params: None,
            modifiers: modifiers.into_iter().map(str::to_string).collect(),
            return_type,
            parameters: Vec::new(),
            constraints: None,
            body: Body::Block(vec![depcon_syntax::Statement::other("return default;")]),
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn synthesis_is_idempotent(source in arb_source()) {
        let once = synthesize(&parse(&source));
        prop_assert_eq!(synthesize(&once), once);
    }

    #[test]
    fn applicability_agrees_with_synthesis(source in arb_source()) {
        let class = parse(&source);
        let applicable = is_dependency_constructor_applicable(&class, &CancellationToken::new());
        prop_assert_eq!(applicable, synthesize(&class) != class);
    }

    #[test]
    fn every_read_only_field_is_covered((fields, source) in arb_sample()) {
        let out = synthesize(&parse(&source));
        let readonly_fields: Vec<&str> = fields
            .iter()
            .filter(|field| field.readonly)
            .map(|field| field.name)
            .collect();
        if readonly_fields.is_empty() {
            return Ok(());
        }
        let (_, ctor) = out.first_constructor().expect("constructor after synthesis");
        for field in readonly_fields {
            let param = derive_parameter_name(field);
            prop_assert!(!param.contains('@'), "verbatim prefix leaked into {}", param);
            prop_assert!(ctor.parameters.iter().any(|p| p.name == param), "missing parameter {}", param);
            prop_assert!(
                ctor.body.statements().iter().any(|s| s.assigned_name() == Some(field)),
                "missing assignment to {}",
                field
            );
        }
    }

    #[test]
    fn existing_parameters_and_statements_keep_their_order(source in arb_source()) {
        let class = parse(&source);
        let out = synthesize(&class);
        if let (Some((_, before)), Some((_, after))) = (class.first_constructor(), out.first_constructor()) {
            prop_assert_eq!(&after.parameters[..before.parameters.len()], &before.parameters[..]);
            let old = before.body.statements();
            prop_assert_eq!(&after.body.statements()[..old.len()], old);
        }
    }

    #[test]
    fn spliced_text_reparses_to_synthesized_tree(source in arb_source()) {
        let parsed = parse_class(&source).expect("generated source should parse");
        let expected = synthesize(&parsed.node);
        match resolve_class_dependencies("Sample.cs", &source, &parsed, &CancellationToken::new()) {
            Ok(edit) => {
                let text = apply_text_edits(&source, &edit.edits).expect("edits apply");
                prop_assert_eq!(parse(&text), expected);
            }
            Err(err) => {
                prop_assert_eq!(err, RefactorError::NotApplicable);
                prop_assert_eq!(expected, parsed.node);
            }
        }
    }

    #[test]
    fn async_round_trip_restores_signature(method in arb_method()) {
        let back = to_sync(&to_async(&method));
        prop_assert_eq!(&back.return_type, &method.return_type);
        prop_assert_eq!(&back.modifiers, &method.modifiers);
        prop_assert_eq!(&back.body, &method.body);
        prop_assert_eq!(&back.parameters, &method.parameters);
    }
}

#[test]
fn double_wrapped_task_collapses_one_level() {
    let method = MethodMember {
        name: "Load".into(),
        type_params: None,
        modifiers: vec!["public".into(), "async".into()],
        return_type: TypeRef::parse("Task<Task<string>>"),
        parameters: Vec::new(),
        constraints: None,
        body: Body::Expression(OpaqueText::new("Inner()")),
    };
    let sync = to_sync(&method);
    assert_eq!(sync.return_type.to_string(), "Task<string>");
    assert_eq!(sync.modifiers, vec!["public".to_string()]);
}
