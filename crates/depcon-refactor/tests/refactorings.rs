use depcon_refactor::{
    apply_text_edits, code_actions, convert_method, resolve_unassigned_dependencies,
    CancellationToken, CodeActionKind, MethodMode, RefactorError, WorkspaceEdit,
    CONVERT_TO_ASYNC_TITLE, CONVERT_TO_SYNC_TITLE, RESOLVE_DEPENDENCIES_TITLE,
};
use pretty_assertions::assert_eq;

const FILE: &str = "ProgramTests.cs";

fn offset_of(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("fixture should contain {needle:?}"))
}

fn apply(source: &str, edit: &WorkspaceEdit) -> String {
    apply_text_edits(source, &edit.edits).expect("edits should apply")
}

fn resolve_at(source: &str, needle: &str) -> String {
    let offset = offset_of(source, needle);
    let edit = resolve_unassigned_dependencies(FILE, source, offset, &CancellationToken::new())
        .expect("refactoring should apply");
    apply(source, &edit)
}

#[test]
fn appends_new_constructor_after_fields() {
    let source = r#"class ProgramTests
{
    private readonly A _a1, _a2, a3, a4;
}
"#;
    let expected = r#"class ProgramTests
{
    private readonly A _a1, _a2, a3, a4;

    public ProgramTests(A a1, A a2, A _a3, A _a4)
    {
        _a1 = a1;
        _a2 = a2;
        a3 = _a3;
        a4 = _a4;
    }
}
"#;
    assert_eq!(resolve_at(source, "ProgramTests"), expected);
}

#[test]
fn extends_constructor_preserving_comments() {
    let source = r#"class ProgramTests
{
    private readonly A _a1, _a2, _a3, a4;

    // this is a comment
    public ProgramTests(A a1, A a2)
    {
        // this is a comment
        _a2 = a2;
        _a1 = a1;
        string x = "x";
    }

    public void Test(){
    }
}
"#;
    let expected = r#"class ProgramTests
{
    private readonly A _a1, _a2, _a3, a4;

    // this is a comment
    public ProgramTests(A a1, A a2, A a3, A _a4)
    {
        // this is a comment
        _a2 = a2;
        _a1 = a1;
        string x = "x";
        _a3 = a3;
        a4 = _a4;
    }

    public void Test(){
    }
}
"#;
    // Cursor on the constructor signature.
    assert_eq!(resolve_at(source, "ProgramTests(A a1"), expected);
}

#[test]
fn follows_k_and_r_braces() {
    let source = r#"class C {
    private readonly A _a;

    public C() {
    }
}
"#;
    let expected = r#"class C {
    private readonly A _a;

    public C(A a) {
        _a = a;
    }
}
"#;
    assert_eq!(resolve_at(source, "class C"), expected);
}

#[test]
fn new_constructor_uses_k_and_r_when_class_does() {
    let source = "class C {\n    private readonly A _a;\n}\n";
    let expected = "class C {\n    private readonly A _a;\n\n    public C(A a) {\n        _a = a;\n    }\n}\n";
    assert_eq!(resolve_at(source, "C {"), expected);
}

#[test]
fn one_line_class_is_laid_out_before_adding_a_constructor() {
    let source = "class P { private readonly A _a; /* b */ private readonly B _b; }\n";
    let expected = r#"class P
{
    private readonly A _a;
    /* b */ private readonly B _b;

    public P(A a, B b)
    {
        _a = a;
        _b = b;
    }
}
"#;
    assert_eq!(resolve_at(source, "class P"), expected);
}

#[test]
fn one_line_nested_class_keeps_its_indentation() {
    let source = "class Outer\n{\n    class Inner { private readonly A _a; }\n}\n";
    let expected = "class Outer\n{\n    class Inner\n    {\n        private readonly A _a;\n\n        public Inner(A a)\n        {\n            _a = a;\n        }\n    }\n}\n";
    assert_eq!(resolve_at(source, "Inner"), expected);
}

#[test]
fn continues_multi_line_parameter_lists() {
    let source = r#"class C
{
    private readonly A _a;
    private readonly B _b;

    public C(
        A a)
    {
        _a = a;
    }
}
"#;
    let expected = r#"class C
{
    private readonly A _a;
    private readonly B _b;

    public C(
        A a,
        B b)
    {
        _a = a;
        _b = b;
    }
}
"#;
    assert_eq!(resolve_at(source, "public C("), expected);
}

#[test]
fn only_rewrites_the_nested_class_under_the_cursor() {
    let source = r#"namespace App
{
    public class Outer
    {
        private readonly ILogger _logger;

        public class Inner
        {
            private readonly IClock _clock;
        }
    }
}
"#;
    let expected = r#"namespace App
{
    public class Outer
    {
        private readonly ILogger _logger;

        public class Inner
        {
            private readonly IClock _clock;

            public Inner(IClock clock)
            {
                _clock = clock;
            }
        }
    }
}
"#;
    assert_eq!(resolve_at(source, "Inner"), expected);
}

#[test]
fn preserves_crlf_line_endings() {
    let source = "class C\r\n{\r\n    private readonly A _a;\r\n}\r\n";
    let expected = "class C\r\n{\r\n    private readonly A _a;\r\n\r\n    public C(A a)\r\n    {\r\n        _a = a;\r\n    }\r\n}\r\n";
    assert_eq!(resolve_at(source, "class C"), expected);
}

#[test]
fn resolving_a_complete_class_is_not_applicable() {
    let source = r#"class C
{
    private readonly A _a;
    public C(A a)
    {
        _a = a;
    }
}
"#;
    let err = resolve_unassigned_dependencies(FILE, source, 7, &CancellationToken::new())
        .unwrap_err();
    assert_eq!(err, RefactorError::NotApplicable);
}

#[test]
fn cursor_inside_a_method_body_finds_no_class() {
    let source = "class C\n{\n    private readonly A _a;\n    void M() { Run(); }\n}\n";
    let err = resolve_unassigned_dependencies(
        FILE,
        source,
        offset_of(source, "Run"),
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err, RefactorError::NoClassAtPosition);
}

#[test]
fn cancelled_token_is_reported() {
    let source = "class C { private readonly A _a; }";
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        resolve_unassigned_dependencies(FILE, source, 7, &cancel).unwrap_err(),
        RefactorError::Cancelled
    );
    assert!(code_actions(source, 7, &cancel).is_empty());
}

const METHODS: &str = r#"using System.Threading.Tasks;
class ProgramTests
{
    public async Task<string> Test()
    {
        string x = null;
    }

    public async Task<Task<string>> Nested()
    {
        return null;
    }

    public async Task Run()
    {
    }

    public string anotherMethod()
    {
    }

    [Obsolete]
    public void Fire()
    {
    }
}
"#;

fn convert_at(needle: &str, target: MethodMode) -> String {
    let edit = convert_method(
        FILE,
        METHODS,
        offset_of(METHODS, needle),
        target,
        &CancellationToken::new(),
    )
    .expect("conversion should apply");
    assert_eq!(edit.edits.len(), 1);
    apply(METHODS, &edit)
}

#[test]
fn converts_generic_task_to_sync() {
    let out = convert_at("Test()", MethodMode::Sync);
    assert!(out.contains("    public string Test()\n"), "{out}");
    assert!(out.contains("        string x = null;\n"), "{out}");
}

#[test]
fn collapses_one_level_of_double_wrapping() {
    let out = convert_at("Nested()", MethodMode::Sync);
    assert!(out.contains("    public Task<string> Nested()\n"), "{out}");
}

#[test]
fn converts_bare_task_to_void() {
    let out = convert_at("Run()", MethodMode::Sync);
    assert!(out.contains("    public void Run()\n"), "{out}");
}

#[test]
fn converts_plain_method_to_async() {
    let out = convert_at("anotherMethod", MethodMode::Async);
    assert!(out.contains("    public async Task<string> anotherMethod()\n"), "{out}");
}

#[test]
fn converts_void_method_to_async_keeping_attributes() {
    let out = convert_at("Fire", MethodMode::Async);
    assert!(out.contains("    [Obsolete]\n    public async Task Fire()\n"), "{out}");
}

#[test]
fn converting_to_the_current_mode_is_not_applicable() {
    let err = convert_method(
        FILE,
        METHODS,
        offset_of(METHODS, "Test()"),
        MethodMode::Async,
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err, RefactorError::NotApplicable);
}

#[test]
fn lists_code_actions_at_cursor() {
    let cancel = CancellationToken::new();

    let on_method = code_actions(METHODS, offset_of(METHODS, "Test()"), &cancel);
    assert_eq!(on_method.len(), 1);
    assert_eq!(on_method[0].kind, CodeActionKind::ConvertToSync);
    assert_eq!(on_method[0].title, CONVERT_TO_SYNC_TITLE);
    assert_eq!(on_method[0].target, "Test");

    let on_sync = code_actions(METHODS, offset_of(METHODS, "anotherMethod"), &cancel);
    assert_eq!(on_sync[0].title, CONVERT_TO_ASYNC_TITLE);

    let source = "class Service\n{\n    private readonly IRepo _repo;\n}\n";
    let on_class = code_actions(source, offset_of(source, "Service"), &cancel);
    assert_eq!(on_class.len(), 1);
    assert_eq!(on_class[0].title, RESOLVE_DEPENDENCIES_TITLE);
    assert_eq!(on_class[0].target, "Service");

    // Nothing to resolve: no action.
    assert!(code_actions(METHODS, offset_of(METHODS, "ProgramTests"), &cancel).is_empty());
}
