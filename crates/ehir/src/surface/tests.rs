use crate::config::ParseOptions;
use crate::diagnostics::{
    diagnostics_have_errors, Diagnostic, DiagnosticKind, DiagnosticSeverity, Span,
};
use crate::formatter::format_module;
use crate::lexer::{lex, TokenKind};
use crate::literal::IntLiteral;
use crate::surface::*;
use crate::syntax::BINARY_OPCODES;

fn diag_codes(diags: &[Diagnostic]) -> Vec<String> {
    let mut codes: Vec<String> = diags.iter().map(|d| d.code.clone()).collect();
    codes.sort();
    codes
}

fn only_fn(module: &Module) -> &FnDecl {
    let fns: Vec<&FnDecl> = module
        .items()
        .filter_map(|item| match item {
            Item::FnDecl(decl) => Some(decl),
            _ => None,
        })
        .collect();
    assert_eq!(fns.len(), 1, "expected exactly one fn");
    fns[0]
}

fn block_insts<'m>(module: &'m Module, block: BlockId) -> Vec<&'m Instruction> {
    module[block]
        .instructions
        .iter()
        .map(|id| &module[*id])
        .collect()
}

fn type_name(module: &Module, ty: TypeId) -> &str {
    &module[ty].name.name
}

#[test]
fn parses_add_function() {
    let src = "fn add(a: i32, b: i32) -> i32 { $entry: r: i32 = add a: i32, b: i32 ret r: i32 }";
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    assert_eq!(module.items.len(), 1);

    let decl = only_fn(&module);
    assert_eq!(decl.name.name, "add");
    assert!(!decl.public);
    let params: Vec<(&str, &str)> = decl
        .params
        .iter()
        .map(|p| (p.name.name.as_str(), type_name(&module, p.ty)))
        .collect();
    assert_eq!(params, vec![("a", "i32"), ("b", "i32")]);
    assert_eq!(decl.ret_type.map(|ty| type_name(&module, ty)), Some("i32"));

    assert_eq!(decl.body.len(), 1);
    assert_eq!(module[decl.body[0]].label.name, "entry");
    let insts = block_insts(&module, decl.body[0]);
    assert_eq!(insts.len(), 2);

    let add = insts[0];
    assert_eq!(add.opcode(), Opcode::Binary(BinaryOp::Add));
    match &add.target {
        Some(Variable::Typed { name, ty, .. }) => {
            assert_eq!(name.name, "r");
            assert_eq!(type_name(&module, *ty), "i32");
        }
        other => panic!("expected typed target, got {other:?}"),
    }
    match &add.kind {
        InstKind::Binary { lhs, rhs, .. } => {
            assert_eq!(lhs.name().name, "a");
            assert_eq!(rhs.name().name, "b");
            assert!(lhs.ty().is_some() && rhs.ty().is_some());
        }
        other => panic!("expected binary op, got {other:?}"),
    }

    let ret = insts[1];
    assert!(ret.target.is_none());
    match &ret.kind {
        InstKind::Ret { value } => {
            assert_eq!(value.name().name, "r");
            assert_eq!(value.ty().map(|ty| type_name(&module, ty)), Some("i32"));
        }
        other => panic!("expected ret, got {other:?}"),
    }
}

#[test]
fn parses_every_item_kind() {
    let src = r#"
imp std::io::print
@enum Opt[T] { (T), () }
Point { x: i32, y: i32 }
fdecl puts(s: ptr<i8>) -> i32
fdefi puts { $entry: ret s }
fn noop() { $entry: br $entry }
"#;
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    assert_eq!(module.items.len(), 6);
    let items: Vec<&Item> = module.items().collect();

    match items[0] {
        Item::Import(import) => {
            assert_eq!(import.source.name, "std::io");
            assert_eq!(import.symbol.name, "print");
        }
        other => panic!("expected import, got {other:?}"),
    }
    match items[1] {
        Item::EnumDecl(decl) => {
            assert!(decl.public);
            assert_eq!(decl.generics.len(), 1);
            assert_eq!(decl.variants.len(), 2);
            assert!(matches!(
                &decl.variants[0].kind,
                VariantKind::TupleLike { types } if types.len() == 1
            ));
            assert!(matches!(decl.variants[1].kind, VariantKind::UnitLike));
        }
        other => panic!("expected enum, got {other:?}"),
    }
    match items[2] {
        Item::StructDecl(decl) => match &decl.variant.kind {
            VariantKind::CLike { fields } => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.name.as_str()).collect();
                assert_eq!(names, vec!["x", "y"]);
            }
            other => panic!("expected field struct, got {other:?}"),
        },
        other => panic!("expected struct, got {other:?}"),
    }
    match items[3] {
        Item::ForeignFnDecl(decl) => {
            assert_eq!(decl.params.len(), 1);
            let pointer = &module[decl.params[0].ty];
            assert_eq!(pointer.name.name, "ptr");
            assert_eq!(pointer.pointee.map(|ty| type_name(&module, ty)), Some("i8"));
        }
        other => panic!("expected fdecl, got {other:?}"),
    }
    match items[4] {
        Item::ForeignFnDefn(defn) => {
            assert_eq!(defn.name.name, "puts");
            assert_eq!(defn.body.len(), 1);
        }
        other => panic!("expected fdefi, got {other:?}"),
    }
    assert!(matches!(items[5], Item::FnDecl(_)));
    assert!(!module.has_error_nodes());
}

#[test]
fn tuple_struct_and_parameter_list_are_told_apart_by_position() {
    let src = r#"
Pair(i32, i64)
fn make(a: i32, b: i64) -> Pair {
$entry:
  p: Pair = caps Pair(a, b)
  ret p
}
"#;
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    let items: Vec<&Item> = module.items().collect();
    match items[0] {
        Item::StructDecl(decl) => {
            assert!(matches!(
                &decl.variant.kind,
                VariantKind::TupleLike { types } if types.len() == 2
            ));
        }
        other => panic!("expected tuple struct, got {other:?}"),
    }
    match items[1] {
        Item::FnDecl(decl) => assert_eq!(decl.params.len(), 2),
        other => panic!("expected fn, got {other:?}"),
    }
}

#[test]
fn parses_instruction_forms() {
    let src = r#"
fn f(p: ptr<Pair>, o: Opt[i32]) -> i32 {
$entry:
  q: ptr<i32> = getfieldptr p, left, 1
  v: i32 = load q
  w: i64 = cast v -> i64
  s: Pair = caps Pair(v, w)
  e: Opt[i32] = cape Opt[i32]::0(v)
  n: Opt[i32] = cape Opt[i32]::1
  h: Pair = capsh Pair
  k: i32 = capa 0x10_i32
  c: i1 = les v, k
  r: i32 = call helper(v, k)
  store q, v
  cbr c, $yes, $no
$yes:
  ret v
$no:
  ret r
}
"#;
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    let decl = only_fn(&module);
    assert_eq!(decl.body.len(), 3);
    let insts = block_insts(&module, decl.body[0]);
    let opcodes: Vec<&str> = insts.iter().map(|inst| inst.opcode().keyword()).collect();
    assert_eq!(
        opcodes,
        vec![
            "getfieldptr", "load", "cast", "caps", "cape", "cape", "capsh", "capa", "les", "call",
            "store", "cbr"
        ]
    );

    match &insts[0].kind {
        InstKind::GetFieldPtr { base, path } => {
            assert_eq!(base.name().name, "p");
            assert!(matches!(&path[0], FieldSel::Name(name) if name.name == "left"));
            assert!(matches!(path[1], FieldSel::Index(1, _)));
        }
        other => panic!("expected getfieldptr, got {other:?}"),
    }
    match &insts[2].kind {
        InstKind::Cast { operand, to } => {
            assert_eq!(operand.name().name, "v");
            assert_eq!(type_name(&module, *to), "i64");
        }
        other => panic!("expected cast, got {other:?}"),
    }
    match &insts[4].kind {
        InstKind::Cape {
            enum_name,
            generic_args,
            variant,
            args,
        } => {
            assert_eq!(enum_name.name, "Opt");
            assert_eq!(generic_args.len(), 1);
            assert_eq!(variant.name, "0");
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected cape, got {other:?}"),
    }
    assert!(matches!(&insts[5].kind, InstKind::Cape { args, .. } if args.is_empty()));
    match &insts[7].kind {
        InstKind::Capa { literal } => {
            assert_eq!(literal.value, 16);
            assert!(literal.signed);
            assert_eq!(literal.width, 32);
        }
        other => panic!("expected capa, got {other:?}"),
    }
    assert!(insts[10].target.is_none());
    match &insts[11].kind {
        InstKind::Cbr {
            then_label,
            else_label,
            ..
        } => {
            assert_eq!(then_label.name, "yes");
            assert_eq!(else_label.name, "no");
        }
        other => panic!("expected cbr, got {other:?}"),
    }
    assert!(insts.iter().all(|inst| inst.target.is_some() == inst.opcode().has_target()));
}

#[test]
fn switch_accepts_duplicate_case_values() {
    let src = r#"
fn f(x: i32) {
$entry:
  switch x { 1 -> $a, 1 -> $a, default -> $b }
$a:
  br $b
$b:
  ret x
}
"#;
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    let decl = only_fn(&module);
    let insts = block_insts(&module, decl.body[0]);
    match &insts[0].kind {
        InstKind::Switch { default, arms, .. } => {
            assert_eq!(default.name, "b");
            assert_eq!(arms.len(), 2);
            assert!(matches!(arms[0].value, IntLiteral::Unsized(_)));
            assert_eq!(arms[0].value.value(), 1);
            assert_eq!(arms[1].value.value(), 1);
        }
        other => panic!("expected switch, got {other:?}"),
    }
}

#[test]
fn switch_without_default_is_a_syntax_error() {
    let src = r#"
fn f(x: i32) {
$entry:
  switch x { 1 -> $a }
$a:
  ret x
}
"#;
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1503"]);
    assert_eq!(diags[0].kind, DiagnosticKind::SyntaxError);
    let decl = only_fn(&module);
    let insts = block_insts(&module, decl.body[0]);
    assert!(matches!(insts[0].kind, InstKind::Error));
    // The following block is still parsed.
    assert_eq!(decl.body.len(), 2);
}

#[test]
fn match_without_default_is_a_syntax_error() {
    let src = r#"
fn f(o: Opt[i32]) {
$entry:
  match o { 0(v: i32) -> $some }
$some:
  ret v
}
"#;
    let (_, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1503"]);
}

#[test]
fn match_arms_carry_bindings() {
    let src = r#"
fn f(o: Opt[i32]) {
$entry:
  match o { 0(v: i32) -> $some, 1 -> $none, default -> $none }
$some:
  ret v
$none:
  ret o
}
"#;
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    let decl = only_fn(&module);
    match &block_insts(&module, decl.body[0])[0].kind {
        InstKind::Match { arms, default, .. } => {
            assert_eq!(default.name, "none");
            assert_eq!(arms.len(), 2);
            assert_eq!(arms[0].variant.name, "0");
            assert_eq!(arms[0].bindings.len(), 1);
            assert!(arms[1].bindings.is_empty());
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[test]
fn duplicate_default_arm_is_reported() {
    let src = "fn f(x: i32) { $a: switch x { default -> $a, default -> $a } }";
    let (_, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1504"]);
    assert_eq!(diags[0].labels.len(), 1);
}

#[test]
fn duplicate_block_label_reports_second_occurrence() {
    let src = "fn f() {\n$a:\n  br $a\n$a:\n  br $a\n}\n";
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1505"]);
    let second = src.rfind("$a:").expect("second label");
    assert_eq!(diags[0].span, Span::new(second, second + 2));
    let first = src.find("$a:").expect("first label");
    assert_eq!(diags[0].labels[0].span, Span::new(first, first + 2));
    assert_eq!(only_fn(&module).body.len(), 2);
}

#[test]
fn unterminated_struct_points_at_end_of_input() {
    let src = "Foo {";
    let (module, diags) = parse(src);
    assert_eq!(module.items.len(), 1);
    assert!(matches!(module[module.items[0]], Item::Error { .. }));
    assert_eq!(diags.len(), 1, "unexpected diagnostics: {:?}", diag_codes(&diags));
    let diag = &diags[0];
    assert_eq!(diag.code, "E1502");
    assert_eq!(diag.kind, DiagnosticKind::SyntaxError);
    assert_eq!(diag.span, Span::empty(src.len()));
    assert_eq!(diag.expected, Some(vec![TokenKind::RBrace]));
}

#[test]
fn recovers_at_next_item() {
    let src = r#"
Foo { a: }
fn ok() { $entry: ret x }
Bar
"#;
    let (module, diags) = parse(src);
    assert!(diagnostics_have_errors(&diags));
    let items: Vec<&Item> = module.items().collect();
    assert_eq!(items.len(), 3);
    assert!(matches!(items[0], Item::Error { .. }));
    assert!(matches!(items[1], Item::FnDecl(decl) if decl.name.name == "ok"));
    assert!(matches!(items[2], Item::StructDecl(decl) if decl.name.name == "Bar"));
}

#[test]
fn bad_instruction_recovers_at_next_block() {
    let src = r#"
fn f(a: i32) {
$entry:
  x: i32 = bogus a
  br $next
$next:
  ret a
}
"#;
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1500"]);
    let decl = only_fn(&module);
    assert_eq!(decl.body.len(), 2);
    let entry = block_insts(&module, decl.body[0]);
    assert_eq!(entry.len(), 1);
    assert!(matches!(entry[0].kind, InstKind::Error));
    let next = block_insts(&module, decl.body[1]);
    assert!(matches!(next[0].kind, InstKind::Ret { .. }));
    assert!(module.has_error_nodes());
}

#[test]
fn value_opcode_needs_a_target() {
    let src = "fn f(a: i32) { $entry: add a, a ret a }";
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1506"]);
    let insts = block_insts(&module, only_fn(&module).body[0]);
    assert_eq!(insts.len(), 2);
    assert!(matches!(insts[0].kind, InstKind::Error));
}

#[test]
fn targetless_opcode_rejects_a_target() {
    let src = "fn f(a: i32) { $entry: x: i32 = ret a }";
    let (_, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1507"]);
}

#[test]
fn capa_requires_sized_literal() {
    let src = "fn f() { $entry: x: i32 = capa 5 ret x }";
    let (_, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1508"]);
}

#[test]
fn legacy_keywords_are_unsupported_but_parsed() {
    let src = "pub fn f() { $entry: ret x }\nstruct Point { x: i32 }";
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1600", "E1600"]);
    assert!(diags
        .iter()
        .all(|d| d.kind == DiagnosticKind::UnsupportedConstruct));
    let items: Vec<&Item> = module.items().collect();
    assert!(matches!(items[0], Item::FnDecl(decl) if decl.public));
    assert!(matches!(items[1], Item::StructDecl(decl) if decl.name.name == "Point"));
}

#[test]
fn foreign_definition_cannot_be_public() {
    let (module, diags) = parse("@fdefi f { $entry: ret x }");
    assert_eq!(diag_codes(&diags), vec!["E1500"]);
    assert!(matches!(module[module.items[0]], Item::ForeignFnDefn(_)));
}

#[test]
fn warns_on_untyped_first_definition() {
    let src = r#"
fn f(a: i32) {
$entry:
  x = add a, a
  x = add x, a
  y: i32 = add a, a
  y = add y, a
  ret y
}
"#;
    let (_, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["W0001"]);
    assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
    assert!(!diagnostics_have_errors(&diags));
    let first_x = src.find("x = add").expect("x");
    assert_eq!(diags[0].span, Span::new(first_x, first_x + 1));

    let quiet = ParseOptions {
        warn_untyped_targets: false,
        ..ParseOptions::default()
    };
    let (_, diags) = parse_with_options(src, &quiet);
    assert!(diags.is_empty());
}

#[test]
fn nesting_limit_is_enforced() {
    let src = "fdecl f(p: ptr<ptr<ptr<i8>>>)";
    let (_, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));

    let shallow = ParseOptions {
        max_nesting: 2,
        ..ParseOptions::default()
    };
    let (module, diags) = parse_with_options(src, &shallow);
    assert_eq!(diag_codes(&diags), vec!["E1509"]);
    assert!(matches!(module[module.items[0]], Item::Error { .. }));
}

#[test]
fn lexer_errors_are_not_reported_twice() {
    let (module, diags) = parse("fn f() { $entry: ret # }");
    assert_eq!(diag_codes(&diags), vec!["E1000"]);
    assert!(module.has_error_nodes());
}

#[test]
fn comments_are_ignored() {
    let src = "; header\nfn f() { ; entry block\n$entry: ret x ; done\n}";
    let (module, diags) = parse(src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    assert_eq!(module.items.len(), 1);
}

#[test]
fn parsing_is_deterministic() {
    let src = r#"
@Pair[T] { left: T, right: ptr<T> }
fn f(a: i32) { $entry: b: i32 = add a, a ret b }
Broken {
"#;
    let first = parse(src);
    let second = parse(src);
    assert_eq!(first, second);
}

#[test]
fn empty_source_yields_empty_module() {
    let (module, diags) = parse("");
    assert!(module.items.is_empty());
    assert!(diags.is_empty());
    assert_eq!(module.span, Span::new(0, 0));
}

#[test]
fn every_opcode_parses_and_formats_back() {
    let binary = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::Grt,
        BinaryOp::Geq,
        BinaryOp::Les,
        BinaryOp::Leq,
        BinaryOp::Neq,
        BinaryOp::Ieq,
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::Lsh,
        BinaryOp::Rsh,
        BinaryOp::Xor,
    ];
    assert_eq!(BINARY_OPCODES.len(), binary.len());

    let mut src = String::from("fn ops(a: i32, b: i32) -> i32 {\n$entry:\n");
    for (index, keyword) in BINARY_OPCODES.iter().enumerate() {
        src.push_str(&format!("  t{index}: i32 = {keyword} a, b\n"));
    }
    src.push_str(
        "  n: i32 = not a\n  g: ptr<i32> = getptr a\n  s: Pair = capsh Pair\n  e: Opt = capeh Opt\n  ret a\n}\n",
    );

    let (module, diags) = parse(&src);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    let insts = block_insts(&module, only_fn(&module).body[0]);
    assert_eq!(insts.len(), binary.len() + 5);

    for ((inst, op), keyword) in insts.iter().zip(binary).zip(BINARY_OPCODES) {
        assert_eq!(inst.opcode(), Opcode::Binary(op), "{keyword}");
        assert_eq!(inst.opcode().keyword(), *keyword);
        assert_eq!(BinaryOp::from_keyword(keyword), Some(op));
    }
    let rest: Vec<Opcode> = insts[binary.len()..].iter().map(|inst| inst.opcode()).collect();
    assert_eq!(
        rest,
        vec![Opcode::Not, Opcode::GetPtr, Opcode::Capsh, Opcode::Capeh, Opcode::Ret]
    );
    assert!(matches!(&insts[binary.len() + 3].kind, InstKind::Capeh { name } if name.name == "Opt"));

    let formatted = format_module(&module);
    for keyword in BINARY_OPCODES {
        assert!(formatted.contains(&format!("= {keyword} a, b")), "{keyword} missing");
    }
    assert!(formatted.contains("e: Opt = capeh Opt"));
    let (reparsed, diags) = parse(&formatted);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diag_codes(&diags));
    assert_eq!(format_module(&reparsed), formatted);
}

#[test]
fn parse_tokens_reports_lexical_problems() {
    let src = "fn f() { $e: ret # }\nfn g() { $e: x: i32 = capa 1_i0 ret x }";
    let (tokens, _) = lex(src);
    let (module, diags) = parse_tokens(&tokens, src.len(), &ParseOptions::default());
    assert_eq!(diag_codes(&diags), vec!["E1000", "E1001"]);
    assert!(diags.iter().all(|d| d.kind == DiagnosticKind::LexError));
    assert!(module.has_error_nodes());
    assert_eq!((module, diags), parse(src));
}

#[test]
fn list_left_open_before_next_item_is_unterminated() {
    let src = "Foo { a: i32\nfn f() { $entry: ret x }";
    let (module, diags) = parse(src);
    assert_eq!(diag_codes(&diags), vec!["E1502"]);
    let next_item = src.find("fn").expect("fn keyword");
    assert_eq!(diags[0].span, Span::new(next_item, next_item + 2));
    assert_eq!(diags[0].expected, Some(vec![TokenKind::RBrace]));
    assert_eq!(diags[0].labels[0].span, Span::new(4, 5));

    let items: Vec<&Item> = module.items().collect();
    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Item::Error { .. }));
    assert!(matches!(items[1], Item::FnDecl(decl) if decl.name.name == "f"));
}
