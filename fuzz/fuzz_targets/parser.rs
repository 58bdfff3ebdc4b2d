#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Avoid pathological allocations in the harness itself; libFuzzer will still mutate below this.
    if data.len() > 64 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let (module, diags) = ehir::parse(&src);
    // Every error node must be explained by at least one error diagnostic.
    if module.has_error_nodes() {
        assert!(ehir::diagnostics_have_errors(&diags));
    }
    for diag in &diags {
        assert!(diag.span.start <= diag.span.end && diag.span.end <= src.len());
    }
    let _ = ehir::format_module(&module);
    // A pre-lexed stream reports exactly what a direct parse reports.
    let (tokens, _) = ehir::lex(&src);
    let options = ehir::ParseOptions::default();
    assert_eq!(ehir::parse_tokens(&tokens, src.len(), &options), (module, diags));
});
