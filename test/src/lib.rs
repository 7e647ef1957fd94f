#![allow(missing_docs)]

use rstest::rstest;

#[rstest]
#[timeout(std::time::Duration::from_secs(10))]
fn tests(#[files("tests/**/*.test.mal")] file: std::path::PathBuf) {
    use std::fs;
    use strata_driver::{typecheck, util::get_visible_path, Options, Session};
    use strata_render::{render_instruction, Render};

    let code = fs::read_to_string(&file).expect("failed to read file");

    let should_resolve = if code.starts_with("# [should resolve]") {
        true
    } else if code.starts_with("# [should error]") {
        false
    } else {
        panic!("expected test to begin with [should resolve] or [should error]");
    };

    let comments = code
        .lines()
        .filter_map(|line| line.trim().strip_prefix('#'))
        .map(str::trim)
        .collect::<Vec<_>>();

    let options = comments
        .iter()
        .find_map(|comment| comment.strip_prefix("options:"))
        .map(|options| serde_json::from_str::<Options>(options).expect("invalid options"))
        .unwrap_or_default();

    let expected = comments
        .iter()
        .filter_map(|comment| comment.strip_prefix("expect:"))
        .map(|expected| expected.trim().to_string())
        .collect::<Vec<_>>();

    let render = Render::new(get_visible_path(&file), code.as_str());
    let session = Session::new(options.clone());

    let checked = session
        .check(&code)
        .unwrap_or_else(|error| panic!("{}", render.render_error(&error)));

    let rendered = checked
        .report
        .diagnostics
        .iter()
        .map(|diagnostic| render.render_diagnostic(&checked, diagnostic).to_string())
        .collect::<Vec<_>>();

    assert_eq!(rendered, expected);
    assert_eq!(should_resolve, !checked.erroneous);

    // A second pass over a resolved block changes nothing
    if should_resolve {
        let main = checked.main().expect("listing has no main block");
        let mut body = main.body.as_ref().expect("main has no body").lock();

        let render_body = |block: &strata_driver::ir::Block| {
            block
                .instructions
                .iter()
                .map(|instruction| render_instruction(block, instruction))
                .collect::<Vec<_>>()
        };

        let before = render_body(&body);
        let report = typecheck::resolve_block(&session, &mut body, options.silent);

        assert!(report.diagnostics.is_empty());
        assert!(!report.is_erroneous());
        assert_eq!(render_body(&body), before);
    }
}
