use wendc_drv::{Config, Session, Stage};

fn run(source: &str) -> wendc_drv::PipelineOutput {
    Session::new(Config {
        stage: Stage::Run,
        ..Default::default()
    })
    .run(source)
}

#[test]
fn declaration_and_assignment() {
    let session = Session::new(Config {
        stage: Stage::Run,
        ..Default::default()
    });
    let output = session.run("main { int x; x = 3 + 4; cout << x; }");
    assert_eq!(session.render(&output), "7\n");
}

#[test]
fn if_else_takes_then_branch() {
    let output = run("main { int a; a = 1; if a < 2 then a = 10; else a = 20; end }");
    assert!(output.semantic_errors.is_empty());
    assert_eq!(
        output.exec_result.unwrap().variables.get("a"),
        Some(&Some(wendc_util::SemValue::Int(10)))
    );
}

#[test]
fn while_loop_runs_three_times() {
    let output = run("main { int i; i = 0; while i < 3 i = i + 1; end }");
    assert_eq!(
        output.exec_result.unwrap().variables.get("i"),
        Some(&Some(wendc_util::SemValue::Int(3)))
    );
}

#[test]
fn do_until_runs_twice() {
    let output = run("main { int i; i = 0; do i = i + 1; until i == 2 }");
    assert_eq!(
        output.exec_result.unwrap().variables.get("i"),
        Some(&Some(wendc_util::SemValue::Int(2)))
    );
}

#[test]
fn type_error_still_produces_tac() {
    let output = run("main { bool b; b = 1 + 2; }");
    assert_eq!(output.semantic_errors.len(), 1);
    assert!(!output.tac.is_empty());
}

#[test]
fn duplicate_declaration_reports_once() {
    let output = run("main { int x; int x; }");
    assert_eq!(output.semantic_errors.len(), 1);
}

#[test]
fn every_stage_stays_total_on_malformed_input() {
    let output = run("main { int ; x = ; }");
    assert_eq!(output.program.block.items.is_empty(), false);
}
