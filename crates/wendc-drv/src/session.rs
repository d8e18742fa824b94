//! Orchestrates the four pipeline stages in dependency order.

use std::fs;
use std::path::Path;

use wendc_lex::{LexError, Token};
use wendc_par::{Program, SyntaxError};
use wendc_sem::{SemanticError, SymbolTable};
use wendc_tac::{ExecOptions, ExecResult, TacInstruction};

use crate::config::{Config, Stage};
use crate::error::{CompileError, CompileResult};

/// Everything every stage produced for a single compile pass. Best-effort:
/// later fields are still populated even when an earlier stage reported
/// errors, matching the total-stage propagation policy.
pub struct PipelineOutput {
    pub tokens: Vec<Token>,
    pub lex_errors: Vec<LexError>,
    pub program: Program,
    pub syntax_errors: Vec<SyntaxError>,
    pub symbol_table: SymbolTable,
    pub semantic_errors: Vec<SemanticError>,
    pub tac: Vec<TacInstruction>,
    pub exec_result: Option<ExecResult>,
}

pub struct Session {
    config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads `path`, then runs [`Session::run`] over its contents.
    pub fn compile_file(&self, path: &Path) -> CompileResult<PipelineOutput> {
        self.compile_file_with_input(path, None)
    }

    /// Like [`Session::compile_file`], but falls back to `on_input` for any
    /// `cin` read past the end of `--input`'s preloaded answers.
    pub fn compile_file_with_input(
        &self,
        path: &Path,
        on_input: Option<Box<dyn FnMut() -> Option<String>>>,
    ) -> CompileResult<PipelineOutput> {
        let source = fs::read_to_string(path).map_err(|source| CompileError::ReadSource {
            path: path.to_path_buf(),
            source,
        })?;
        if source.trim().is_empty() {
            return Err(CompileError::EmptySource(path.to_path_buf()));
        }
        Ok(self.run_with_input(&source, on_input))
    }

    /// Runs the scan → parse → analyze → generate-TAC pipeline, executing
    /// the TAC only when the configured stage is `Run`.
    pub fn run(&self, source: &str) -> PipelineOutput {
        self.run_with_input(source, None)
    }

    /// Like [`Session::run`], but falls back to `on_input` for any `cin`
    /// read past the end of `--input`'s preloaded answers: read from
    /// `--input` first, otherwise prompt interactively.
    pub fn run_with_input(
        &self,
        source: &str,
        on_input: Option<Box<dyn FnMut() -> Option<String>>>,
    ) -> PipelineOutput {
        let (tokens, lex_errors) = wendc_lex::scan(source);
        tracing::debug!(token_count = tokens.len(), lex_errors = lex_errors.len(), "scan complete");

        let (mut program, syntax_errors) = wendc_par::parse(tokens.clone());
        tracing::debug!(syntax_errors = syntax_errors.len(), "parse complete");

        let (symbol_table, semantic_errors) = wendc_sem::analyze_semantics(&mut program);
        tracing::debug!(
            semantic_errors = semantic_errors.len(),
            symbols = symbol_table.entries().len(),
            "semantic analysis complete"
        );

        let tac = wendc_tac::generate_tac(&program);
        tracing::debug!(instructions = tac.len(), "TAC generation complete");

        let exec_result = if self.config.stage == Stage::Run {
            let opts = self.exec_options(on_input);
            let result = wendc_tac::execute(&tac, opts);
            tracing::debug!(errors = result.errors.len(), "execution complete");
            Some(result)
        } else {
            None
        };

        PipelineOutput {
            tokens,
            lex_errors,
            program,
            syntax_errors,
            symbol_table,
            semantic_errors,
            tac,
            exec_result,
        }
    }

    fn exec_options(&self, on_input: Option<Box<dyn FnMut() -> Option<String>>>) -> ExecOptions {
        let inputs = match &self.config.input_path {
            Some(path) => fs::read_to_string(path)
                .map(|text| text.lines().map(str::to_string).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        ExecOptions {
            inputs,
            on_input,
            ..Default::default()
        }
    }

    /// Renders the representation the configured stage asks for.
    pub fn render(&self, output: &PipelineOutput) -> String {
        match self.config.stage {
            Stage::Tokens => {
                let mut text = wendc_lex::render_token_table(&output.tokens);
                if !output.lex_errors.is_empty() {
                    text.push('\n');
                    text.push_str(&wendc_lex::render_error_table(&output.lex_errors));
                }
                text
            }
            Stage::Ast => wendc_sem::render_annotated_tree(&output.program),
            Stage::Sem => output.symbol_table.render(),
            Stage::Tac => wendc_tac::format_tac(&output.tac),
            Stage::Run => match &output.exec_result {
                Some(result) => result.output.clone(),
                None => String::new(),
            },
        }
    }

    /// Collects every diagnostic across all four stages, in discovery
    /// order (lex, then syntax, then semantic, then runtime), via a shared
    /// `Handler` so the final report is one accumulation pass rather than
    /// four separately-formatted loops.
    pub fn render_diagnostics(&self, output: &PipelineOutput) -> String {
        let mut handler = wendc_util::Handler::new();
        for e in &output.lex_errors {
            handler.error(
                format!("lex: {} at line {}, column {}", e.description, e.line, e.column),
                wendc_util::Span::DUMMY,
            );
        }
        for e in &output.syntax_errors {
            handler.error(format!("syntax: {}", e.message), wendc_util::Span::DUMMY);
        }
        for e in &output.semantic_errors {
            handler.error(format!("semantic: {}", e.message), wendc_util::Span::DUMMY);
        }
        if let Some(result) = &output.exec_result {
            for e in &result.errors {
                handler.error(format!("runtime: {}", e.message), wendc_util::Span::DUMMY);
            }
        }
        handler
            .diagnostics()
            .iter()
            .map(|d| d.render())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_full_pipeline_and_renders_run_stage() {
        let session = Session::new(Config {
            stage: Stage::Run,
            ..Default::default()
        });
        let output = session.run("main { int x; x = 3 + 4; cout << x; }");
        assert_eq!(session.render(&output), "7\n");
        assert!(session.render_diagnostics(&output).is_empty());
    }

    #[test]
    fn tac_stage_renders_listing() {
        let session = Session::new(Config {
            stage: Stage::Tac,
            ..Default::default()
        });
        let output = session.run("main { int x; x = 3 + 4; }");
        assert!(session.render(&output).contains("declare int x"));
    }

    #[test]
    fn compile_file_reads_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.wnd");
        fs::write(&path, "main { int x; x = 1; cout << x; }").unwrap();

        let session = Session::new(Config {
            stage: Stage::Run,
            ..Default::default()
        });
        let output = session.compile_file(&path).unwrap();
        assert_eq!(session.render(&output), "1\n");
    }

    #[test]
    fn compile_file_rejects_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wnd");
        fs::write(&path, "   \n").unwrap();

        let session = Session::new(Config::default());
        assert!(matches!(session.compile_file(&path), Err(CompileError::EmptySource(_))));
    }

    #[test]
    fn diagnostics_collect_errors_across_stages() {
        let session = Session::new(Config::default());
        let output = session.run("main { int x; int x; }");
        let report = session.render_diagnostics(&output);
        assert!(report.contains("semantic:"));
    }

    #[test]
    fn on_input_fallback_feeds_cin_past_preloaded_inputs() {
        let session = Session::new(Config {
            stage: Stage::Run,
            ..Default::default()
        });
        let mut answers = vec!["9".to_string()].into_iter();
        let on_input: Box<dyn FnMut() -> Option<String>> = Box::new(move || answers.next());
        let output = session.run_with_input(
            "main { int a; cin >> a; cout << a; }",
            Some(on_input),
        );
        assert_eq!(session.render(&output), "9\n");
    }
}
