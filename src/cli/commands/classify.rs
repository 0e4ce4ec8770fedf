//! Document classification command.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use doclassify::classify::Classifier;
use doclassify::config::{resolve_path, Config};
use doclassify::discovery::{discover, FileTypeFilter};
use doclassify::extract::{DocumentFormat, ExtractorRegistry};
use doclassify::llm::{LlmClient, Provider};
use doclassify::output::{output_path, save_csv};
use doclassify::pipeline::{
    FailurePolicy, Pipeline, PipelineEvent, PipelineOptions, CLASSIFICATION_FAILED,
};
use doclassify::summarize::Summarizer;

pub struct ClassifyArgs {
    pub file_type: FileTypeFilter,
    pub input_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub provider: Provider,
    pub isolate_failures: bool,
}

/// Classify every matching document and write the CSV report.
pub fn cmd_classify(config: &Config, args: ClassifyArgs) -> anyhow::Result<()> {
    // Fail on a bad output location before any backend is contacted
    let csv_path = output_path(&args.output_dir, &args.output_filename)?;

    let input_dir = match &args.input_dir {
        Some(dir) => resolve_path(&dir.to_string_lossy(), Path::new(".")),
        None => config.input_dir(),
    };

    let found = discover(&input_dir, args.file_type)?;
    if found.is_empty() {
        anyhow::bail!(
            "No documents found for the specified file type in {}",
            input_dir.display()
        );
    }

    let counts: Vec<String> = DocumentFormat::ALL
        .iter()
        .map(|f| format!("{} files: {}", f.display_name(), found.count(*f)))
        .collect();
    println!("{} {}", style("→").cyan(), counts.join(", "));

    let policy = if args.isolate_failures {
        FailurePolicy::Isolate
    } else {
        config.on_backend_error
    };
    let pipeline = build_pipeline(config, args.provider, policy)?;

    println!(
        "{} Summarizing with {}, classifying with {}",
        style("→").cyan(),
        style(config.summary_provider).bold(),
        style(args.provider).bold()
    );

    let mut reporter = ProgressReporter::new(std::io::stdout());
    let results = pipeline.run(&found.paths, |event| reporter.handle(event));
    reporter.finish();
    let results = results?;

    save_csv(&csv_path, &results)?;

    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for result in &results {
        *tally.entry(result.category.as_str()).or_default() += 1;
    }
    println!("\n{}", style("Summary").bold());
    for (category, count) in &tally {
        println!("  {:<24} {}", category, count);
    }

    println!(
        "{} Classification results saved to {}",
        style("✓").green(),
        csv_path.display()
    );

    Ok(())
}

/// Wire extractors and both backends into a pipeline.
fn build_pipeline(
    config: &Config,
    provider: Provider,
    on_backend_error: FailurePolicy,
) -> anyhow::Result<Pipeline> {
    let timeout = config.request_timeout();

    let summary_config = config.provider_config(config.summary_provider);
    let classify_config = config.provider_config(provider);
    for resolved in [&summary_config, &classify_config] {
        if resolved.api_key.is_none() {
            if let Some(var) = resolved.provider.credential_env() {
                eprintln!(
                    "{} {} is not set; requests to {} will likely be rejected",
                    style("!").yellow(),
                    var,
                    resolved.provider
                );
            }
        }
    }

    let summarizer = Summarizer::new(Box::new(LlmClient::with_timeout(summary_config, timeout)?));
    let classifier = Classifier::new(
        Box::new(LlmClient::with_timeout(classify_config, timeout)?),
        &config.categories,
    );

    Ok(Pipeline::new(
        ExtractorRegistry::default(),
        summarizer,
        classifier,
        PipelineOptions { on_backend_error },
    ))
}

/// Renders pipeline events as console lines under a progress bar.
///
/// Lines are written with the bar suspended, so they still appear when the
/// bar itself is hidden (stderr not a terminal).
struct ProgressReporter<W: Write> {
    out: W,
    bar: Option<ProgressBar>,
    draw_bar: bool,
}

impl<W: Write> ProgressReporter<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            bar: None,
            draw_bar: true,
        }
    }

    #[cfg(test)]
    fn without_bar(out: W) -> Self {
        Self {
            out,
            bar: None,
            draw_bar: false,
        }
    }

    fn line(&mut self, text: String) {
        let out = &mut self.out;
        match &self.bar {
            Some(bar) => bar.suspend(|| {
                let _ = writeln!(out, "{}", text);
            }),
            None => {
                let _ = writeln!(out, "{}", text);
            }
        }
    }

    fn handle(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started { total } => {
                self.line(format!("Total documents to process: {}", total));
                let bar = if self.draw_bar {
                    ProgressBar::new(*total as u64)
                } else {
                    ProgressBar::hidden()
                };
                bar.set_style(bar_style());
                self.bar = Some(bar);
            }
            PipelineEvent::Processing { index, total, path } => {
                let text = format!("Processing file {}/{}: {}", index, total, path.display());
                match &self.bar {
                    Some(bar) if !bar.is_hidden() => bar.set_message(text),
                    _ => self.line(text),
                }
            }
            PipelineEvent::Skipped { path } => {
                self.line(format!(
                    "  {} Skipped unsupported file {}",
                    style("○").yellow(),
                    path.display()
                ));
                self.advance();
            }
            PipelineEvent::Classified {
                remaining,
                path,
                category,
                ..
            } => {
                let label = if *category == CLASSIFICATION_FAILED {
                    style(*category).red()
                } else {
                    style(*category).green()
                };
                self.line(format!("Remaining documents: {}", remaining));
                self.line(format!(
                    "Document '{}' classified as: {}",
                    path.display(),
                    label
                ));
                self.advance();
            }
            PipelineEvent::BackendFailed { path, stage, error } => {
                self.line(format!(
                    "  {} {} failed for {}: {}",
                    style("✗").red(),
                    stage,
                    path.display(),
                    error
                ));
            }
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclassify::llm::BackendError;
    use doclassify::pipeline::Stage;

    #[test]
    fn test_lines_written_without_visible_bar() {
        console::set_colors_enabled(false);
        let a = PathBuf::from("/docs/a.pdf");
        let c = PathBuf::from("/docs/c.xyz");
        let error = BackendError::Connection("refused".to_string());

        let mut reporter = ProgressReporter::without_bar(Vec::new());
        reporter.handle(&PipelineEvent::Started { total: 2 });
        reporter.handle(&PipelineEvent::Processing {
            index: 1,
            total: 2,
            path: &a,
        });
        reporter.handle(&PipelineEvent::BackendFailed {
            path: &a,
            stage: Stage::Classify,
            error: &error,
        });
        reporter.handle(&PipelineEvent::Classified {
            index: 1,
            total: 2,
            remaining: 1,
            path: &a,
            category: "ClassificationFailed",
        });
        reporter.handle(&PipelineEvent::Processing {
            index: 2,
            total: 2,
            path: &c,
        });
        reporter.handle(&PipelineEvent::Skipped { path: &c });
        reporter.finish();

        let output = String::from_utf8(reporter.out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Total documents to process: 2",
                "Processing file 1/2: /docs/a.pdf",
                "  ✗ classification failed for /docs/a.pdf: Connection error: refused",
                "Remaining documents: 1",
                "Document '/docs/a.pdf' classified as: ClassificationFailed",
                "Processing file 2/2: /docs/c.xyz",
                "  ○ Skipped unsupported file /docs/c.xyz",
            ]
        );
    }
}
