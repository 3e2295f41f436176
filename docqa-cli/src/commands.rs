use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use docqa_rag::chunking::Chunker;
use docqa_rag::{PipelineResult, PromptTemplate, RagConfig, RagPipeline, SentenceChunker};
use docqa_server::{ServerConfig, ingest, run_server};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use crate::cli::BackendArgs;

/// Characters of each passage shown in answers.
const PREVIEW_CHARS: usize = 200;

/// Load a document from disk as text.
pub fn load_document(path: &Path) -> Result<String> {
    ingest::read_document(path).with_context(|| format!("failed to load {}", path.display()))
}

/// `docqa chunk`
pub fn chunk(input: &Path, size: usize, out: &mut impl Write) -> Result<()> {
    let text = load_document(input)?;
    let chunker = SentenceChunker::new(size)?;
    let chunks = chunker.chunk(&text);

    writeln!(out, "Chunked '{}' into {} chunks:\n", input.display(), chunks.len())?;
    for (i, chunk) in chunks.iter().enumerate() {
        writeln!(out, "--- Chunk {} ({} chars) ---", i, chunk.chars().count())?;
        writeln!(out, "{}\n", preview(chunk))?;
    }
    Ok(())
}

/// Build a pipeline for `ask` and index `input` with it.
pub async fn prepare(
    input: &Path,
    chunk_size: usize,
    top_k: usize,
    plain_prompt: bool,
    backend: &BackendArgs,
) -> Result<RagPipeline> {
    let template = if plain_prompt { PromptTemplate::plain() } else { PromptTemplate::llama2_chat() };
    let rag = RagConfig::builder().chunk_size(chunk_size).top_k(top_k).template(template).build()?;
    let pipeline = backend.to_config().build_pipeline(rag)?;

    let text = load_document(input)?;
    let chunks = pipeline.ingest(&text).await.context("failed to index document")?;
    if chunks == 0 {
        anyhow::bail!("{} contains no text", input.display());
    }
    info!(chunks, path = %input.display(), "document indexed");
    Ok(pipeline)
}

/// Answer one question and print the answer with its sources.
pub async fn ask_once(pipeline: &RagPipeline, question: &str, out: &mut impl Write) -> Result<()> {
    let result = pipeline.process(question).await?;
    print_result(&result, out)?;
    Ok(())
}

/// Read questions from the terminal until EOF, Ctrl-C, `exit` or `quit`.
pub async fn repl(pipeline: &RagPipeline) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Ask a question about the document. Type 'exit' to quit.");

    loop {
        match editor.readline("docqa> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if matches!(question, "exit" | "quit") {
                    break;
                }
                let _ = editor.add_history_entry(question);

                let mut stdout = std::io::stdout();
                if let Err(e) = ask_once(pipeline, question, &mut stdout).await {
                    eprintln!("error: {e:#}");
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// `docqa serve`
pub async fn serve(
    host: String,
    port: u16,
    preload: Option<&Path>,
    backend: &BackendArgs,
) -> Result<()> {
    let pipeline = backend.to_config().build_pipeline(RagConfig::default())?;
    if let Some(path) = preload {
        let chunks = pipeline.ingest(&load_document(path)?).await?;
        info!(chunks, path = %path.display(), "preloaded document");
    }
    let config = ServerConfig { host, port, ..ServerConfig::from_env() };
    run_server(config, pipeline).await
}

pub fn print_result(result: &PipelineResult, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "\nQuery: {}", result.query)?;
    writeln!(out, "\nResponse: {}", result.response)?;
    writeln!(out, "\nRetrieved documents:")?;
    for (rank, retrieved) in result.retrieved.iter().enumerate() {
        writeln!(out, "\n{}. Score: {:.2}", rank + 1, retrieved.score)?;
        writeln!(out, "{}", preview(&retrieved.chunk.text))?;
    }
    Ok(())
}

/// The first 200 characters of `text`, with `...` when cut.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}
