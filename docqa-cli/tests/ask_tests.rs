//! Runs the `chunk` and `ask` commands offline against a file on disk.

use std::io::Write;

use clap::Parser;
use docqa_cli::{Cli, Commands, commands};

const DOCUMENT: &str = "Paris is the capital of France. The Eiffel Tower is in Paris. \
                        Berlin is the capital of Germany.";

fn write_document(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn offline_ask_prints_prompt_and_sources() {
    let file = write_document(".txt", DOCUMENT);
    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from([
        "docqa",
        "ask",
        path,
        "--offline",
        "--chunk-size",
        "40",
        "-k",
        "1",
        "--plain-prompt",
    ])
    .unwrap();
    let Commands::Ask { input, k, chunk_size, plain_prompt, backend, .. } = cli.command else {
        panic!("expected ask");
    };

    let pipeline = commands::prepare(&input, chunk_size, k, plain_prompt, &backend).await.unwrap();
    assert_eq!(pipeline.retriever().chunk_count().await, 3);

    let mut out = Vec::new();
    commands::ask_once(&pipeline, "What is the capital of France?", &mut out).await.unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert!(printed.contains("Query: What is the capital of France?"));
    assert!(printed.contains("Response: Context information is below."));
    assert!(printed.contains("1. Score: 0.75"));
    assert!(printed.contains("Paris is the capital of France."));
    assert!(!printed.contains("2. Score"));
}

#[tokio::test]
async fn ask_rejects_empty_document() {
    let file = write_document(".txt", "   \n");
    let cli = Cli::try_parse_from(["docqa", "ask", file.path().to_str().unwrap(), "--offline"])
        .unwrap();
    let Commands::Ask { input, k, chunk_size, plain_prompt, backend, .. } = cli.command else {
        panic!("expected ask");
    };

    let err = commands::prepare(&input, chunk_size, k, plain_prompt, &backend).await.err().expect("expected prepare to fail");
    assert!(err.to_string().contains("contains no text"), "{err}");
}

#[test]
fn chunk_command_lists_chunks() {
    let file = write_document(".md", DOCUMENT);
    let mut out = Vec::new();
    commands::chunk(file.path(), 40, &mut out).unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert!(printed.contains("into 3 chunks"));
    assert!(printed.contains("--- Chunk 0 (31 chars) ---"));
    assert!(printed.contains("Berlin is the capital of Germany."));
}

#[test]
fn chunk_command_rejects_unknown_extension() {
    let file = write_document(".docx", DOCUMENT);
    let err = commands::chunk(file.path(), 40, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("unsupported content type"));
}
