use anyhow::Result;
use clap::Parser;
use docqa_cli::{Cli, Commands, commands};
use docqa_telemetry::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Text };
    docqa_telemetry::init_with_format(format, level)?;

    match cli.command {
        Commands::Chunk { input, size } => {
            commands::chunk(&input, size, &mut std::io::stdout())?;
        }
        Commands::Ask { input, question, k, chunk_size, plain_prompt, backend } => {
            let pipeline = commands::prepare(&input, chunk_size, k, plain_prompt, &backend).await?;
            match question {
                Some(question) => {
                    commands::ask_once(&pipeline, &question, &mut std::io::stdout()).await?
                }
                None => commands::repl(&pipeline).await?,
            }
        }
        Commands::Serve { host, port, preload, backend } => {
            commands::serve(host, port, preload.as_deref(), &backend).await?;
        }
    }

    Ok(())
}
