//! chunkpush entry point.
//!
//! Thin driver around `chunkpush-transfer`: argument parsing, colored
//! console output, and process exit codes live here and nowhere else.

use std::path::PathBuf;
use std::process::ExitCode;

use chunkpush_protocol::MissingStatus;
use chunkpush_transfer::{HttpTransport, TransferError, TransferEvent, TransferOrchestrator};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chunkpush", version, about = "Resumable chunked file upload client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file to the remote server in resumable chunks
    Upload {
        /// Credential passed verbatim in the Authorization header
        apikey: String,
        /// Remote server URL for upload
        url: String,
        /// File to upload
        file: PathBuf,
        /// Probe status the server uses for "chunk absent" (404 or 400)
        #[arg(long, default_value = "404", value_parser = parse_missing_status)]
        missing_status: MissingStatus,
    },
}

fn parse_missing_status(s: &str) -> Result<MissingStatus, String> {
    let code: u16 = s.parse().map_err(|_| format!("invalid status: {s}"))?;
    MissingStatus::from_code(code).ok_or_else(|| "must be 404 or 400".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting chunkpush");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    // Bare invocation prints usage and succeeds.
    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("Error: {err}").red());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), TransferError> {
    let Commands::Upload {
        apikey,
        url,
        file,
        missing_status,
    } = command;

    let transport = HttpTransport::new(&url, &apikey, missing_status)?;
    let mut orchestrator = TransferOrchestrator::new(&transport);

    let printer = orchestrator.take_events().map(|mut events| {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        })
    });

    let result = orchestrator.run(&file).await;

    // Dropping the orchestrator closes the event channel so the printer
    // drains and finishes before the final result line.
    drop(orchestrator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let report = result?;
    if let Some(body) = report.final_body {
        println!("Result:");
        println!("{}", body.green());
    }
    Ok(())
}

fn print_event(event: &TransferEvent) {
    match event {
        TransferEvent::ChunkExists { chunk, total } => {
            println!("{}", format!("[{chunk}/{total}] Chunk exists!").green());
        }
        TransferEvent::ChunkUploading {
            chunk,
            total,
            bytes,
        } => {
            println!(
                "{}",
                format!("[{chunk}/{total}] Uploading chunk of size {bytes} bytes").green()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload_arguments() {
        let cli = Cli::try_parse_from([
            "chunkpush",
            "upload",
            "key-123",
            "http://localhost:8080/upload",
            "game.tar",
        ])
        .unwrap();

        let Some(Commands::Upload {
            apikey,
            url,
            file,
            missing_status,
        }) = cli.command
        else {
            panic!("expected upload command");
        };
        assert_eq!(apikey, "key-123");
        assert_eq!(url, "http://localhost:8080/upload");
        assert_eq!(file, PathBuf::from("game.tar"));
        assert_eq!(missing_status, MissingStatus::NotFound);
    }

    #[test]
    fn missing_status_accepts_both_conventions() {
        let cli = Cli::try_parse_from([
            "chunkpush",
            "upload",
            "k",
            "http://localhost:8080",
            "f.bin",
            "--missing-status",
            "400",
        ])
        .unwrap();
        let Some(Commands::Upload { missing_status, .. }) = cli.command else {
            panic!("expected upload command");
        };
        assert_eq!(missing_status, MissingStatus::BadRequest);
    }

    #[test]
    fn missing_status_rejects_other_codes() {
        let result = Cli::try_parse_from([
            "chunkpush",
            "upload",
            "k",
            "http://localhost:8080",
            "f.bin",
            "--missing-status",
            "500",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn too_few_arguments_is_an_error() {
        assert!(Cli::try_parse_from(["chunkpush", "upload", "key"]).is_err());
    }

    #[test]
    fn bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["chunkpush"]).unwrap();
        assert!(cli.command.is_none());
    }
}
