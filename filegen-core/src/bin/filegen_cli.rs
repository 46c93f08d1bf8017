//! FileGenerator CLI - stands in for the web front end
//!
//! Commands: profiles, synthesize, generate
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 success, 1 bad input, 2 generation or export failure

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

use filegen_core::job::JobInfo;
use filegen_core::{
    logging, synthesize, Config, DataUriHost, DirectoryHost, DownloadHost, InputMode, JobState,
    ProfileId, ProfileRegistry, SaveReceipt, Session, StartOutcome,
};

#[derive(Parser)]
#[command(name = "filegen-cli")]
#[command(about = "FileGenerator CLI - describe it, upload it, get a file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List fabrication profiles
    Profiles {
        /// Only profiles that accept this output format (e.g. svg)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Render an artifact immediately, without the simulated job
    Synthesize {
        /// Profile id (3d, laser, vinyl, mill, cnc); unknown ids use laser
        #[arg(short, long, default_value = "laser")]
        profile: String,

        /// Literal text for the label
        #[arg(short, long, default_value = "")]
        text: String,

        /// Print the SVG document instead of JSON
        #[arg(long)]
        raw: bool,
    },

    /// Run the full flow: submit, wait for the job, download
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Profile id (3d, laser, vinyl, mill, cnc)
        #[arg(short, long, default_value = "laser")]
        profile: String,

        /// Turn the upload into a prompt before submitting
        #[arg(long, requires = "upload")]
        upload_to_prompt: bool,

        /// Directory to save into (defaults to FILEGEN_DOWNLOAD_DIR or ./downloads)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the file as a data URI instead of saving it
        #[arg(long, conflicts_with = "out")]
        data_uri: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Describe what you want to make
    #[arg(long)]
    prompt: Option<String>,

    /// Short text to put on the design (max 20 characters)
    #[arg(long)]
    text: Option<String>,

    /// Image or vector file to start from (svg, png, jpg, jpeg, ai, eps, pdf)
    #[arg(long)]
    upload: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", json!({ "error": e.to_string() }));
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log_filter);

    match cli.command {
        Commands::Profiles { format } => {
            let session = Session::new(&config);
            let profiles: Vec<_> = session
                .registry()
                .list()
                .into_iter()
                .filter(|p| format.as_deref().map_or(true, |f| p.accepts_format(f)))
                .map(|p| json!({
                    "id": p.id,
                    "name": p.name,
                    "tagline": p.tagline,
                    "accentColor": p.accent_color,
                    "formats": p.formats,
                    "demo": {
                        "title": p.demo_title,
                        "description": p.demo_description,
                    },
                }))
                .collect();

            println!("{:#}", json!(profiles));
            ExitCode::SUCCESS
        }

        Commands::Synthesize { profile, text, raw } => {
            let artifact = synthesize(&profile, &text);
            if raw {
                print!("{}", artifact.text_content);
            } else {
                let fallback = ProfileRegistry::builtin().find(&profile).is_none();
                println!("{:#}", json!({ "artifact": artifact, "fallback": fallback }));
            }
            ExitCode::SUCCESS
        }

        Commands::Generate { input, profile, upload_to_prompt, out, data_uri } => {
            let profile = match profile.parse::<ProfileId>() {
                Ok(p) => p,
                Err(e) => {
                    println!("{}", json!({ "success": false, "error": e.to_string() }));
                    return ExitCode::FAILURE;
                }
            };

            let mut session = Session::new(&config);
            if let Err(message) = apply_input(&mut session, input, profile, upload_to_prompt) {
                println!("{}", json!({ "success": false, "error": message }));
                return ExitCode::FAILURE;
            }

            match session.generate() {
                StartOutcome::Started(_) => {}
                StartOutcome::Rejected(reason) => {
                    println!("{}", json!({ "success": false, "rejected": reason }));
                    return ExitCode::FAILURE;
                }
            }

            let job = session.runner().active_job();
            if session.wait_until_settled().await != JobState::Complete {
                println!("{}", json!({ "success": false, "error": "job did not complete" }));
                return ExitCode::from(2);
            }

            if data_uri {
                let host = DataUriHost::new();
                download(&mut session, &host, job, |receipt| {
                    json!({ "receipt": receipt, "downloads": host.downloads() })
                })
                .await
            } else {
                let host = DirectoryHost::new(out.unwrap_or(config.download_dir.clone()));
                download(&mut session, &host, job, |receipt| json!({ "receipt": receipt })).await
            }
        }
    }
}

fn apply_input(
    session: &mut Session,
    input: InputArgs,
    profile: ProfileId,
    upload_to_prompt: bool,
) -> Result<(), String> {
    let collector = session.input_mut();
    collector.set_profile(profile);

    if let Some(prompt) = input.prompt {
        collector.set_mode(InputMode::Prompt);
        collector.set_prompt(prompt);
    } else if let Some(text) = input.text {
        collector.set_mode(InputMode::Text);
        collector.set_literal_text(&text);
    } else if let Some(path) = input.upload {
        let size = std::fs::metadata(&path)
            .map_err(|e| format!("{}: {}", path.display(), e))?
            .len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        collector.set_mode(InputMode::Upload);
        collector.select_upload(name, size).map_err(|e| e.to_string())?;
        if upload_to_prompt {
            collector.upload_to_prompt();
        }
    }

    Ok(())
}

async fn download<H, F>(
    session: &mut Session,
    host: &H,
    job: Option<JobInfo>,
    details: F,
) -> ExitCode
where
    H: DownloadHost,
    F: FnOnce(&SaveReceipt) -> serde_json::Value,
{
    match session.download(host).await {
        Ok(receipt) => {
            let mut output = details(&receipt);
            output["success"] = json!(true);
            output["job"] = json!(job);
            println!("{:#}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let output = json!({
                "success": false,
                "error": e.to_string(),
                "retryable": e.is_retryable(),
            });
            println!("{}", output);
            ExitCode::from(2)
        }
    }
}
