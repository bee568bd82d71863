// src/bin/upload.rs
// DOCUMENTATION: Bulk upload client for the admin upload endpoint
// PURPOSE: Push every image in a directory, four at a time, with one retry per file

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

// --- Terminal colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const MAX_IN_FLIGHT: usize = 4;
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Parser, Debug)]
#[command(name = "folio-upload", about = "Upload a directory of photos to photo-folio")]
struct Args {
    /// Directory containing the images
    dir: PathBuf,

    /// Base URL of the photo-folio server
    #[arg(long, env = "FOLIO_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Admin session token (as returned by /api/auth/login)
    #[arg(long, env = "FOLIO_TOKEN")]
    token: String,

    /// Publish the uploaded photos immediately
    #[arg(long)]
    public: bool,

    /// Album id to attach the photos to
    #[arg(long)]
    album: Option<String>,

    /// Comma separated tags applied to every photo
    #[arg(long)]
    tags: Option<String>,
}

/// Fixed-delay retry
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempts are used up.
    /// `op` receives the 1-based attempt number.
    async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    log::debug!("Attempt {} failed: {:#}", attempt, e);
                    attempt += 1;
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[derive(Deserialize, Debug)]
struct UploadedPhoto {
    id: String,
}

#[derive(Deserialize, Debug)]
struct UploadedResult {
    photo: UploadedPhoto,
    duplicate: bool,
}

#[derive(Deserialize, Debug)]
struct UploadResponse {
    results: Vec<UploadedResult>,
}

#[derive(Debug)]
struct FileReport {
    name: String,
    outcome: Result<UploadedResult, String>,
    attempts: u32,
    duration_secs: f64,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name
fn discover_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

struct Uploader {
    client: Client,
    endpoint: String,
    token: String,
    public: bool,
    album: Option<String>,
    tags: Option<String>,
}

impl Uploader {
    fn new(args: &Args) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/admin/upload", args.server.trim_end_matches('/')),
            token: args.token.clone(),
            public: args.public,
            album: args.album.clone(),
            tags: args.tags.clone(),
        })
    }

    async fn upload(&self, path: &Path) -> Result<UploadedResult> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("is_public", self.public.to_string());
        if let Some(album) = &self.album {
            form = form.text("album_id", album.clone());
        }
        if let Some(tags) = &self.tags {
            form = form.text("tags", tags.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} - {}", status, body);
        }

        let parsed: UploadResponse = response.json().await.context("unexpected response body")?;
        parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("server returned no result"))
    }
}

async fn upload_all(
    uploader: Arc<Uploader>,
    files: Vec<PathBuf>,
    policy: RetryPolicy,
) -> Vec<FileReport> {
    let semaphore = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
    let total = files.len();
    let mut handles = Vec::with_capacity(total);

    for (i, path) in files.into_iter().enumerate() {
        let uploader = uploader.clone();
        let semaphore = semaphore.clone();

        handles.push(tokio::spawn(async move {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let started = Instant::now();
            let mut attempts = 0;

            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => policy
                    .run(|attempt| {
                        attempts = attempt;
                        let uploader = uploader.clone();
                        let path = path.clone();
                        async move { uploader.upload(&path).await }
                    })
                    .await
                    .map_err(|e| format!("{:#}", e)),
                Err(e) => Err(e.to_string()),
            };

            match &outcome {
                Ok(result) if result.duplicate => println!(
                    "{}[{}/{}] = {} already stored as {}{}",
                    YELLOW, i + 1, total, name, result.photo.id, RESET
                ),
                Ok(result) => println!(
                    "{}[{}/{}] ✓ {} -> {}{}",
                    GREEN, i + 1, total, name, result.photo.id, RESET
                ),
                Err(e) => println!("{}[{}/{}] ✗ {}: {}{}", RED, i + 1, total, name, e, RESET),
            }

            FileReport {
                name,
                outcome,
                attempts,
                duration_secs: started.elapsed().as_secs_f64(),
            }
        }));
    }

    let mut reports = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => log::error!("Upload task panicked: {}", e),
        }
    }
    reports
}

fn print_summary(reports: &[FileReport], elapsed: Duration) -> usize {
    let created = reports
        .iter()
        .filter(|r| matches!(&r.outcome, Ok(res) if !res.duplicate))
        .count();
    let duplicates = reports
        .iter()
        .filter(|r| matches!(&r.outcome, Ok(res) if res.duplicate))
        .count();
    let failed: Vec<&FileReport> = reports.iter().filter(|r| r.outcome.is_err()).collect();
    let retried = reports.iter().filter(|r| r.attempts > 1).count();

    println!("\n{}📋 Upload Summary{}", BOLD, RESET);
    println!("──────────────────────────────────────────");
    println!("  • Uploaded:   {}{}{}", GREEN, created, RESET);
    println!("  • Duplicates: {}{}{}", YELLOW, duplicates, RESET);
    println!("  • Failed:     {}{}{}", RED, failed.len(), RESET);
    println!("  • Retried:    {}", retried);
    println!("  • Duration:   {:.1}s", elapsed.as_secs_f64());

    for report in &failed {
        if let Err(e) = &report.outcome {
            println!(
                "{}    {} ({:.1}s): {}{}",
                RED, report.name, report.duration_secs, e, RESET
            );
        }
    }
    failed.len()
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let files = match discover_images(&args.dir) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}❌ {:#}{}", RED, e, RESET);
            std::process::exit(1);
        }
    };
    if files.is_empty() {
        println!("{}No images found in {}{}", YELLOW, args.dir.display(), RESET);
        return;
    }

    let uploader = match Uploader::new(&args) {
        Ok(uploader) => Arc::new(uploader),
        Err(e) => {
            eprintln!("{}❌ {:#}{}", RED, e, RESET);
            std::process::exit(1);
        }
    };

    println!(
        "{}🚀 Uploading {} images to {} ({} at a time){}\n",
        CYAN,
        files.len(),
        uploader.endpoint,
        MAX_IN_FLIGHT,
        RESET
    );

    let started = Instant::now();
    let reports = upload_all(uploader, files, RetryPolicy::default()).await;
    let failures = print_summary(&reports, started.elapsed());

    if failures > 0 {
        std::process::exit(1);
    }
}
