//! Jenkins CLI backend.
//!
//! Shells out to `java -jar jenkins-cli.jar -s <host> [-auth <cred>] <command>
//! <entity>`, feeding the payload on stdin. A channel is opened by running
//! `who-am-i` once, which checks both reachability and credentials.
//!
//! When no jar is configured, `jenkins-cli.jar` is downloaded once from the
//! first instance connected to (`<host>jnlpJars/jenkins-cli.jar`) and cached.

use crate::backend::{Channel, CommandOutput, Connector};
use crate::error::{Error, Result};
use crate::response::FAILURE_CODE;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

/// Maximum accepted size of a downloaded CLI jar.
const MAX_JAR_SIZE: u64 = 64 * 1024 * 1024;

/// File name of the CLI jar, locally and on the server
pub const JAR_NAME: &str = "jenkins-cli.jar";

/// How to launch the CLI.
#[derive(Debug, Clone)]
pub struct CliSettings {
    /// Java executable
    pub java: String,
    /// Explicit jar; downloaded into `cache_dir` when `None`
    pub jar: Option<PathBuf>,
    /// Directory holding the downloaded jar
    pub cache_dir: PathBuf,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            jar: None,
            cache_dir: default_cache_dir(),
        }
    }
}

/// Default cache directory for the downloaded jar.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cloner")
}

/// Connector launching `jenkins-cli.jar`.
pub struct JenkinsCliConnector {
    settings: CliSettings,
    credentials: HashMap<String, String>,
    jar: Mutex<Option<PathBuf>>,
}

impl JenkinsCliConnector {
    pub fn new(settings: CliSettings) -> Self {
        let jar = settings.jar.clone();
        Self {
            settings,
            credentials: HashMap::new(),
            jar: Mutex::new(jar),
        }
    }

    /// Authenticate to `host` with `auth` (`user:token` or `@file`).
    pub fn with_credentials(mut self, host: &str, auth: impl Into<String>) -> Self {
        self.credentials.insert(normalize_host(host), auth.into());
        self
    }

    /// Jar to launch, downloading it from `host` on first use.
    fn jar_for(&self, host: &str) -> Result<PathBuf> {
        let mut jar = self.jar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = jar.as_ref() {
            return Ok(path.clone());
        }

        let cached = self.settings.cache_dir.join(JAR_NAME);
        if !cached.is_file() {
            download_jar(host, &cached)?;
        }
        *jar = Some(cached.clone());
        Ok(cached)
    }
}

impl Connector for JenkinsCliConnector {
    fn connect(&self, host: &str) -> Result<Arc<dyn Channel>> {
        let channel = CliChannel {
            java: self.settings.java.clone(),
            jar: self.jar_for(host)?,
            host: host.to_string(),
            auth: self.credentials.get(&normalize_host(host)).cloned(),
        };

        let whoami = channel.invoke("who-am-i", "", "")?;
        if !whoami.succeeded() {
            return Err(Error::Connection {
                host: host.to_string(),
                message: first_line(&whoami.stderr)
                    .unwrap_or("authentication failed")
                    .to_string(),
            });
        }

        log::info!(
            "Connected to {} ({})",
            host,
            first_line(&whoami.stdout).unwrap_or("anonymous")
        );
        Ok(Arc::new(channel))
    }
}

struct CliChannel {
    java: String,
    jar: PathBuf,
    host: String,
    auth: Option<String>,
}

impl CliChannel {
    fn args(&self, command: &str, entity: &str) -> Vec<String> {
        let mut args = vec![
            "-jar".to_string(),
            self.jar.display().to_string(),
            "-s".to_string(),
            self.host.clone(),
        ];
        if let Some(auth) = &self.auth {
            args.push("-auth".to_string());
            args.push(auth.clone());
        }
        args.push(command.to_string());
        if !entity.is_empty() {
            args.push(entity.to_string());
        }
        args
    }
}

impl Channel for CliChannel {
    fn invoke(&self, command: &str, entity: &str, payload: &str) -> Result<CommandOutput> {
        let args = self.args(command, entity);
        log::trace!("Running {} {} {} {}", self.java, self.host, command, entity);

        let connection_error = |e: std::io::Error| Error::Connection {
            host: self.host.clone(),
            message: format!("failed to execute {}: {}", self.java, e),
        };

        let mut child = Command::new(&self.java)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(connection_error)?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock
        // against a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let payload = payload.to_string();
            let label = format!("{command} {entity} on {}", self.host);
            std::thread::spawn(move || {
                write_payload(&mut stdin, &payload, &label);
            })
        });

        let output = child.wait_with_output().map_err(connection_error)?;
        if let Some(handle) = writer {
            let _ = handle.join();
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(FAILURE_CODE),
        })
    }
}

/// Feed `payload` to the CLI; `false` when it did not go through in full.
fn write_payload(sink: &mut impl Write, payload: &str, label: &str) -> bool {
    if payload.is_empty() {
        return true;
    }
    match sink.write_all(payload.as_bytes()) {
        Ok(()) => true,
        Err(e) => {
            log::debug!(
                "Writing {} byte payload for {} failed: {}",
                payload.len(),
                label,
                e
            );
            false
        }
    }
}

/// Download the CLI jar served by `host` into `target`.
fn download_jar(host: &str, target: &Path) -> Result<()> {
    let url = format!("{}jnlpJars/{}", normalize_host(host), JAR_NAME);
    log::info!("Downloading {}", url);

    let failed = |message: String| Error::Connection {
        host: host.to_string(),
        message,
    };

    let bytes = ureq::get(&url)
        .header("User-Agent", "cloner")
        .call()
        .map_err(|e| failed(format!("unable to download {url}: {e}")))?
        .body_mut()
        .with_config()
        .limit(MAX_JAR_SIZE)
        .read_to_vec()
        .map_err(|e| failed(format!("unable to download {url}: {e}")))?;

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| failed(format!("{}: {e}", dir.display())))?;

    // Write next to the target and rename so a partial download never
    // passes for a cached jar.
    let partial = target.with_extension("jar.part");
    fs::write(&partial, &bytes).map_err(|e| failed(format!("{}: {e}", partial.display())))?;
    fs::rename(&partial, target).map_err(|e| failed(format!("{}: {e}", target.display())))?;

    Ok(())
}

fn normalize_host(host: &str) -> String {
    if host.ends_with('/') {
        host.to_string()
    } else {
        format!("{host}/")
    }
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
