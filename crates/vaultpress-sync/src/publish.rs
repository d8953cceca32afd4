//! Publishing newsletter changes with git.
//!
//! [`GitPublisher::publish`] stages everything under the newsletter
//! directory, commits it with a summary message, and pushes. Each step is
//! recorded in the returned [`PublishReport`]; failures end up in its
//! [`PublishOutcome`] instead of an `Err`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use vaultpress_content::newsletter::DEFAULT_NEWSLETTER_DIR;
use vaultpress_core::{Error, Result};

/// Default time budget for one git command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cap on captured stdout/stderr per stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

const COMMIT_SUBJECT: &str = "content(周报): 同步周报更新";

const AUTH_FAILURE_MARKERS: &[&str] = &[
    "Permission denied",
    "Authentication failed",
    "Could not read from remote",
];

/// Newsletter files with uncommitted changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

impl ChangeSet {
    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len() + self.untracked.len()
    }

    /// Added and untracked files together.
    pub fn new_files(&self) -> usize {
        self.added.len() + self.untracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// The newsletter directory had no changes.
    NothingToSync,
    /// git found nothing to commit after staging.
    NothingToCommit,
    /// The push was rejected for lack of credentials.
    AuthenticationFailed,
    Published,
    Failed(String),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PublishOutcome::NothingToSync | PublishOutcome::NothingToCommit | PublishOutcome::Published
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub outcome: PublishOutcome,
    pub changes: ChangeSet,
    pub logs: Vec<String>,
}

/// Captured output of one git invocation.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn strip_quotes(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

/// Parse `git status --porcelain` output into a [`ChangeSet`].
///
/// Only paths containing `dir` are kept. Renames count as modifications
/// of their new path.
pub fn parse_porcelain(output: &str, dir: &str) -> ChangeSet {
    let dir = dir.replace('\\', "/");
    let dir = dir.trim_matches('/');
    let mut changes = ChangeSet::default();

    for line in output.lines() {
        if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
            continue;
        }
        let (code, rest) = line.split_at(2);
        let rest = rest[1..].trim();
        let path = rest.rsplit(" -> ").next().unwrap_or(rest);
        let path = strip_quotes(path).replace('\\', "/");
        if !path.contains(dir) {
            continue;
        }

        let mut flags = code.chars();
        let (x, y) = (flags.next().unwrap_or(' '), flags.next().unwrap_or(' '));
        match (x, y) {
            ('?', '?') => changes.untracked.push(path),
            ('A', _) => changes.added.push(path),
            ('D', _) | (_, 'D') => changes.deleted.push(path),
            (x, y) if "MRCTU".contains(x) || "MRCTU".contains(y) => changes.modified.push(path),
            _ => log::debug!("Ignoring porcelain status {code:?} for {path}"),
        }
    }
    changes
}

/// Whether git's stderr says the remote refused our credentials.
pub fn is_auth_failure(stderr: &str) -> bool {
    AUTH_FAILURE_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Read at most `max` bytes of a stream and discard the rest.
///
/// Returns the kept bytes and the number of bytes discarded. The stream is
/// drained to EOF so the child never blocks on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, max: usize) -> std::io::Result<(Vec<u8>, u64)> {
    let mut kept = Vec::new();
    (&mut reader).take(max as u64).read_to_end(&mut kept).await?;
    let dropped = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok((kept, dropped))
}

fn cap_output(bytes: &[u8], dropped: u64, max: usize, stream: &str) -> String {
    let text = String::from_utf8_lossy(bytes);
    if dropped == 0 && text.len() <= max {
        return text.into_owned();
    }
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!(
        "git {stream} truncated from {} to {end} bytes",
        bytes.len() as u64 + dropped
    );
    text[..end].to_string()
}

/// Commits and pushes the newsletter directory of a repository.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    pub git_binary: PathBuf,
    pub repo_root: PathBuf,
    /// Newsletter directory, relative to `repo_root`.
    pub newsletter_dir: String,
    pub remote: String,
    pub branch: String,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl GitPublisher {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            repo_root: repo_root.into(),
            newsletter_dir: DEFAULT_NEWSLETTER_DIR.to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_newsletter_dir(mut self, dir: impl Into<String>) -> Self {
        self.newsletter_dir = dir.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>, branch: impl Into<String>) -> Self {
        self.remote = remote.into();
        self.branch = branch.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_git_binary(mut self, git: impl Into<PathBuf>) -> Self {
        self.git_binary = git.into();
        self
    }

    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Run one git command in the repository.
    ///
    /// A non-zero exit is not an error here; spawn failures and timeouts
    /// are.
    pub async fn run_git(&self, args: &[&str]) -> Result<GitOutput> {
        let command_line = format!("git {}", args.join(" "));
        log::debug!("Running {command_line} in {}", self.repo_root.display());

        let mut command = Command::new(&self.git_binary);
        command
            .args(["-c", "core.quotepath=false"])
            .args(args)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| Error::process(format!("Failed to run {command_line}: {e}")))?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(Error::process(format!("No output pipes for {command_line}")));
        };

        let max = self.max_output_bytes;
        let collect = async {
            let (stdout, stderr) = tokio::try_join!(read_capped(stdout, max), read_capped(stderr, max))?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        let (status, (stdout, stdout_dropped), (stderr, stderr_dropped)) =
            match tokio::time::timeout(self.timeout, collect).await {
                Ok(Ok(collected)) => collected,
                Ok(Err(e)) => {
                    return Err(Error::process(format!("Failed to read output of {command_line}: {e}")));
                }
                Err(_) => {
                    return Err(Error::Timeout {
                        command: command_line,
                        seconds: self.timeout.as_secs(),
                    });
                }
            };

        Ok(GitOutput {
            success: status.success(),
            stdout: cap_output(&stdout, stdout_dropped, max, "stdout"),
            stderr: cap_output(&stderr, stderr_dropped, max, "stderr"),
        })
    }

    /// Uncommitted changes under the newsletter directory.
    pub async fn changes(&self) -> Result<ChangeSet> {
        let dir = self.newsletter_dir.as_str();
        let status = self
            .run_git(&["status", "--porcelain", "--untracked-files=all", dir])
            .await?;
        if !status.success {
            return Err(Error::process(format!("git status failed: {}", status.stderr.trim())));
        }

        let mut porcelain = status.stdout;
        if porcelain.trim().is_empty() {
            let others = self
                .run_git(&["ls-files", "--others", "--exclude-standard", dir])
                .await?;
            porcelain = others
                .stdout
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("?? {line}"))
                .collect::<Vec<_>>()
                .join("\n");
        }
        Ok(parse_porcelain(&porcelain, dir))
    }

    /// Stage, commit, and push newsletter changes.
    pub async fn publish(&self) -> PublishReport {
        let mut report = PublishReport {
            outcome: PublishOutcome::Published,
            changes: ChangeSet::default(),
            logs: Vec::new(),
        };
        if let Err(e) = self.publish_steps(&mut report).await {
            log::error!("Publishing failed: {e}");
            report.logs.push(format!("错误: {e}"));
            report.outcome = PublishOutcome::Failed(e.to_string());
        }
        report
    }

    async fn publish_steps(&self, report: &mut PublishReport) -> Result<()> {
        let changes = self.changes().await?;
        report.changes = changes.clone();
        let logs = &mut report.logs;

        if changes.is_empty() {
            logs.push("检查完成：周报目录没有未提交的更改".to_string());
            report.outcome = PublishOutcome::NothingToSync;
            return Ok(());
        }

        let (added, modified, deleted) = (changes.new_files(), changes.modified.len(), changes.deleted.len());
        logs.push(format!("检测到 {} 个更改：", changes.total()));
        logs.push(format!("- 新增: {added} 个文件"));
        logs.push(format!("- 修改: {modified} 个文件"));
        logs.push(format!("- 删除: {deleted} 个文件"));

        logs.push("正在添加文件到暂存区...".to_string());
        let add = self.run_git(&["add", "--", &self.newsletter_dir]).await?;
        if !add.success {
            return Err(Error::process(format!("git add failed: {}", add.stderr.trim())));
        }
        if !add.stderr.trim().is_empty() && !add.stderr.contains("warning") {
            logs.push(format!("警告: {}", add.stderr.trim()));
        }

        logs.push("正在创建提交...".to_string());
        let added_line = format!("- 新增: {added} 个文件");
        let modified_line = format!("- 修改: {modified} 个文件");
        let deleted_line = format!("- 删除: {deleted} 个文件");
        let commit = self
            .run_git(&[
                "commit",
                "-m",
                COMMIT_SUBJECT,
                "-m",
                &added_line,
                "-m",
                &modified_line,
                "-m",
                &deleted_line,
            ])
            .await?;
        if !commit.success {
            if commit.stdout.contains("nothing to commit") || commit.stderr.contains("nothing to commit") {
                logs.push("提示：文件可能已被提交".to_string());
                report.outcome = PublishOutcome::NothingToCommit;
                return Ok(());
            }
            return Err(Error::process(format!("git commit failed: {}", commit.stderr.trim())));
        }
        logs.push(format!("提交成功: {}", commit.stdout.trim()));

        logs.push(format!("正在推送到 {} {}...", self.remote, self.branch));
        let push = self.run_git(&["push", &self.remote, &self.branch]).await?;
        if !push.success {
            logs.push(format!("推送错误: {}", push.stderr.trim()));
            if is_auth_failure(&push.stderr) {
                report.outcome = PublishOutcome::AuthenticationFailed;
                return Ok(());
            }
            report.outcome = PublishOutcome::Failed(format!("git push failed: {}", push.stderr.trim()));
            return Ok(());
        }

        logs.push("推送成功！".to_string());
        log::info!("Published {} newsletter changes", changes.total());
        report.outcome = PublishOutcome::Published;
        Ok(())
    }
}
