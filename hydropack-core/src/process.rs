// hydropack-core/src/process.rs
use std::collections::HashMap;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;

use hydropack_common::error::{HydroError, Result};
use tokio::process::Command;
use tracing::{debug, error};

/// Runs `program` with an explicit working directory and waits for it.
///
/// Output is inherited when `inherit_output` is set (long-running tools like
/// yarn), otherwise captured and returned. A non-zero exit is an error.
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: &Path,
    envs: &HashMap<String, String>,
    inherit_output: bool,
) -> Result<Output> {
    debug!(
        "Running command: {} {:?} (cwd: {}, envs: {:?})",
        program,
        args,
        cwd.display(),
        envs.keys().collect::<Vec<_>>()
    );

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.current_dir(cwd);
    cmd.envs(envs);
    cmd.kill_on_drop(true);
    cmd.stdin(Stdio::null());
    if inherit_output {
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
    }

    let output = cmd.output().await.map_err(|e| {
        error!("Failed to execute {}: {}", program, e);
        HydroError::Io(Arc::new(e))
    })?;

    if output.status.success() {
        debug!("Command finished successfully: {} {:?}", program, args);
        return Ok(output);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!("Stderr:\n{}", stderr.trim());
    }
    Err(HydroError::CommandExecError(format!(
        "'{} {}' exited with {}{}",
        program,
        args.join(" "),
        output.status,
        if stderr.trim().is_empty() {
            String::new()
        } else {
            format!(": {}", stderr.trim())
        }
    )))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_command("pwd", &[], dir.path(), &HashMap::new(), false)
            .await
            .unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            Path::new(printed.trim()).canonicalize().unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command("sh", &["-c", "echo broken >&2; exit 3"], dir.path(), &HashMap::new(), false)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit"));
        assert!(msg.contains("broken"));
    }

    #[tokio::test]
    async fn passes_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut envs = HashMap::new();
        envs.insert("HYDROPACK_PROBE".to_string(), "42".to_string());
        let output = run_command("sh", &["-c", "printf %s \"$HYDROPACK_PROBE\""], dir.path(), &envs, false)
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "42");
    }
}
