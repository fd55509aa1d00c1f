//! System-level helpers for the command-line front end.

use tokio::process::Command;

use crm_cloud_sync::SyncError;

pub async fn run_command(command: &str, args: &[&str]) -> Result<(), SyncError> {
    let output = Command::new(command).args(args).output().await?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(SyncError::Config(if stderr.is_empty() {
        format!(
            "Command `{}` with args {:?} failed with status {}",
            command, args, output.status
        )
    } else {
        format!("Command `{}` with args {:?} failed: {}", command, args, stderr)
    }))
}

/// Open `url` in the desktop's default browser.
pub async fn open_browser(url: &str) -> Result<(), SyncError> {
    #[cfg(target_os = "windows")]
    {
        run_command("cmd", &["/c", "start", "", url]).await
    }

    #[cfg(target_os = "macos")]
    {
        run_command("open", &[url]).await
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        run_command("xdg-open", &[url]).await
    }
}
