//! Spawning helpers for external media tools.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Keep child processes from flashing a console window on Windows.
///
/// No-op elsewhere.
pub trait NoWindowExt {
    fn no_window(&mut self) -> &mut Self;
}

impl NoWindowExt for Command {
    fn no_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

/// A tool invocation that runs detached from the terminal.
///
/// stdin and stdout are closed, stderr is captured so failures can be
/// reported, and the child is killed if the handle is dropped mid-run.
pub fn tool_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.no_window()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Whether `program` can be launched at all.
///
/// Runs `program <probe_arg>` and only checks that the spawn succeeded; the
/// exit status is ignored since some tools return non-zero for `-version`.
pub async fn program_available(program: impl AsRef<OsStr>, probe_arg: &str) -> bool {
    let mut cmd = tool_command(program);
    cmd.arg(probe_arg).stderr(Stdio::null());
    cmd.status().await.is_ok()
}

/// Last non-empty line of a tool's stderr, which is usually the error.
pub fn last_stderr_line(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_owned)
}
