use std::fmt;
use std::os::unix::process::ExitStatusExt;

/// Code reported for a command that could not be launched.
pub const LAUNCH_FAILED_CODE: i32 = 127;

/// Classified outcome of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(i32),
    LaunchFailed,
}

impl ExitStatus {
    pub const SUCCESS: Self = Self::Exited(0);
    pub const FAILURE: Self = Self::Exited(1);

    pub fn success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Numeric code in the usual shell convention (128 + signal for signals).
    pub fn code(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Signaled(signal) => 128 + signal,
            Self::LaunchFailed => LAUNCH_FAILED_CODE,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Self::Exited(code),
            (None, Some(signal)) => Self::Signaled(signal),
            // Neither a code nor a signal only happens for stopped children,
            // which a blocking wait never reports.
            (None, None) => Self::FAILURE,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "terminated by signal {signal}"),
            Self::LaunchFailed => f.write_str("failed to launch"),
        }
    }
}
