//! Progress reporting seam for long replays.

/// Receives coarse progress while a replay walks its timeline. Implementations
/// must be cheap; the driver calls at most once per percent.
pub trait ReplayProgress: Send {
    fn report(&mut self, percent: u8, message: &str);
}

/// Prints progress lines to stdout. The default for the CLI.
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl ReplayProgress for StdoutProgress {
    fn report(&mut self, percent: u8, message: &str) {
        println!("[{percent:>3}%] {message}");
    }
}

/// Discards progress. The default for tests and library embedding.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ReplayProgress for NullProgress {
    fn report(&mut self, _percent: u8, _message: &str) {}
}
