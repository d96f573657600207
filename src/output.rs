use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FetchResult, RunResult};
use crate::store::ArchiveOutcome;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_archive(outcomes: &[ArchiveOutcome]) -> io::Result<()> {
        Self::print_json(&outcomes)
    }

    pub fn print_latest(latest: u32) -> io::Result<()> {
        Self::print_json(&serde_json::json!({ "latest": latest }))
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
