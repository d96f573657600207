use std::thread;

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::domain::{ComicId, ComicRecord};
use crate::error::ArchiveError;
use crate::render;
use crate::store::{ArchiveOutcome, Store};
use crate::summary;
use crate::xkcd::ComicClient;

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// Highest id found on disk before this run; fetching starts right after.
    pub started_after: u32,
    pub records: Vec<ComicRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub started_after: u32,
    pub fetched: Vec<ComicRecord>,
    pub archived: Vec<ArchiveOutcome>,
    pub summary_written: bool,
    pub finished_at: String,
}

/// The whole pipeline: scan, fetch, write, archive, summarize. Sequential
/// and blocking throughout; the only shared state is the filesystem.
pub struct App<C: ComicClient> {
    store: Store,
    client: C,
    config: ResolvedConfig,
}

impl<C: ComicClient> App<C> {
    pub fn new(store: Store, client: C, config: ResolvedConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Full run. Fetch failures for individual ids do not prevent archiving
    /// or the summary; transport and filesystem errors abort.
    pub fn run<R: Rng>(&self, count: Option<u32>, rng: &mut R) -> Result<RunResult, ArchiveError> {
        let fetch = self.fetch_new(count)?;
        let archived = self.organize()?;
        let summary_written = self.write_summary(&fetch.records, rng)?;
        Ok(RunResult {
            started_after: fetch.started_after,
            fetched: fetch.records,
            archived,
            summary_written,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Attempts the `count` ids following the highest one on disk, in
    /// ascending order, with a fixed delay between requests. A non-success
    /// status skips that id and the run continues.
    pub fn fetch_new(&self, count: Option<u32>) -> Result<FetchResult, ArchiveError> {
        self.store.ensure_root()?;

        let processed = self.store.scan()?;
        let started_after = processed.highest().map(ComicId::get).unwrap_or(0);
        let count = count.unwrap_or(self.config.fetch_count);
        info!(
            highest = started_after,
            count, "fetching comics after the highest archived id"
        );

        let mut records = Vec::new();
        for n in started_after + 1..=started_after + count {
            let id = ComicId::new(n);
            match self.client.fetch_comic(id) {
                Ok(info) => {
                    let record = ComicRecord {
                        id,
                        title: info.title,
                        image: info.img,
                    };
                    let body = render::render_record(
                        &self.config.record_template,
                        &self.config.base_url,
                        &record,
                    );
                    let path = self.store.write_record(id, &body)?;
                    info!(%id, %path, "wrote comic record");
                    records.push(record);
                }
                Err(ArchiveError::Status { status, .. }) => {
                    warn!(%id, status, "comic fetch failed, skipping");
                }
                Err(err) => return Err(err),
            }

            if !self.config.request_delay.is_zero() {
                thread::sleep(self.config.request_delay);
            }
        }

        Ok(FetchResult {
            started_after,
            records,
        })
    }

    /// Moves loose records into the bucketed tree.
    pub fn organize(&self) -> Result<Vec<ArchiveOutcome>, ArchiveError> {
        self.store.archive()
    }

    /// Regenerates the summary file from this run's records. Returns whether
    /// one was written; with too few records the previous summary file is
    /// left untouched.
    pub fn write_summary<R: Rng>(
        &self,
        records: &[ComicRecord],
        rng: &mut R,
    ) -> Result<bool, ArchiveError> {
        let Some(body) = summary::build_summary(
            &self.config.summary_template,
            &self.config.record_template,
            &self.config.base_url,
            records,
            rng,
        ) else {
            warn!(
                fetched = records.len(),
                minimum = summary::MIN_RECORDS,
                "not enough records for a summary, skipping"
            );
            return Ok(false);
        };
        Store::write_summary(&self.config.summary_path, &body)?;
        info!(path = %self.config.summary_path, "wrote summary");
        Ok(true)
    }

    /// Highest id currently on disk, 0 when the archive is empty.
    pub fn latest(&self) -> Result<u32, ArchiveError> {
        Ok(self.store.scan()?.highest().map(ComicId::get).unwrap_or(0))
    }
}
