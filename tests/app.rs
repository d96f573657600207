use std::time::Duration;

use camino::Utf8PathBuf;
use rand::SeedableRng;
use rand::rngs::StdRng;

use comic_archiver::app::App;
use comic_archiver::config::{
    DEFAULT_RECORD_TEMPLATE, DEFAULT_SUMMARY_TEMPLATE, ResolvedConfig,
};
use comic_archiver::domain::{ComicId, ComicRecord};
use comic_archiver::error::ArchiveError;
use comic_archiver::store::{ArchiveAction, Store};
use comic_archiver::xkcd::{ComicClient, ComicInfo};

/// Serves synthetic metadata for every id except the ones listed as failing,
/// which answer 404.
struct MockClient {
    failing: Vec<u32>,
}

impl MockClient {
    fn new(failing: impl Into<Vec<u32>>) -> Self {
        Self {
            failing: failing.into(),
        }
    }
}

impl ComicClient for MockClient {
    fn fetch_comic(&self, id: ComicId) -> Result<ComicInfo, ArchiveError> {
        if self.failing.contains(&id.get()) {
            return Err(ArchiveError::Status {
                status: 404,
                message: "not found".to_string(),
            });
        }
        Ok(ComicInfo {
            title: format!("Comic {id}"),
            img: format!("https://imgs.example.com/{id}.png"),
        })
    }
}

struct Fixture {
    _temp: tempfile::TempDir,
    config: ResolvedConfig,
}

impl Fixture {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let output_root = Utf8PathBuf::from_path_buf(temp.path().join("comics")).unwrap();
        let summary_path = Utf8PathBuf::from_path_buf(temp.path().join("README.md")).unwrap();
        let log_path = output_root.join("comic-archiver.log");
        let config = ResolvedConfig {
            output_root,
            base_url: "https://xkcd.example".to_string(),
            request_delay: Duration::ZERO,
            fetch_count: 10,
            summary_path,
            log_path,
            record_template: DEFAULT_RECORD_TEMPLATE.to_string(),
            summary_template: DEFAULT_SUMMARY_TEMPLATE.to_string(),
        };
        Self {
            _temp: temp,
            config,
        }
    }

    fn app(&self, client: MockClient) -> App<MockClient> {
        let store = Store::new(self.config.output_root.clone());
        App::new(store, client, self.config.clone())
    }
}

#[test]
fn fetch_starts_after_the_highest_archived_id() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));

    app.store().ensure_root().unwrap();
    app.store().write_record(ComicId::new(100), "seed").unwrap();

    let result = app.fetch_new(Some(3)).unwrap();
    assert_eq!(result.started_after, 100);
    let ids: Vec<u32> = result.records.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![101, 102, 103]);
}

#[test]
fn failed_ids_are_skipped_without_halting_the_range() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([103]));

    app.store().ensure_root().unwrap();
    app.store().write_record(ComicId::new(100), "seed").unwrap();

    let result = app.fetch_new(Some(10)).unwrap();
    let ids: Vec<u32> = result.records.iter().map(|r| r.id.get()).collect();
    assert_eq!(ids, vec![101, 102, 104, 105, 106, 107, 108, 109, 110]);

    // No record file was written for the failed id.
    assert!(!app.store().record_path(ComicId::new(103)).as_std_path().exists());
    assert!(app.store().record_path(ComicId::new(104)).as_std_path().exists());
}

#[test]
fn summary_needs_at_least_five_records() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));
    let mut rng = StdRng::seed_from_u64(1);

    let records: Vec<ComicRecord> = (1..=4)
        .map(|n| ComicRecord {
            id: ComicId::new(n),
            title: format!("Comic {n}"),
            image: format!("https://imgs.example.com/{n}.png"),
        })
        .collect();

    let written = app.write_summary(&records, &mut rng).unwrap();
    assert!(!written);
    assert!(!fixture.config.summary_path.as_std_path().exists());
}

#[test]
fn short_run_leaves_prior_summary_untouched() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));
    let mut rng = StdRng::seed_from_u64(1);

    std::fs::write(fixture.config.summary_path.as_std_path(), "previous run").unwrap();

    let records = vec![ComicRecord {
        id: ComicId::new(1),
        title: "Only one".to_string(),
        image: "https://imgs.example.com/1.png".to_string(),
    }];
    assert!(!app.write_summary(&records, &mut rng).unwrap());
    assert_eq!(
        std::fs::read_to_string(fixture.config.summary_path.as_std_path()).unwrap(),
        "previous run"
    );
}

#[test]
fn summary_is_overwritten_each_run() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));

    let records: Vec<ComicRecord> = (1..=6)
        .map(|n| ComicRecord {
            id: ComicId::new(n),
            title: format!("Comic {n}"),
            image: format!("https://imgs.example.com/{n}.png"),
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(2);
    assert!(app.write_summary(&records, &mut rng).unwrap());
    let first = std::fs::read_to_string(fixture.config.summary_path.as_std_path()).unwrap();

    let mut rng = StdRng::seed_from_u64(2);
    assert!(app.write_summary(&records, &mut rng).unwrap());
    let second = std::fs::read_to_string(fixture.config.summary_path.as_std_path()).unwrap();

    // Same seed, same sample: a rerun replaces the file with identical
    // content rather than appending to it.
    assert_eq!(first, second);
    assert_eq!(second.matches("# Comic Archive").count(), 1);
}

#[test]
fn full_run_fetches_archives_and_summarizes() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));
    let mut rng = StdRng::seed_from_u64(3);

    let result = app.run(Some(6), &mut rng).unwrap();
    assert_eq!(result.started_after, 0);
    assert_eq!(result.fetched.len(), 6);
    assert_eq!(result.archived.len(), 6);
    assert!(result
        .archived
        .iter()
        .all(|outcome| outcome.action == ArchiveAction::Moved));
    assert!(result.summary_written);

    // Records ended up inside the bucketed tree.
    let archived = fixture
        .config
        .output_root
        .join("0001-1000/0001-0100/0001-0010/0001.md");
    let body = std::fs::read_to_string(archived.as_std_path()).unwrap();
    assert!(body.contains("Comic 1"));
    assert!(body.contains("https://xkcd.example/1"));

    // The next run resumes where this one stopped.
    assert_eq!(app.latest().unwrap(), 6);
}

#[test]
fn latest_is_zero_on_an_empty_archive() {
    let fixture = Fixture::new();
    let app = fixture.app(MockClient::new([]));
    assert_eq!(app.latest().unwrap(), 0);
}
