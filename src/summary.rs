use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::ComicRecord;
use crate::render;

/// Fewer records than this and no summary is produced at all.
pub const MIN_RECORDS: usize = 5;

/// Builds the summary document from the records fetched in one run: the
/// highest id as "latest" plus three picks sampled without replacement from
/// the full list. The sample deliberately does not exclude the latest entry,
/// so a pick may repeat it.
///
/// Returns `None` when there are fewer than [`MIN_RECORDS`] records.
pub fn build_summary<R: Rng>(
    template: &str,
    record_template: &str,
    base_url: &str,
    records: &[ComicRecord],
    rng: &mut R,
) -> Option<String> {
    if records.len() < MIN_RECORDS {
        return None;
    }

    let latest = records.iter().max_by_key(|record| record.id)?;
    let picks: Vec<&ComicRecord> = records.choose_multiple(rng, 3).collect();

    let latest_block = render::render_record(record_template, base_url, latest);
    let pick_blocks = [
        render::render_record(record_template, base_url, picks[0]),
        render::render_record(record_template, base_url, picks[1]),
        render::render_record(record_template, base_url, picks[2]),
    ];

    Some(render::render_summary(template, &latest_block, &pick_blocks))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::domain::ComicId;

    use super::*;

    fn records(count: u32) -> Vec<ComicRecord> {
        (1..=count)
            .map(|n| ComicRecord {
                id: ComicId::new(n),
                title: format!("Comic {n}"),
                image: format!("https://imgs.xkcd.com/comics/{n}.png"),
            })
            .collect()
    }

    #[test]
    fn too_few_records_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = build_summary("$new$", "$index$", "https://xkcd.com", &records(4), &mut rng);
        assert!(result.is_none());
    }

    #[test]
    fn latest_slot_holds_the_highest_id() {
        let mut rng = StdRng::seed_from_u64(0);
        let summary = build_summary(
            "latest=$new$",
            "$index$",
            "https://xkcd.com",
            &records(8),
            &mut rng,
        )
        .unwrap();
        assert!(summary.starts_with("latest=8"));
    }

    #[test]
    fn same_seed_same_summary() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(42);
            build_summary(
                "$new$|$random1$|$random2$|$random3$",
                "$index$",
                "https://xkcd.com",
                &records(10),
                &mut rng,
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn picks_come_from_the_fetched_list() {
        let mut rng = StdRng::seed_from_u64(7);
        let summary = build_summary(
            "$random1$,$random2$,$random3$",
            "$index$",
            "https://xkcd.com",
            &records(6),
            &mut rng,
        )
        .unwrap();
        for pick in summary.split(',') {
            let n: u32 = pick.parse().unwrap();
            assert!((1..=6).contains(&n));
        }
    }
}
