use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use signlabel_core::{eligible, CoverageIndex, LabelEvent, REQUIRED_DISTINCT_USERS};
use std::collections::{BTreeMap, BTreeSet};

const USERS: &[&str] = &["ana", "ben", "cleo", "dev"];
const IMAGES: &[&str] = &["img1", "img2", "img3", "img4", "img5"];

fn random_events(rng: &mut StdRng, len: usize) -> Vec<LabelEvent> {
    (0..len)
        .map(|_| {
            let user = USERS[rng.gen_range(0..USERS.len())];
            let image = IMAGES[rng.gen_range(0..IMAGES.len())];
            LabelEvent::new(user, image, Vec::new())
        })
        .collect()
}

#[test]
fn coverage_equals_distinct_users_for_any_order() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..50 {
        let mut events = random_events(&mut rng, round % 17);
        let expected: BTreeMap<&str, BTreeSet<&str>> =
            events.iter().fold(BTreeMap::new(), |mut acc, event| {
                acc.entry(event.image.as_str())
                    .or_default()
                    .insert(event.user.as_str());
                acc
            });
        let index = CoverageIndex::compute(&events);
        for image in IMAGES {
            let want = expected.get(image).map_or(0, BTreeSet::len);
            assert_eq!(index.coverage(image), want, "round {round} image {image}");
        }

        events.shuffle(&mut rng);
        assert_eq!(CoverageIndex::compute(&events), index);
    }
}

#[test]
fn recomputation_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    let events = random_events(&mut rng, 40);
    assert_eq!(
        CoverageIndex::compute(&events),
        CoverageIndex::compute(&events)
    );
}

#[test]
fn complete_images_never_become_eligible() {
    let mut rng = StdRng::seed_from_u64(99);
    let catalog: Vec<String> = IMAGES.iter().map(|image| image.to_string()).collect();
    let mut events = Vec::new();
    let mut previous: BTreeMap<String, usize> = BTreeMap::new();

    for _ in 0..60 {
        events.extend(random_events(&mut rng, 1));
        let index = CoverageIndex::compute(&events);
        let open = eligible(&catalog, &index);
        for image in &catalog {
            let coverage = index.coverage(image);
            assert!(coverage >= previous.get(image).copied().unwrap_or(0));
            previous.insert(image.clone(), coverage);
            assert_eq!(
                open.contains(image),
                coverage < REQUIRED_DISTINCT_USERS,
                "image {image} with coverage {coverage}"
            );
        }
    }
}
