#[macro_use]
extern crate bencher;

use bencher::Bencher;
use samskara::fuzzy::{self, new_cache};

const CANDIDATES: &[&str] = &[
    "krishna", "kṛṣṇa", "dharma", "karma", "yoga", "vāsiṣṭha", "vasistha", "upaniṣad",
    "bhagavān", "arjuna", "brahman", "ātman", "mokṣa", "saṃsāra", "prakṛti", "puruṣa",
    "avatāra", "guru", "mantra", "yajña",
];

fn exact_match(bench: &mut Bencher) {
    let mut cache = new_cache(10_000, 5_000_000);
    bench.iter(|| fuzzy::best_match("krishna", CANDIDATES, 3, 0.5, &mut cache));
}

fn near_miss_match(bench: &mut Bencher) {
    let mut cache = new_cache(10_000, 5_000_000);
    bench.iter(|| fuzzy::best_match("krisnaa", CANDIDATES, 3, 0.3, &mut cache));
}

fn cold_cache_every_call(bench: &mut Bencher) {
    bench.iter(|| {
        let mut cache = new_cache(10_000, 5_000_000);
        fuzzy::best_match("vasishta", CANDIDATES, 3, 0.3, &mut cache)
    });
}

benchmark_group!(fuzzy, exact_match, near_miss_match, cold_cache_every_call);
benchmark_main!(fuzzy);
