#![no_main]
use libfuzzer_sys::fuzz_target;
use survival_km::{compare_cohorts, Observation};

// Each record is 3 bytes: cohort selector, time, censoring flag.
fuzz_target!(|data: &[u8]| {
    let mut cohorts: Vec<Vec<Observation<u8>>> = vec![Vec::new(); 3];
    for record in data.chunks_exact(3).take(3000) {
        let cohort = usize::from(record[0] % 3);
        cohorts[cohort].push(Observation::new(record[1], record[2] & 1 == 1));
    }
    cohorts.retain(|cohort| !cohort.is_empty());

    if let Ok(result) = compare_cohorts(cohorts) {
        assert!(result.chi_squared >= 0.0);
        assert!((0.0..=1.0).contains(&result.p_value));
    }
});
