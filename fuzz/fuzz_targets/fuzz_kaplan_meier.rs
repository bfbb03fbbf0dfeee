#![no_main]
use libfuzzer_sys::fuzz_target;
use survival_km::{compute_intervals, Observation};

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }
    let n = (data.len() / 9).min(1000);
    let mut observations = Vec::with_capacity(n);

    for i in 0..n {
        let offset = i * 9;
        let t = f64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
        if t.is_nan() || t.is_infinite() || t < 0.0 {
            return;
        }
        observations.push(Observation::new(t, data[offset + 8] & 1 == 1));
    }

    let population = observations.len();
    if let Ok(intervals) = compute_intervals(observations) {
        let members: usize = intervals.iter().map(|i| i.len()).sum();
        assert!(intervals.is_empty() || members == population);
        for interval in &intervals {
            assert!((0.0..=1.0).contains(&interval.cumulative_survival));
        }
    }
});
