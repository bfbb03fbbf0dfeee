pub const GAMMA_EPSILON: f64 = 1e-10;
pub const CF_FLOOR: f64 = 1e-30;
pub const GAMMA_MAX_ITER: usize = 100;
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

#[cfg(test)]
pub const TEST_STRICT_TOL: f64 = 1e-6;

#[cfg(test)]
pub const TEST_STANDARD_TOL: f64 = 1e-3;

#[cfg(test)]
pub const TEST_LOOSE_TOL: f64 = 1e-2;
