const M: u32 = 0x7fffffff;
const A: u64 = 16807;

/// A very simple random number generator.  Not especially good at
/// generating truly random bits, but good enough for producing
/// reproducible record sizes in tests.
pub struct Random {
    seed: u32,
}

impl Random {
    pub fn new(seed: u32) -> Self {
        let mut seed = seed & M;
        if seed == 0 || seed == M {
            seed = 1;
        }
        Self { seed }
    }

    pub fn next(&mut self) -> u32 {
        let product = self.seed as u64 * A;
        // product % M
        self.seed = ((product >> 31) + (product & M as u64)) as u32;
        if self.seed > M {
            self.seed -= M;
        }
        self.seed
    }

    /// Returns a value in [0, n).
    pub fn uniform(&mut self, n: u32) -> u32 {
        self.next() % n
    }

    /// Pick "base" uniformly from range [0,max_log] and then return
    /// "base" random bits.  The effect is to pick a number in the range
    /// [0,2^max_log-1] with exponential bias towards smaller numbers.
    pub fn skewed(&mut self, max_log: u32) -> u32 {
        let tmp = 1 << self.uniform(max_log + 1);
        self.uniform(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::Random;

    #[test]
    fn test_random_is_deterministic() {
        let mut a = Random::new(301);
        let mut b = Random::new(301);
        for _ in 0..1000 {
            assert_eq!(a.skewed(17), b.skewed(17));
        }
    }

    #[test]
    fn test_skewed_stays_in_range() {
        let mut rnd = Random::new(17);
        for _ in 0..10000 {
            assert!(rnd.skewed(10) < 1 << 10);
        }
    }
}
