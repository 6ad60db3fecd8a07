use cutoff_model::JitterStrategy;

use crate::resilient::Jitter;

pub fn to_jitter(s: JitterStrategy) -> Jitter {
    match s {
        JitterStrategy::Decorrelated => Jitter::Decorrelated,
        JitterStrategy::Equal => Jitter::Equal,
        JitterStrategy::Full => Jitter::Full,
        JitterStrategy::None => Jitter::None,
    }
}
