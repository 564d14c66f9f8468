/*!
Un-normalized categorical sampling.

The sampler never normalizes the conditional topic weights it computes.
Instead a uniform value in `[0, 1)` is scaled by the total mass of the
weights and the first index whose running sum reaches it is selected.

# Examples

```rust
use gibbs_lda::distributions::{accumulative_index, sample_accumulative};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let weights = [1.0, 2.0, 1.0];
// Draw 0.5 scales to 2.0, which the running sum 1.0, 3.0 first reaches at index 1.
assert_eq!(accumulative_index(&weights, 0.5), Some(1));

let mut rng = SmallRng::seed_from_u64(42);
let topic = sample_accumulative(&weights, &mut rng).unwrap();
assert!(topic < weights.len());
```
*/

use rand::Rng;

/**
Selects an index from un-normalized `weights` given a uniform value `u` in `[0, 1)`.

The draw is `u * sum(weights)`; the result is the first index whose cumulative
sum is greater than or equal to the draw. Returns `None` when no index
qualifies: for empty or negative weights, or when the total mass is not finite.
*/
pub fn accumulative_index(weights: &[f64], u: f64) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() {
        return None;
    }
    let choice = u * total;

    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= choice {
            return Some(i);
        }
    }
    None
}

/// Draws an index from un-normalized `weights` using `rng` as the uniform source.
pub fn sample_accumulative<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    accumulative_index(weights, rng.gen::<f64>())
}
