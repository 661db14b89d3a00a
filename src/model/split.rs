use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffles `rows` with a seeded generator and splits off the test share.
///
/// The test set holds `ceil(len * test_ratio)` rows, the same sizing rule
/// the usual dataframe tooling applies, and identical inputs always produce
/// identical splits.
pub fn train_test_split<T>(rows: Vec<T>, test_ratio: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let ratio = test_ratio.clamp(0.0, 1.0);
    let test_len = ((rows.len() as f64) * ratio).ceil() as usize;

    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    let mut test = Vec::with_capacity(test_len);
    let mut train = Vec::with_capacity(slots.len() - test_len);
    for (position, index) in indices.into_iter().enumerate() {
        let Some(row) = slots[index].take() else {
            continue;
        };
        if position < test_len {
            test.push(row);
        } else {
            train.push(row);
        }
    }
    (train, test)
}
