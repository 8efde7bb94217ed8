//! Minimum-cost perfect assignment on a square cost matrix.
//!
//! Hungarian algorithm with row/column potentials, O(n³).

/// Solve the assignment problem for a square `costs` matrix.
///
/// Returns `assignment` where row `r` is matched to column `assignment[r]`,
/// minimising the sum of `costs[r][assignment[r]]`. Ties resolve toward
/// lower column indices, scanning rows in order.
pub(crate) fn solve(costs: &[Vec<i64>]) -> Vec<usize> {
    let n = costs.len();
    debug_assert!(costs.iter().all(|row| row.len() == n));

    // 1-based internally; index 0 is the virtual column used to seed each row.
    let mut row_potential = vec![0i64; n + 1];
    let mut col_potential = vec![0i64; n + 1];
    let mut owner = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![i64::MAX; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[col0] = true;
            let row0 = owner[col0];
            let mut delta = i64::MAX;
            let mut col1 = 0;

            for col in 1..=n {
                if used[col] {
                    continue;
                }
                let slack = costs[row0 - 1][col - 1] - row_potential[row0] - col_potential[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=n {
                if used[col] {
                    row_potential[owner[col]] += delta;
                    col_potential[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        // Flip the augmenting path back to the virtual column.
        loop {
            let col1 = way[col0];
            owner[col0] = owner[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for col in 1..=n {
        assignment[owner[col] - 1] = col - 1;
    }
    assignment
}
