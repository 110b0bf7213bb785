//! Initial load seeding.
//!
//! A density of `d` events per node gives every node `floor(d)` events. The
//! fractional remainder is spread over the grid by position: with
//! `period = floor(1 / frac)`, nodes whose global id is a multiple of `period`
//! get one extra event. No random draws and no coordination are involved, so
//! the total load is the same however the grid is partitioned.

/// Number of events a node seeds at start-up.
///
/// Densities that are negative or not finite seed nothing.
pub fn initial_event_count(event_density: f64, global_id: u64) -> u64 {
    if !event_density.is_finite() || event_density <= 0.0 {
        return 0;
    }

    let whole = event_density.floor();
    let frac = event_density - whole;
    let mut count = whole as u64;

    if frac > 0.0 {
        let period = ((1.0 / frac).floor() as u64).max(1);
        if global_id % period == 0 {
            count += 1;
        }
    }

    count
}
