use crawl_common::CrawlError;
use uuid::Uuid;

/// `[00000000-...-000000000000, ffffffff-...-ffffffffffff]`, the full
/// 128-bit UUID space treated as an unsigned integer (§11.1, GLOSSARY
/// "Partition extents").
pub const MIN: Uuid = Uuid::nil();
pub const MAX: Uuid = Uuid::max();

/// Divides the full UUID space into `num_partitions` equal-width half-open
/// intervals and returns the one assigned to `partition`.
///
/// The final partition's upper bound is clamped to [`MAX`] itself rather
/// than computed as `MIN + num_partitions * width`, since that value would
/// overflow a 128-bit integer by exactly one unit (the space spans `2^128`
/// values, one more than `u128::MAX` can represent). This matches the
/// original implementation's behavior exactly — it never overflows, at the
/// cost of the single UUID equal to `MAX` itself not being distinctly
/// addressable as "one past the final partition".
pub fn partition_extents(num_partitions: u32, partition: u32) -> Result<(Uuid, Uuid), CrawlError> {
    if num_partitions == 0 {
        return Err(CrawlError::Config("num_partitions must be greater than zero".into()));
    }
    if partition >= num_partitions {
        return Err(CrawlError::Config(format!(
            "partition {partition} is out of range for {num_partitions} partitions"
        )));
    }

    // `2^128 / num_partitions` can't be computed directly (`2^128` itself
    // overflows u128 by one). `u128::MAX / n + 1` is equivalent except when
    // `n == 1`, where it overflows on the `+ 1`; in that case the result is
    // never actually used (`from` multiplies it by partition `0`, and the
    // single partition's `to` bound is the `MAX`-clamp branch below), so
    // wrapping is safe here.
    let width = (u128::MAX / num_partitions as u128).wrapping_add(1);
    let from = width.checked_mul(partition as u128).unwrap_or(u128::MAX);
    let to = if partition + 1 == num_partitions {
        u128::MAX
    } else {
        width
            .checked_mul((partition + 1) as u128)
            .unwrap_or(u128::MAX)
    };

    Ok((Uuid::from_u128(from), Uuid::from_u128(to)))
}
