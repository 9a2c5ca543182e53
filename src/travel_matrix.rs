//! Travel-matrix builder. Produces an N×N duration matrix (seconds) over a
//! location set, through a cached, TTL-evicting oracle.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use log::warn;
use tokio::sync::Semaphore;

use crate::domain::{Coordinate, RoundedCoordinate};
use crate::oracle::TravelTimeOracle;
use crate::travel_cache::TravelTimeCache;

pub struct TravelMatrix {
    /// `matrix[i][j]` is the duration in seconds from location `i` to `j`.
    pub matrix: Vec<Vec<i64>>,
}

pub async fn build(
    locations: &[Coordinate],
    oracle: &dyn TravelTimeOracle,
    cache: &TravelTimeCache,
    concurrency: usize,
    failure_penalty_seconds: i64,
) -> TravelMatrix {
    let n = locations.len();
    let mut matrix = vec![vec![0i64; n]; n];
    if n == 0 {
        return TravelMatrix { matrix };
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut pending = FuturesUnordered::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let semaphore = semaphore.clone();
            pending.push(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
                let origin = locations[i];
                let destination = locations[j];
                let seconds = resolve(origin, destination, oracle, cache, failure_penalty_seconds).await;
                (i, j, seconds)
            });
        }
    }

    while let Some((i, j, seconds)) = pending.next().await {
        matrix[i][j] = seconds;
    }

    TravelMatrix { matrix }
}

async fn resolve(
    origin: Coordinate,
    destination: Coordinate,
    oracle: &dyn TravelTimeOracle,
    cache: &TravelTimeCache,
    failure_penalty_seconds: i64,
) -> i64 {
    let origin_key = RoundedCoordinate(origin);
    let destination_key = RoundedCoordinate(destination);

    if let Some(cached) = cache.get(origin_key, destination_key).await {
        return cached;
    }

    match oracle.duration_seconds(origin, destination).await {
        Some(seconds) => {
            cache.insert(origin_key, destination_key, seconds).await;
            seconds
        }
        None => {
            warn!("travel oracle failed for ({origin:?} -> {destination:?}); using penalty");
            failure_penalty_seconds
        }
    }
}
