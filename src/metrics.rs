use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

/// Node-local, mutex-guarded counter set. Deliberately trivial: no history,
/// no percentiles, no cross-node aggregation — just the running totals the
/// `/metrics` contract asks for. `snapshot` takes the lock briefly and
/// never holds it across an RPC.
#[derive(Debug)]
pub struct Metrics {
    node_addr: String,
    started_at: Instant,
    inner: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    total_puts: u64,
    total_gets: u64,
    total_get_hits: u64,
    total_get_misses: u64,
    sum_put_latency_secs: f64,
    sum_get_latency_secs: f64,

    total_chord_lookups: u64,
    sum_chord_hops: u64,

    total_gnutella_queries: u64,
    sum_gnutella_forwarded: u64,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub node: String,
    pub uptime_sec: f64,
    pub kv: KvMetrics,
    pub chord: ChordMetrics,
    pub gnutella: GnutellaMetrics,
}

#[derive(Debug, Serialize)]
pub struct KvMetrics {
    pub total_puts: u64,
    pub total_gets: u64,
    pub total_get_hits: u64,
    pub total_get_misses: u64,
    pub avg_put_latency_sec: f64,
    pub avg_get_latency_sec: f64,
}

#[derive(Debug, Serialize)]
pub struct ChordMetrics {
    pub total_lookups: u64,
    pub avg_hops: f64,
}

#[derive(Debug, Serialize)]
pub struct GnutellaMetrics {
    pub total_queries: u64,
    pub avg_forwarded_per_query: f64,
}

impl Metrics {
    pub fn new(node_addr: impl Into<String>) -> Self {
        Metrics {
            node_addr: node_addr.into(),
            started_at: Instant::now(),
            inner: Mutex::new(Counters::default()),
        }
    }

    pub fn record_put(&self, latency: std::time::Duration) {
        let mut c = self.inner.lock().unwrap();
        c.total_puts += 1;
        c.sum_put_latency_secs += latency.as_secs_f64();
    }

    pub fn record_get(&self, latency: std::time::Duration, hit: bool) {
        let mut c = self.inner.lock().unwrap();
        c.total_gets += 1;
        c.sum_get_latency_secs += latency.as_secs_f64();
        if hit {
            c.total_get_hits += 1;
        } else {
            c.total_get_misses += 1;
        }
    }

    pub fn record_chord_lookup(&self, hops: u64) {
        let mut c = self.inner.lock().unwrap();
        c.total_chord_lookups += 1;
        c.sum_chord_hops += hops;
    }

    pub fn record_gnutella_query(&self, forwarded: u64) {
        let mut c = self.inner.lock().unwrap();
        c.total_gnutella_queries += 1;
        c.sum_gnutella_forwarded += forwarded;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.inner.lock().unwrap();
        let avg = |sum: f64, count: u64| if count == 0 { 0.0 } else { sum / count as f64 };
        MetricsSnapshot {
            node: self.node_addr.clone(),
            uptime_sec: self.started_at.elapsed().as_secs_f64(),
            kv: KvMetrics {
                total_puts: c.total_puts,
                total_gets: c.total_gets,
                total_get_hits: c.total_get_hits,
                total_get_misses: c.total_get_misses,
                avg_put_latency_sec: avg(c.sum_put_latency_secs, c.total_puts),
                avg_get_latency_sec: avg(c.sum_get_latency_secs, c.total_gets),
            },
            chord: ChordMetrics {
                total_lookups: c.total_chord_lookups,
                avg_hops: avg(c.sum_chord_hops as f64, c.total_chord_lookups),
            },
            gnutella: GnutellaMetrics {
                total_queries: c.total_gnutella_queries,
                avg_forwarded_per_query: avg(c.sum_gnutella_forwarded as f64, c.total_gnutella_queries),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn averages_are_zero_with_no_samples() {
        let m = Metrics::new("n1");
        let s = m.snapshot();
        assert_eq!(s.kv.avg_put_latency_sec, 0.0);
        assert_eq!(s.chord.avg_hops, 0.0);
    }

    #[test]
    fn records_accumulate() {
        let m = Metrics::new("n1");
        m.record_put(Duration::from_millis(10));
        m.record_put(Duration::from_millis(30));
        m.record_get(Duration::from_millis(5), true);
        m.record_get(Duration::from_millis(5), false);
        m.record_chord_lookup(3);
        m.record_chord_lookup(5);
        m.record_gnutella_query(2);

        let s = m.snapshot();
        assert_eq!(s.kv.total_puts, 2);
        assert_eq!(s.kv.total_gets, 2);
        assert_eq!(s.kv.total_get_hits, 1);
        assert_eq!(s.kv.total_get_misses, 1);
        assert_eq!(s.chord.total_lookups, 2);
        assert_eq!(s.chord.avg_hops, 4.0);
        assert_eq!(s.gnutella.total_queries, 1);
        assert_eq!(s.gnutella.avg_forwarded_per_query, 2.0);
    }
}
