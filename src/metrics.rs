//! Run-wide counters (§4.7) accumulated across all phases, and the derived
//! figures printed in the stdout summary.

/// Accumulated counters for one simulation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct Metrics {
    pub total_packets: i64,
    pub total_bits_sent: i64,
    pub rb_used_total: i64,
    pub delivered: i64,
    pub deadline_misses: i64,
    pub sum_latency: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_arrival(&mut self) {
        self.total_packets += 1;
    }

    pub fn on_scheduled(&mut self, bits_sent: i64, rb_used: i64) {
        self.total_bits_sent += bits_sent;
        self.rb_used_total += rb_used;
    }

    pub fn on_deliver(&mut self, now: i64, arrival_tti: i64) {
        self.delivered += 1;
        self.sum_latency += (now - arrival_tti).max(0);
    }

    pub fn on_miss(&mut self) {
        self.deadline_misses += 1;
    }

    pub fn average_latency(&self) -> f64 {
        if self.delivered == 0 {
            0.0
        } else {
            self.sum_latency as f64 / self.delivered as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        if self.total_packets == 0 {
            0.0
        } else {
            self.deadline_misses as f64 / self.total_packets as f64
        }
    }

    pub fn rb_utilization(&self, ttis: i64, rb_total: i64) -> f64 {
        let capacity = ttis * rb_total;
        if capacity <= 0 {
            0.0
        } else {
            self.rb_used_total as f64 / capacity as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_latency_is_zero_with_no_deliveries() {
        let m = Metrics::new();
        assert_eq!(m.average_latency(), 0.0);
    }

    #[test]
    fn deliveries_accumulate_latency_and_count() {
        let mut m = Metrics::new();
        m.on_deliver(10, 4);
        m.on_deliver(20, 10);
        assert_eq!(m.delivered, 2);
        assert_eq!(m.sum_latency, 6 + 10);
        assert_eq!(m.average_latency(), 8.0);
    }

    #[test]
    fn miss_rate_divides_by_total_packets() {
        let mut m = Metrics::new();
        m.on_arrival();
        m.on_arrival();
        m.on_miss();
        assert_eq!(m.miss_rate(), 0.5);
    }

    #[test]
    fn rb_utilization_divides_by_capacity() {
        let mut m = Metrics::new();
        m.on_scheduled(0, 50);
        assert_eq!(m.rb_utilization(10, 10), 0.5);
    }
}
