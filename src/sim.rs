//! The simulation core: owns every piece of per-run state and drives the
//! strict 7-phase per-TTI ordering contract (§4.6). `step` is infallible:
//! every failure mode the core can hit has an in-band policy (§7).

use crate::config::Config;
use crate::harq::{HarqEvent, HarqRing};
use crate::logging::{ChannelLog, EventsLog, SchedulerLog};
use crate::metrics::Metrics;
use crate::packet::Packet;
use crate::phy::Phy;
use crate::rng::Rng;
use crate::scheduler::schedule_edf;
use crate::ue::Ue;

pub struct Sim {
    cfg: ConfigSnapshot,
    rng: Rng,
    ues: Vec<Ue>,
    phy: Option<Phy>,
    harq: HarqRing,
    metrics: Metrics,
    scheduler_log: SchedulerLog,
    events_log: EventsLog,
    channel_log: ChannelLog,
    tti: i64,
}

/// The subset of `Config` the running core needs on every TTI, copied out so
/// `Sim` doesn't hold a borrow of the parsed CLI args for its whole lifetime.
#[derive(Clone, Copy)]
struct ConfigSnapshot {
    ttis: i64,
    rb_total: i64,
    deadline_ttis: i64,
    arrival_rate: f64,
    pkt_bits_min: i64,
    pkt_bits_max: i64,
    bler: f64,
    harq_rtt: i64,
}

impl Sim {
    pub fn new(cfg: &Config) -> Self {
        let mut rng = Rng::new(cfg.seed);
        let ues = (0..cfg.ues)
            .map(|id| Ue::new(id, crate::ue::DEFAULT_QUEUE_CAPACITY, cfg.bler, &mut rng))
            .collect();
        let phy = if cfg.phy_enabled() {
            Some(Phy::init(cfg.ues, cfg.phy_params(), &mut rng))
        } else {
            None
        };

        Self {
            cfg: ConfigSnapshot {
                ttis: cfg.ttis,
                rb_total: cfg.rb,
                deadline_ttis: cfg.deadline,
                arrival_rate: cfg.arrival,
                pkt_bits_min: cfg.pkt_bits_min,
                pkt_bits_max: cfg.pkt_bits_max,
                bler: cfg.bler,
                harq_rtt: cfg.harq,
            },
            rng,
            ues,
            phy,
            harq: HarqRing::new(cfg.harq_ring_capacity()),
            metrics: Metrics::new(),
            scheduler_log: SchedulerLog::new(cfg.csv.as_deref()),
            events_log: EventsLog::new("data/events.csv"),
            channel_log: ChannelLog::new("data/channel.csv", cfg.phy_enabled()),
            tti: 0,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn run(&mut self) {
        for _ in 0..self.cfg.ttis {
            self.step();
        }
        self.scheduler_log.flush();
        self.events_log.flush();
        self.channel_log.flush();
    }

    /// Advance the simulation by exactly one TTI. Phase order is load-bearing.
    pub fn step(&mut self) {
        let now = self.tti;

        // 1. Process due HARQ feedback.
        let feedback_rows = self.harq.process_due(now, &mut self.ues, &mut self.rng, &mut self.metrics);
        for row in &feedback_rows {
            self.events_log.log(row);
        }

        // 2. Advance PHY and snapshot, or perform the legacy CQI random walk.
        if let Some(phy) = self.phy.as_mut() {
            phy.step(&mut self.rng);
            for ue in &mut self.ues {
                let snap = phy.snapshot(ue.id);
                ue.apply_phy_snapshot(snap);
                self.channel_log
                    .log_row(now, ue.id, snap.sinr_db, snap.cqi, snap.bits_per_rb, snap.rb_err_prob);
            }
        } else {
            for ue in &mut self.ues {
                ue.legacy_channel_step(self.cfg.bler, &mut self.rng);
            }
        }

        // 3. Arrivals.
        for ue in &mut self.ues {
            if self.rng.uniform01() < self.cfg.arrival_rate {
                let bits = self.rng.int_inclusive(self.cfg.pkt_bits_min, self.cfg.pkt_bits_max);
                let pkt = Packet::new(bits, now, now + self.cfg.deadline_ttis);
                if ue.queue.push_back(pkt) {
                    self.metrics.on_arrival();
                }
            }
        }

        // 4. Deadline expiry: only the head-of-line packet is ever inspected.
        for ue in &mut self.ues {
            while matches!(ue.queue.peek_front(), Some(p) if p.deadline_tti < now) {
                ue.queue.pop_front();
                self.metrics.on_miss();
                ue.pkts_missed += 1;
            }
        }

        // 5. Schedule using the current RB budget.
        let result = schedule_edf(&mut self.ues, self.cfg.rb_total);
        self.metrics.on_scheduled(result.bits_sent_total, result.rb_used);

        // 6. Enqueue completions as HARQ events.
        for c in &result.completions {
            self.harq.enqueue(HarqEvent {
                ue_id: c.ue_id,
                feedback_tti: now + self.cfg.harq_rtt,
                pkt_arrival_tti: c.pkt_arrival_tti,
                pkt_deadline_tti: c.pkt_deadline_tti,
                size_bits: c.size_bits,
                retry_count: c.retry_count,
                rb_alloc: c.rb_alloc,
                cqi_at_tx: c.cqi_at_tx,
                sinr_db_at_tx: c.sinr_db_at_tx,
                tx_context: c.tx_context,
            });
        }

        // 7. Emit per-UE allocation log rows for UEs scheduled this TTI.
        for (idx, ue) in self.ues.iter().enumerate() {
            let bits_this = result.per_ue_bits_sent[idx];
            if bits_this <= 0 {
                continue;
            }
            let rb_used_est = if ue.bits_per_rb > 0 { bits_this / ue.bits_per_rb } else { 0 };
            let hol_deadline = ue.queue.peek_front().map(|p| p.deadline_tti);
            self.scheduler_log
                .log_row(now, ue.id, bits_this, rb_used_est, ue.cqi, ue.queue.len(), hol_deadline);
        }

        self.tti += 1;
    }

    /// Packets still sitting in a UE queue at the end of the run, for the
    /// conservation check (§8).
    pub fn packets_still_queued(&self) -> i64 {
        self.ues.iter().map(|u| u.queue.len() as i64).sum()
    }

    pub fn harq_in_flight(&self) -> i64 {
        self.harq.in_flight() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cfg(args: &[&str]) -> Config {
        let mut full = vec!["sim"];
        full.extend_from_slice(args);
        Config::parse_from(full)
    }

    #[test]
    fn conservation_holds_across_a_short_run() {
        let c = cfg(&[
            "--ttis", "200", "--rb", "10", "--ues", "3", "--arrival", "0.3", "--deadline", "6", "--seed", "7",
        ]);
        let mut sim = Sim::new(&c);
        sim.run();
        let m = sim.metrics();
        let accounted = m.delivered + m.deadline_misses + sim.packets_still_queued() + sim.harq_in_flight();
        assert_eq!(m.total_packets, accounted);
    }

    #[test]
    fn perfect_channel_legacy_mode_delivers_every_arrival() {
        let c = cfg(&[
            "--ttis", "1000", "--rb", "50", "--ues", "1", "--arrival", "0.1", "--bler", "0.0", "--harq", "4",
            "--deadline", "100", "--seed", "7",
        ]);
        let mut sim = Sim::new(&c);
        sim.run();
        let m = sim.metrics();
        assert_eq!(m.deadline_misses, 0);
        assert!(m.average_latency() >= 4.0);
    }

    #[test]
    fn all_nack_trap_drops_every_arrival_after_four_retries() {
        let c = cfg(&[
            "--ttis", "500", "--rb", "100", "--ues", "1", "--arrival", "0.05", "--bler", "1.0", "--harq", "2",
            "--deadline", "100", "--seed", "3",
        ]);
        let mut sim = Sim::new(&c);
        sim.run();
        let m = sim.metrics();
        assert_eq!(m.delivered, 0);
        assert_eq!(m.deadline_misses + sim.harq_in_flight(), m.total_packets);
    }

    #[test]
    fn phy_mode_runs_and_stays_within_documented_ranges() {
        let c = cfg(&[
            "--ttis", "300", "--rb", "25", "--ues", "5", "--phy-mode", "1", "--seed", "11",
        ]);
        let mut sim = Sim::new(&c);
        sim.run();
        let m = sim.metrics();
        assert!(m.rb_utilization(300, 25) <= 1.0 + 1e-9);
    }
}
