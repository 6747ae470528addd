//! Per-user state: the packet queue, cumulative counters, and the channel
//! context that drives this TTI's scheduling decision and feeds the next
//! completion's `HarqEvent`.

use crate::packet::Packet;
use crate::phy::{bits_per_rb_for_cqi, PhySnapshot};
use crate::queue::RingQueue;
use crate::rng::Rng;

/// Default per-UE queue capacity (§4.2).
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// The channel context a completed transport block was sent under, captured
/// at TX time so HARQ feedback samples against conditions that no longer
/// hold for the current TTI. Kept as two distinct variants rather than one
/// `f64` reused for both a per-RB error probability and a TB-level BLER:
/// the two have different units, and conflating them made past ACK/NACK bugs
/// hard to spot.
#[derive(Debug, Clone, Copy)]
pub enum TxContext {
    /// PHY mode: ACK/NACK is sampled per RB against this error probability.
    Phy { rb_err_prob: f64 },
    /// Legacy mode: ACK/NACK is sampled once per transport block against this BLER.
    Legacy { bler: f64 },
}

/// One simulated user equipment: its downlink queue and its current channel view.
pub struct Ue {
    pub id: usize,
    pub cqi: i32,
    pub bits_per_rb: i64,
    pub sinr_db: f64,
    pub tx_context: TxContext,
    pub queue: RingQueue<Packet>,
    pub bits_sent_total: i64,
    pub pkts_delivered: i64,
    pub pkts_missed: i64,
}

impl Ue {
    pub fn new(id: usize, queue_capacity: usize, bler: f64, rng: &mut Rng) -> Self {
        let cqi = rng.int_inclusive(6, 12) as i32;
        Self {
            id,
            cqi,
            bits_per_rb: bits_per_rb_for_cqi(cqi),
            sinr_db: 0.0,
            tx_context: TxContext::Legacy { bler },
            queue: RingQueue::new(queue_capacity),
            bits_sent_total: 0,
            pkts_delivered: 0,
            pkts_missed: 0,
        }
    }

    /// Legacy-mode CQI random walk: step uniform in `{-1, 0, 1}`, clamped to `[1, 15]`.
    pub fn legacy_channel_step(&mut self, bler: f64, rng: &mut Rng) {
        let delta = rng.int_inclusive(-1, 1) as i32;
        self.cqi = (self.cqi + delta).clamp(1, 15);
        self.bits_per_rb = bits_per_rb_for_cqi(self.cqi);
        self.sinr_db = 0.0;
        self.tx_context = TxContext::Legacy { bler };
    }

    /// Apply this TTI's PHY snapshot.
    pub fn apply_phy_snapshot(&mut self, snap: PhySnapshot) {
        self.cqi = snap.cqi;
        self.bits_per_rb = snap.bits_per_rb;
        self.sinr_db = snap.sinr_db;
        self.tx_context = TxContext::Phy {
            rb_err_prob: snap.rb_err_prob,
        };
    }
}
