//! HARQ feedback pipeline (§4.5): a FIFO of in-flight transport blocks
//! awaiting delayed ACK/NACK, processed at the head of every TTI.
//!
//! Because every event shares the same `harq_rtt`, feedback TTIs are
//! non-decreasing in enqueue order, so a single ring buffer processed
//! front-to-back is enough; no priority structure keyed by TTI is needed.

use crate::metrics::Metrics;
use crate::packet::Packet;
use crate::queue::RingQueue;
use crate::rng::Rng;
use crate::ue::{TxContext, Ue};

/// Maximum NACKs a transport block may absorb before it's dropped outright.
pub const MAX_RETRIES: i32 = 4;

/// An in-flight transport block awaiting ACK/NACK, carrying the PHY (or
/// legacy BLER) context it was transmitted under.
pub struct HarqEvent {
    pub ue_id: usize,
    pub feedback_tti: i64,
    pub pkt_arrival_tti: i64,
    pub pkt_deadline_tti: i64,
    pub size_bits: i64,
    pub retry_count: i32,
    pub rb_alloc: i64,
    pub cqi_at_tx: i32,
    pub sinr_db_at_tx: f64,
    pub tx_context: TxContext,
}

/// Outcome of processing one due `HarqEvent`, for the events CSV sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Ack,
    Nack,
    Drop,
}

/// One row worth of event-log detail, mirroring the originating event's
/// TX-time context.
pub struct FeedbackLogRow {
    pub tti: i64,
    pub ue_id: usize,
    pub kind: FeedbackKind,
    pub size_bits: i64,
    pub retry_count: i32,
    pub sinr_db_at_tx: f64,
    pub cqi_at_tx: i32,
    pub rb_alloc: i64,
    pub rb_err_prob_at_tx: f64,
}

/// Bounded FIFO of pending feedback events.
pub struct HarqRing {
    events: RingQueue<HarqEvent>,
}

impl HarqRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RingQueue::new(capacity),
        }
    }

    /// Enqueue a freshly-completed transport block. Returns `false` if the
    /// ring is full, which should not happen in bounded runs (§4.6).
    pub fn enqueue(&mut self, ev: HarqEvent) -> bool {
        self.events.push_back(ev)
    }

    pub fn in_flight(&self) -> usize {
        self.events.len()
    }

    /// Process every event whose `feedback_tti == now`, in FIFO order.
    ///
    /// ACKs finalize the packet into `metrics`. NACKs either re-inject a
    /// fresh `Packet` at the UE's queue head (carrying the accumulated
    /// `retry_count` forward) or, past the retry cap or on a full queue,
    /// drop it as a miss.
    pub fn process_due(
        &mut self,
        now: i64,
        ues: &mut [Ue],
        rng: &mut Rng,
        metrics: &mut Metrics,
    ) -> Vec<FeedbackLogRow> {
        let mut rows = Vec::new();
        while matches!(self.events.peek_front(), Some(ev) if ev.feedback_tti == now) {
            let ev = self.events.pop_front().expect("peeked above");
            let acked = sample_ack(&ev, rng);

            if acked {
                metrics.on_deliver(now, ev.pkt_arrival_tti);
                ues[ev.ue_id].pkts_delivered += 1;
                rows.push(log_row(&ev, FeedbackKind::Ack));
                continue;
            }

            if ev.retry_count >= MAX_RETRIES {
                metrics.on_miss();
                ues[ev.ue_id].pkts_missed += 1;
                rows.push(log_row(&ev, FeedbackKind::Drop));
                continue;
            }

            let retry_packet = Packet {
                bits: ev.size_bits,
                arrival_tti: ev.pkt_arrival_tti,
                deadline_tti: ev.pkt_deadline_tti,
                retry_count: ev.retry_count + 1,
            };
            if ues[ev.ue_id].queue.push_front(retry_packet) {
                rows.push(log_row(&ev, FeedbackKind::Nack));
            } else {
                metrics.on_miss();
                ues[ev.ue_id].pkts_missed += 1;
                rows.push(log_row(&ev, FeedbackKind::Drop));
            }
        }
        rows
    }
}

fn sample_ack(ev: &HarqEvent, rng: &mut Rng) -> bool {
    match ev.tx_context {
        TxContext::Phy { rb_err_prob } => {
            let rb = if ev.rb_alloc > 0 { ev.rb_alloc } else { 1 };
            (0..rb).all(|_| rng.uniform01() > rb_err_prob)
        }
        TxContext::Legacy { bler } => rng.uniform01() > bler,
    }
}

fn log_row(ev: &HarqEvent, kind: FeedbackKind) -> FeedbackLogRow {
    let rb_err_prob_at_tx = match ev.tx_context {
        TxContext::Phy { rb_err_prob } => rb_err_prob,
        TxContext::Legacy { bler } => bler,
    };
    FeedbackLogRow {
        tti: ev.feedback_tti,
        ue_id: ev.ue_id,
        kind,
        size_bits: ev.size_bits,
        retry_count: ev.retry_count,
        sinr_db_at_tx: ev.sinr_db_at_tx,
        cqi_at_tx: ev.cqi_at_tx,
        rb_alloc: ev.rb_alloc,
        rb_err_prob_at_tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ue(id: usize) -> Ue {
        let mut rng = Rng::new(1);
        Ue::new(id, 4, 0.1, &mut rng)
    }

    fn phy_event(retry_count: i32, rb_err_prob: f64) -> HarqEvent {
        HarqEvent {
            ue_id: 0,
            feedback_tti: 10,
            pkt_arrival_tti: 0,
            pkt_deadline_tti: 20,
            size_bits: 800,
            retry_count,
            rb_alloc: 2,
            cqi_at_tx: 10,
            sinr_db_at_tx: 12.0,
            tx_context: TxContext::Phy { rb_err_prob },
        }
    }

    #[test]
    fn perfect_channel_always_acks() {
        let mut ring = HarqRing::new(8);
        ring.enqueue(phy_event(0, 0.0));
        let mut ues = vec![test_ue(0)];
        let mut rng = Rng::new(1);
        let mut metrics = Metrics::new();
        let rows = ring.process_due(10, &mut ues, &mut rng, &mut metrics);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, FeedbackKind::Ack);
        assert_eq!(metrics.delivered, 1);
    }

    #[test]
    fn certain_failure_nacks_and_reinjects_with_incremented_retry_count() {
        let mut ring = HarqRing::new(8);
        ring.enqueue(phy_event(0, 1.0));
        let mut ues = vec![test_ue(0)];
        let mut rng = Rng::new(1);
        let mut metrics = Metrics::new();
        let rows = ring.process_due(10, &mut ues, &mut rng, &mut metrics);
        assert_eq!(rows[0].kind, FeedbackKind::Nack);
        let pkt = ues[0].queue.peek_front().unwrap();
        assert_eq!(pkt.retry_count, 1);
        assert_eq!(pkt.bits, 800);
    }

    #[test]
    fn fifth_failure_drops_instead_of_retrying() {
        let mut ring = HarqRing::new(8);
        ring.enqueue(phy_event(MAX_RETRIES, 1.0));
        let mut ues = vec![test_ue(0)];
        let mut rng = Rng::new(1);
        let mut metrics = Metrics::new();
        let rows = ring.process_due(10, &mut ues, &mut rng, &mut metrics);
        assert_eq!(rows[0].kind, FeedbackKind::Drop);
        assert_eq!(metrics.deadline_misses, 1);
        assert!(ues[0].queue.is_empty());
    }

    #[test]
    fn full_queue_on_reinjection_counts_as_a_miss() {
        let mut ring = HarqRing::new(8);
        ring.enqueue(phy_event(0, 1.0));
        let mut ues = vec![test_ue(0)];
        ues[0].queue.push_back(Packet::new(10, 0, 1));
        ues[0].queue.push_back(Packet::new(10, 0, 1));
        ues[0].queue.push_back(Packet::new(10, 0, 1));
        ues[0].queue.push_back(Packet::new(10, 0, 1));
        assert!(ues[0].queue.is_full());
        let mut rng = Rng::new(1);
        let mut metrics = Metrics::new();
        let rows = ring.process_due(10, &mut ues, &mut rng, &mut metrics);
        assert_eq!(rows[0].kind, FeedbackKind::Drop);
        assert_eq!(metrics.deadline_misses, 1);
    }

    #[test]
    fn events_not_yet_due_are_left_in_place() {
        let mut ring = HarqRing::new(8);
        ring.enqueue(phy_event(0, 0.0));
        let mut ues = vec![test_ue(0)];
        let mut rng = Rng::new(1);
        let mut metrics = Metrics::new();
        let rows = ring.process_due(9, &mut ues, &mut rng, &mut metrics);
        assert!(rows.is_empty());
        assert_eq!(ring.in_flight(), 1);
    }
}
