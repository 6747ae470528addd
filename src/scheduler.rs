//! Earliest-deadline-first resource-block scheduler (§4.4).

use crate::ue::{TxContext, Ue};

/// A transport block that finished transmission this TTI and is now ready to
/// become a `HarqEvent`. `size_bits` is the payload actually outstanding on
/// the completing TTI, not the RB-rounded-up channel capacity spent on it:
/// the last allocation often overshoots (an integral number of RBs rarely
/// lands exactly on the remaining bits), so the overshoot is subtracted back
/// out before the size is recorded.
pub struct Completion {
    pub ue_id: usize,
    pub pkt_arrival_tti: i64,
    pub pkt_deadline_tti: i64,
    pub size_bits: i64,
    pub rb_alloc: i64,
    pub cqi_at_tx: i32,
    pub sinr_db_at_tx: f64,
    pub tx_context: TxContext,
    /// Carried over from the packet so a retransmission's HARQ event still
    /// counts against the original packet's retry cap.
    pub retry_count: i32,
}

/// Result of one TTI's scheduling pass.
pub struct ScheduleResult {
    pub bits_sent_total: i64,
    pub rb_used: i64,
    pub completions: Vec<Completion>,
    /// Bits sent this TTI, indexed by UE id; zero for UEs that weren't scheduled.
    pub per_ue_bits_sent: Vec<i64>,
}

/// Run EDF scheduling for one TTI against an `rb_budget`.
///
/// Repeatedly picks the UE with a non-empty queue whose head-of-line packet
/// has the earliest absolute deadline (ties broken by lowest UE id, i.e. scan
/// order), and allocates RBs to finish or partially serve that packet, until
/// either the budget is exhausted or no UE has queued data.
pub fn schedule_edf(ues: &mut [Ue], rb_budget: i64) -> ScheduleResult {
    let mut budget = rb_budget;
    let mut bits_sent_total = 0i64;
    let mut rb_used = 0i64;
    let mut completions = Vec::with_capacity(ues.len());
    let mut per_ue_bits_sent = vec![0i64; ues.len()];

    while budget > 0 {
        let Some(idx) = pick_earliest_deadline(ues) else {
            break;
        };
        let ue = &mut ues[idx];
        let bprb = ue.bits_per_rb;

        if bprb <= 0 {
            // Defensive no-progress case: burn one RB so the loop always terminates.
            budget -= 1;
            rb_used += 1;
            continue;
        }

        let remaining = ue.queue.peek_front().expect("idx was selected for having a HoL packet").bits;
        let rb_needed = ((remaining + bprb - 1) / bprb).max(1);
        let rb_alloc = rb_needed.min(budget);
        let bits_this = rb_alloc * bprb;

        let pkt = ue.queue.peek_front_mut().expect("checked above");
        pkt.bits -= bits_this;
        ue.bits_sent_total += bits_this;
        per_ue_bits_sent[idx] += bits_this;
        bits_sent_total += bits_this;
        budget -= rb_alloc;
        rb_used += rb_alloc;

        if pkt.bits <= 0 {
            let finished = ue.queue.pop_front().expect("just peeked it");
            completions.push(Completion {
                ue_id: ue.id,
                pkt_arrival_tti: finished.arrival_tti,
                pkt_deadline_tti: finished.deadline_tti,
                size_bits: (bits_this + finished.bits).max(0),
                rb_alloc,
                cqi_at_tx: ue.cqi,
                sinr_db_at_tx: ue.sinr_db,
                tx_context: ue.tx_context,
                retry_count: finished.retry_count,
            });
        }
    }

    ScheduleResult {
        bits_sent_total,
        rb_used,
        completions,
        per_ue_bits_sent,
    }
}

fn pick_earliest_deadline(ues: &[Ue]) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, ue) in ues.iter().enumerate() {
        let Some(pkt) = ue.queue.peek_front() else {
            continue;
        };
        match best {
            Some((_, best_deadline)) if pkt.deadline_tti >= best_deadline => {}
            _ => best = Some((idx, pkt.deadline_tti)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use crate::rng::Rng;

    fn ue_with_packet(id: usize, bits: i64, deadline: i64) -> Ue {
        let mut rng = Rng::new(1);
        let mut ue = Ue::new(id, 16, 0.1, &mut rng);
        ue.bits_per_rb = 100;
        ue.queue.push_back(Packet::new(bits, 0, deadline));
        ue
    }

    #[test]
    fn picks_earliest_deadline_first() {
        let mut ues = vec![ue_with_packet(0, 100, 10), ue_with_packet(1, 100, 5)];
        let result = schedule_edf(&mut ues, 1);
        assert_eq!(result.completions.len(), 1);
        assert_eq!(result.completions[0].ue_id, 1);
    }

    #[test]
    fn ties_broken_by_lowest_ue_id() {
        let mut ues = vec![ue_with_packet(0, 1000, 10), ue_with_packet(1, 1000, 10)];
        let result = schedule_edf(&mut ues, 1);
        assert_eq!(result.per_ue_bits_sent[0], 100);
        assert_eq!(result.per_ue_bits_sent[1], 0);
    }

    #[test]
    fn partial_packet_stays_at_head_without_completion() {
        let mut ues = vec![ue_with_packet(0, 1000, 10)];
        let result = schedule_edf(&mut ues, 1);
        assert!(result.completions.is_empty());
        assert_eq!(ues[0].queue.peek_front().unwrap().bits, 900);
    }

    #[test]
    fn rb_usage_never_exceeds_budget() {
        let mut ues: Vec<Ue> = (0..5).map(|i| ue_with_packet(i, 50_000, 10)).collect();
        let result = schedule_edf(&mut ues, 7);
        assert!(result.rb_used <= 7);
    }

    #[test]
    fn no_progress_case_burns_one_rb_and_terminates() {
        let mut ues = vec![ue_with_packet(0, 100, 10)];
        ues[0].bits_per_rb = 0;
        let result = schedule_edf(&mut ues, 3);
        assert_eq!(result.rb_used, 3);
        assert_eq!(result.bits_sent_total, 0);
    }

    #[test]
    fn empty_queues_produce_no_work() {
        let mut ues: Vec<Ue> = (0..3).map(|i| ue_with_packet(i, 0, 0)).collect();
        for ue in &mut ues {
            ue.queue.pop_front();
        }
        let result = schedule_edf(&mut ues, 10);
        assert_eq!(result.rb_used, 0);
        assert!(result.completions.is_empty());
    }
}
