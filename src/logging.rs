//! Best-effort CSV sinks (§4.10). Each sink opens its file once at start-up
//! and degrades to `None` on failure rather than surfacing an error: a
//! missing `data/` directory should not abort a simulation run.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::harq::{FeedbackKind, FeedbackLogRow};

fn open_sink(path: &str) -> Option<BufWriter<File>> {
    match File::create(path) {
        Ok(f) => Some(BufWriter::new(f)),
        Err(e) => {
            log::warn!("could not open {path} for logging, disabling this sink: {e}");
            None
        }
    }
}

/// Per-TTI scheduler allocation log: one row per UE scheduled that TTI.
pub struct SchedulerLog {
    sink: Option<BufWriter<File>>,
}

impl SchedulerLog {
    /// Opens only if `path` is `Some`, since this sink is entirely optional (§6).
    pub fn new(path: Option<&str>) -> Self {
        let sink = path.and_then(open_sink).map(|mut w| {
            let _ = writeln!(w, "tti,ue,bits_sent,rb_used,cqi,queue_after,hol_deadline");
            w
        });
        Self { sink }
    }

    pub fn log_row(
        &mut self,
        tti: i64,
        ue: usize,
        bits_sent: i64,
        rb_used: i64,
        cqi: i32,
        queue_after: usize,
        hol_deadline: Option<i64>,
    ) {
        let Some(w) = self.sink.as_mut() else {
            return;
        };
        let hol = hol_deadline.map(|d| d.to_string()).unwrap_or_default();
        let _ = writeln!(w, "{tti},{ue},{bits_sent},{rb_used},{cqi},{queue_after},{hol}");
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.sink.as_mut() {
            let _ = w.flush();
        }
    }
}

/// ACK/NACK/DROP event log, always attempted at `data/events.csv`.
pub struct EventsLog {
    sink: Option<BufWriter<File>>,
}

impl EventsLog {
    pub fn new(path: &str) -> Self {
        let sink = open_sink(path).map(|mut w| {
            let _ = writeln!(w, "tti,event,ue,pkt_bits,retx,sinr_db,cqi,rb_alloc,rb_perr");
            w
        });
        Self { sink }
    }

    pub fn log(&mut self, row: &FeedbackLogRow) {
        let Some(w) = self.sink.as_mut() else {
            return;
        };
        let event = match row.kind {
            FeedbackKind::Ack => "ACK",
            FeedbackKind::Nack => "NACK",
            FeedbackKind::Drop => "DROP",
        };
        let _ = writeln!(
            w,
            "{},{},{},{},{},{:.2},{},{},{:.6}",
            row.tti,
            event,
            row.ue_id,
            row.size_bits,
            row.retry_count,
            row.sinr_db_at_tx,
            row.cqi_at_tx,
            row.rb_alloc,
            row.rb_err_prob_at_tx
        );
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.sink.as_mut() {
            let _ = w.flush();
        }
    }
}

/// Per-UE, per-TTI channel snapshot log, opened only in PHY mode.
pub struct ChannelLog {
    sink: Option<BufWriter<File>>,
}

impl ChannelLog {
    pub fn new(path: &str, enabled: bool) -> Self {
        let sink = if enabled { open_sink(path) } else { None }.map(|mut w| {
            let _ = writeln!(w, "tti,ue,sinr_db,cqi,bits_per_rb,rb_err_prob");
            w
        });
        Self { sink }
    }

    pub fn log_row(&mut self, tti: i64, ue: usize, sinr_db: f64, cqi: i32, bits_per_rb: i64, rb_err_prob: f64) {
        let Some(w) = self.sink.as_mut() else {
            return;
        };
        let _ = writeln!(w, "{tti},{ue},{sinr_db:.2},{cqi},{bits_per_rb},{rb_err_prob:.6}");
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.sink.as_mut() {
            let _ = w.flush();
        }
    }
}
