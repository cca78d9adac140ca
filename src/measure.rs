use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, SecondsFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// Running byte count for one transfer. Created right after the connection
/// is established, so setup time never counts toward the elapsed interval.
#[derive(Debug)]
pub struct TransferStats {
    direction: Direction,
    bytes: u64,
    start: Instant,
    started_at: DateTime<Local>,
}

impl TransferStats {
    pub fn start(direction: Direction) -> Self {
        Self {
            direction,
            bytes: 0,
            start: Instant::now(),
            started_at: Local::now(),
        }
    }

    pub fn record(&mut self, n: usize) {
        self.bytes += n as u64;
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stamps the end of the transfer.
    pub fn finish(self) -> Report {
        Report {
            direction: self.direction,
            bytes: self.bytes,
            elapsed: self.start.elapsed(),
            started_at: self.started_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub direction: Direction,
    pub bytes: u64,
    pub elapsed: Duration,
    pub started_at: DateTime<Local>,
}

impl Report {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Decimal kilobytes.
    pub fn kilobytes(&self) -> f64 {
        self.bytes as f64 / 1000.0
    }

    /// `None` when the measured interval is zero and no rate can be derived.
    pub fn megabits_per_second(&self) -> Option<f64> {
        let secs = self.elapsed_seconds();
        if secs > 0.0 {
            Some(self.bytes as f64 * 8.0 / 1e6 / secs)
        } else {
            None
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (noun, rate) = match self.direction {
            Direction::Sent => ("sent", "sending"),
            Direction::Received => ("received", "retrieval"),
        };
        writeln!(
            f,
            "Transfer started: {}",
            self.started_at.to_rfc3339_opts(SecondsFormat::Millis, false)
        )?;
        writeln!(f, "Time elapsed (seconds): {:.6}", self.elapsed_seconds())?;
        writeln!(f, "Total Number of kilobytes {}: {:.6}", noun, self.kilobytes())?;
        match self.megabits_per_second() {
            Some(mbps) => write!(f, "Rate of {} (Mbps): {:.6}", rate, mbps),
            None => write!(f, "Rate of {} (Mbps): n/a", rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(direction: Direction, bytes: u64, elapsed: Duration) -> Report {
        Report {
            direction,
            bytes,
            elapsed,
            started_at: Local::now(),
        }
    }

    #[test]
    fn derived_quantities() {
        let r = report(Direction::Received, 2_500_000, Duration::from_millis(2000));
        assert_eq!(r.elapsed_seconds(), 2.0);
        assert_eq!(r.kilobytes(), 2500.0);
        assert_eq!(r.megabits_per_second(), Some(10.0));
    }

    #[test]
    fn zero_elapsed_rate_is_indeterminate() {
        let r = report(Direction::Sent, 0, Duration::ZERO);
        assert_eq!(r.megabits_per_second(), None);
        assert!(r.to_string().ends_with("Rate of sending (Mbps): n/a"));

        let r = report(Direction::Sent, 1000, Duration::ZERO);
        assert_eq!(r.megabits_per_second(), None);
    }

    #[test]
    fn zero_bytes_with_time_is_zero_rate() {
        let r = report(Direction::Received, 0, Duration::from_micros(3));
        assert_eq!(r.megabits_per_second(), Some(0.0));
    }

    #[test]
    fn rendering() {
        let text = report(Direction::Received, 1500, Duration::from_millis(500)).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Transfer started: "));
        assert_eq!(lines[1], "Time elapsed (seconds): 0.500000");
        assert_eq!(lines[2], "Total Number of kilobytes received: 1.500000");
        assert_eq!(lines[3], "Rate of retrieval (Mbps): 0.024000");

        let text = report(Direction::Sent, 1000, Duration::from_secs(1)).to_string();
        assert!(text.contains("Total Number of kilobytes sent: 1.000000"));
        assert!(text.contains("Rate of sending (Mbps): 0.008000"));
    }

    #[test]
    fn stats_accumulate() {
        let mut stats = TransferStats::start(Direction::Sent);
        stats.record(1000);
        stats.record(0);
        stats.record(250);
        assert_eq!(stats.bytes(), 1250);
        let r = stats.finish();
        assert_eq!(r.bytes, 1250);
        assert_eq!(r.direction, Direction::Sent);
    }
}
