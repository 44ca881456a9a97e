//! Rate-limited sender: a FIFO outbox, a priority lane that bypasses
//! it, and the linear-decay curve governing both.
//!
//! The release decision is a pure function of `(now, last-send, weight,
//! increment, burst)` — callers drive it by passing in `now` rather than
//! the throttle reading a clock itself, which keeps release timing
//! exactly reproducible in a test.

use std::collections::VecDeque;

/// The throttle curve's tunables: hard-wired to sane defaults in the
/// source, exposed here so callers can override them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrottleParams {
    /// Decay rate, message-weight per second. Negative: weight falls over
    /// time.
    pub k: f64,
    /// Weight added to the curve on every release.
    pub increment: f64,
    /// A message may be released only while the decayed weight is below
    /// this.
    pub burst: f64,
}

impl Default for ThrottleParams {
    fn default() -> ThrottleParams {
        ThrottleParams {
            k: -1.2,
            increment: 1.0,
            burst: 3.0,
        }
    }
}

/// One outgoing line plus its bits.
#[derive(Clone, Debug, PartialEq)]
pub struct Outgoing {
    /// The raw line to send, without its trailing CRLF.
    pub line: String,
    /// Suppresses local echo only; never affects throttling.
    pub quiet: bool,
}

impl Outgoing {
    /// A line that should be locally echoed once sent.
    pub fn verbose(line: impl Into<String>) -> Outgoing {
        Outgoing {
            line: line.into(),
            quiet: false,
        }
    }

    /// A line that should not be locally echoed.
    pub fn quiet(line: impl Into<String>) -> Outgoing {
        Outgoing {
            line: line.into(),
            quiet: true,
        }
    }
}

/// Last-send timestamp and the weight recorded at that instant.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Curve {
    last_send: f64,
    weight: f64,
}

/// Rate-limited sender. The queue survives disconnect/reconnect untouched —
/// nothing in this type ever clears it on its own, so a connection
/// supervisor that keeps the same `Throttle` across a reconnect gets the
/// no-silent-message-loss invariant for free.
pub struct Throttle {
    params: ThrottleParams,
    curve: Curve,
    queue: VecDeque<Outgoing>,
    priority: VecDeque<Outgoing>,
}

impl Throttle {
    /// Builds an idle throttle: zero weight, as if the last send were at
    /// time zero.
    pub fn new(params: ThrottleParams) -> Throttle {
        Throttle {
            params,
            curve: Curve {
                last_send: 0.0,
                weight: 0.0,
            },
            queue: VecDeque::new(),
            priority: VecDeque::new(),
        }
    }

    /// Queues a line for ordinary release order.
    pub fn enqueue(&mut self, line: Outgoing) {
        self.queue.push_back(line);
    }

    /// Queues a line on the priority lane: released ahead of `queue`, still
    /// subject to the throttle curve.
    pub fn enqueue_priority(&mut self, line: Outgoing) {
        self.priority.push_back(line);
    }

    /// Whether both lanes are drained.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.priority.is_empty()
    }

    /// The decayed weight at `now`, given the curve recorded at the last
    /// release.
    fn decayed_weight(&self, now: f64) -> f64 {
        (self.curve.weight + self.params.k * (now - self.curve.last_send)).max(0.0)
    }

    /// Releases as many lines as the curve permits at `now`, priority lane
    /// first, each lane in submission order. Updates the curve after each
    /// release so later lines in the same call see the new weight.
    pub fn release(&mut self, now: f64) -> Vec<Outgoing> {
        let mut released = Vec::new();
        loop {
            let from_priority = !self.priority.is_empty();
            if !from_priority && self.queue.is_empty() {
                break;
            }
            let weight = self.decayed_weight(now);
            if weight >= self.params.burst {
                break;
            }
            let line = if from_priority {
                self.priority.pop_front()
            } else {
                self.queue.pop_front()
            }
            .expect("checked non-empty above");
            self.curve.weight = weight + self.params.increment;
            self.curve.last_send = now;
            released.push(line);
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} !~= {}", a, b);
    }

    #[test]
    fn release_decays_weight_across_a_burst_then_a_later_send() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        throttle.enqueue(Outgoing::verbose("one"));
        throttle.enqueue(Outgoing::verbose("two"));
        throttle.enqueue(Outgoing::verbose("three"));

        let released = throttle.release(0.0);
        assert_eq!(released.len(), 3);
        approx(throttle.curve.weight, 3.0);

        throttle.enqueue(Outgoing::verbose("four"));
        let released = throttle.release(0.5);
        assert_eq!(released.len(), 1);
        approx(throttle.curve.weight, 3.4);

        throttle.enqueue(Outgoing::verbose("five"));
        let released = throttle.release(0.5);
        assert!(released.is_empty());
        assert_eq!(throttle.queue.len(), 1);
    }

    #[test]
    fn priority_lane_is_released_before_the_queue() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        throttle.enqueue(Outgoing::verbose("queued"));
        throttle.enqueue_priority(Outgoing::verbose("kick"));
        let released = throttle.release(0.0);
        assert_eq!(released[0].line, "kick");
        assert_eq!(released[1].line, "queued");
    }

    #[test]
    fn quiet_does_not_affect_release_order_or_weight() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        throttle.enqueue(Outgoing::quiet("shh"));
        let before = throttle.curve.weight;
        let released = throttle.release(0.0);
        assert!(released[0].quiet);
        assert!(throttle.curve.weight > before);
    }

    #[test]
    fn weight_decays_to_zero_given_enough_time() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        throttle.enqueue(Outgoing::verbose("a"));
        throttle.release(0.0);
        assert_eq!(throttle.decayed_weight(1000.0), 0.0);
    }

    #[test]
    fn empty_throttle_releases_nothing() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        assert!(throttle.release(0.0).is_empty());
    }

    #[test]
    fn queue_survives_being_left_untouched_across_a_reconnect() {
        let mut throttle = Throttle::new(ThrottleParams::default());
        throttle.enqueue(Outgoing::verbose("still queued"));
        // Simulating a reconnect: nothing but `release` ever drains the
        // queue, so a supervisor that doesn't call it during an outage
        // loses nothing.
        assert!(!throttle.is_empty());
    }
}
