//! Time-stamped parameter automation evaluated against the engine clock.
//!
//! Supports the subset of the usual audio-param model the voice needs: instant
//! sets, linear ramps ending at a time, and cancel-and-hold at the current value.

#[derive(Clone, Copy, Debug, PartialEq)]
enum EventKind {
    Set,
    LinearRamp,
}

#[derive(Clone, Copy, Debug)]
struct AutomationEvent {
    time: f64,
    value: f32,
    kind: EventKind,
}

#[derive(Clone, Debug)]
pub struct AutomationParam {
    origin_time: f64,
    origin_value: f32,
    events: Vec<AutomationEvent>,
}

impl AutomationParam {
    pub fn new(value: f32) -> Self {
        Self {
            origin_time: 0.0,
            origin_value: value,
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            kind: EventKind::Set,
        });
    }

    /// Ramp from the previous event's value, reaching `value` at `end_time`.
    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) {
        self.insert(AutomationEvent {
            time: end_time,
            value,
            kind: EventKind::LinearRamp,
        });
    }

    pub fn cancel_scheduled_values(&mut self, from: f64) {
        self.events.retain(|event| event.time < from);
    }

    /// Drops everything scheduled at or after `time` and pins the param to the
    /// value it had at that instant. Returns the held value.
    pub fn cancel_and_hold_at(&mut self, time: f64) -> f32 {
        let held = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at_time(held, time);
        held
    }

    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_time = self.origin_time;
        let mut prev_value = self.origin_value;

        for event in &self.events {
            if event.time <= time {
                prev_time = event.time;
                prev_value = event.value;
                continue;
            }
            return match event.kind {
                EventKind::Set => prev_value,
                EventKind::LinearRamp => {
                    let span = event.time - prev_time;
                    if span <= 0.0 {
                        event.value
                    } else {
                        let frac = ((time - prev_time) / span) as f32;
                        prev_value + (event.value - prev_value) * frac
                    }
                }
            };
        }

        prev_value
    }

    /// Folds events already in the past into the origin. Keeps evaluation cost
    /// bounded by the number of pending events.
    pub fn prune(&mut self, time: f64) {
        let passed = self.events.iter().take_while(|e| e.time <= time).count();
        if passed == 0 {
            return;
        }
        let anchor = self.events[passed - 1];
        self.origin_time = anchor.time;
        self.origin_value = anchor.value;
        self.events.drain(..passed);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn insert(&mut self, event: AutomationEvent) {
        let index = self
            .events
            .iter()
            .position(|e| e.time > event.time)
            .unwrap_or(self.events.len());
        self.events.insert(index, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn holds_initial_value_without_events() {
        let param = AutomationParam::new(0.25);
        assert_relative_eq!(param.value_at(0.0), 0.25);
        assert_relative_eq!(param.value_at(10.0), 0.25);
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 1.0);
        param.linear_ramp_to_value_at_time(1.0, 2.0);

        assert_relative_eq!(param.value_at(0.5), 0.0);
        assert_relative_eq!(param.value_at(1.5), 0.5);
        assert_relative_eq!(param.value_at(2.0), 1.0);
        assert_relative_eq!(param.value_at(3.0), 1.0);
    }

    #[test]
    fn chained_ramps_continue_from_each_target() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.linear_ramp_to_value_at_time(0.5, 2.0);

        assert_relative_eq!(param.value_at(1.5), 0.75);
    }

    #[test]
    fn cancel_and_hold_mid_ramp_keeps_current_value() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.linear_ramp_to_value_at_time(0.2, 2.0);

        let held = param.cancel_and_hold_at(0.4);
        assert_relative_eq!(held, 0.4, epsilon = 1e-6);
        assert_relative_eq!(param.value_at(0.9), 0.4, epsilon = 1e-6);

        param.linear_ramp_to_value_at_time(0.0, 0.6);
        assert_relative_eq!(param.value_at(0.5), 0.2, epsilon = 1e-6);
        assert_relative_eq!(param.value_at(0.6), 0.0);
    }

    #[test]
    fn prune_preserves_in_flight_ramp() {
        let mut param = AutomationParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.linear_ramp_to_value_at_time(0.0, 3.0);

        let before = param.value_at(2.0);
        param.prune(1.5);
        assert_eq!(param.pending_events(), 1);
        assert_relative_eq!(param.value_at(2.0), before);
    }
}
