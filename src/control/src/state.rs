use crate::config::CoreConfig;
use crate::profile_target;

// Duty value that leaves the relay de-energised. The drive is active-low:
// 255 is fully off, 0 is maximum heat.
pub const OFF_DUTY: u8 = 255;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    Idle,
    Running,
    Completed,
    Cooldown,
}

// Discrete, pre-debounced user events from the encoder and button.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InputEvent {
    Next,
    Prev,
    Start,
    Cancel,
}

// Signals the platform turns into tones, log lines and immediate redraws.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Notice {
    SelectionChanged,
    Started,
    Cancelled,
    Completed,
    CooledDown,
    ProfileRejected,
    SensorFault,
}

// Snapshot handed to the display on every presentation tick.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StatusFrame {
    pub mode: Mode,
    pub temperature_c: f32,
    pub setpoint_c: f32,
    pub duty: u8,
    pub elapsed_s: f32,
    pub selected: usize,
    pub fault: bool,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ControlOutput {
    pub duty: u8,
    pub notice: Option<Notice>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct PresentationOutput {
    pub frame: StatusFrame,
    pub notice: Option<Notice>,
}

#[derive(Debug)]
pub struct Controller {
    config: CoreConfig,
    mode: Mode,
    selected: usize,
    elapsed_s: f32,
    temperature_c: f32,
    setpoint_c: f32,
    duty: u8,
    integral: f32,
    previous_error: f32,
    fault: bool,
}

impl Controller {
    pub fn new(config: CoreConfig) -> Controller {
        Controller {
            config,
            mode: Mode::Idle,
            selected: 0,
            elapsed_s: 0.0,
            temperature_c: 0.0,
            setpoint_c: 0.0,
            duty: OFF_DUTY,
            integral: 0.0,
            previous_error: 0.0,
            fault: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }

    pub fn setpoint_c(&self) -> f32 {
        self.setpoint_c
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Option<Notice> {
        self.fault = false;
        match (self.mode, event) {
            (Mode::Idle, InputEvent::Next) => {
                let count = self.config.profile_count();
                self.selected = if self.selected >= count {
                    0
                } else {
                    self.selected + 1
                };
                Some(Notice::SelectionChanged)
            }
            (Mode::Idle, InputEvent::Prev) => {
                let count = self.config.profile_count();
                self.selected = if self.selected == 0 {
                    count
                } else {
                    self.selected - 1
                };
                Some(Notice::SelectionChanged)
            }
            (Mode::Idle, InputEvent::Start) => self.start(),
            // The hardware has a single button, so a press while running
            // means cancel just like an explicit cancel would.
            (Mode::Running, InputEvent::Start) | (Mode::Running, InputEvent::Cancel) => {
                self.cancel()
            }
            _ => None,
        }
    }

    fn start(&mut self) -> Option<Notice> {
        let profile = self.config.profile(self.selected)?;
        if profile.validate().is_err() {
            // Keep the previous selection; the run never begins.
            return Some(Notice::ProfileRejected);
        }
        self.mode = Mode::Running;
        self.elapsed_s = 0.0;
        self.setpoint_c = 0.0;
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.duty = OFF_DUTY;
        Some(Notice::Started)
    }

    fn cancel(&mut self) -> Option<Notice> {
        self.mode = Mode::Idle;
        self.selected = 0;
        self.setpoint_c = 0.0;
        self.duty = OFF_DUTY;
        Some(Notice::Cancelled)
    }

    // One pass of the fixed-rate control loop. Always yields a duty so the
    // relay is re-driven every tick; everything except Running drives the
    // off value.
    pub fn control_tick(&mut self, temperature_c: f32) -> ControlOutput {
        self.temperature_c = temperature_c;

        if self.mode != Mode::Running {
            self.duty = OFF_DUTY;
            return ControlOutput {
                duty: OFF_DUTY,
                notice: None,
            };
        }

        if temperature_c < self.config.sensor_floor_c
            || temperature_c > self.config.sensor_ceiling_c
        {
            self.mode = Mode::Idle;
            self.setpoint_c = 0.0;
            self.duty = OFF_DUTY;
            self.fault = true;
            return ControlOutput {
                duty: OFF_DUTY,
                notice: Some(Notice::SensorFault),
            };
        }

        let profile = match self.config.profile(self.selected) {
            Some(profile) => profile,
            None => {
                self.duty = OFF_DUTY;
                return ControlOutput {
                    duty: OFF_DUTY,
                    notice: None,
                };
            }
        };

        // Past the peak window the generator has no rule and the previous
        // setpoint is held until the duration cutoff fires.
        if let Some(target) = profile_target(&profile, self.elapsed_s, temperature_c) {
            self.setpoint_c = target;
        }

        let pid = self.config.pid;
        let error = self.setpoint_c - temperature_c;
        let proportional = pid.kp * error;
        // The accumulator itself is unclamped; only the summed output is.
        // Saturated phases therefore wind the integral up.
        self.integral += pid.ki * error;
        let derivative = pid.kd * (error - self.previous_error);
        self.previous_error = error;

        let output =
            (proportional + self.integral + derivative).clamp(pid.output_min, pid.output_max);

        // Active-low drive: a larger correction pulls the duty value down,
        // which keeps the relay conducting for longer.
        self.duty = (OFF_DUTY as f32 - output) as u8;

        if self.elapsed_s > profile.total_duration_s {
            return self.complete();
        }

        ControlOutput {
            duty: self.duty,
            notice: None,
        }
    }

    fn complete(&mut self) -> ControlOutput {
        self.mode = Mode::Completed;
        self.setpoint_c = 0.0;
        self.elapsed_s = 0.0;
        self.duty = OFF_DUTY;
        ControlOutput {
            duty: OFF_DUTY,
            notice: Some(Notice::Completed),
        }
    }

    // One pass of the slower display loop. Process time advances here and
    // only here, so the profile clock runs at the presentation cadence.
    pub fn presentation_tick(&mut self, period_s: f32) -> PresentationOutput {
        if self.mode == Mode::Running {
            self.elapsed_s += period_s;
        }

        let frame = self.frame();

        let notice = match self.mode {
            // The completion screen is shown for exactly one display
            // period, then cooling begins unconditionally.
            Mode::Completed => {
                self.mode = Mode::Cooldown;
                None
            }
            Mode::Cooldown if self.temperature_c < self.config.cooldown_exit_c => {
                self.mode = Mode::Idle;
                Some(Notice::CooledDown)
            }
            _ => None,
        };

        PresentationOutput { frame, notice }
    }

    pub fn frame(&self) -> StatusFrame {
        StatusFrame {
            mode: self.mode,
            temperature_c: self.temperature_c,
            setpoint_c: self.setpoint_c,
            duty: self.duty,
            elapsed_s: self.elapsed_s,
            selected: self.selected,
            fault: self.fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoreConfig, PidParameters, ThermalProfile};

    fn profile() -> ThermalProfile {
        ThermalProfile {
            preheat_target_c: 140.0,
            soak_target_c: 150.0,
            peak_target_c: 200.0,
            soak_end_s: 90.0,
            peak_end_s: 110.0,
            total_duration_s: 130.0,
            ramp_rate_c_per_s: 1.666,
        }
    }

    fn config() -> CoreConfig {
        CoreConfig {
            profiles: [Some(profile()), Some(profile()), Some(profile()), None],
            pid: PidParameters {
                kp: 2.0,
                ki: 0.0025,
                kd: 9.0,
                output_min: 0.0,
                output_max: 180.0,
            },
            cooldown_exit_c: 40.0,
            sensor_floor_c: 0.0,
            sensor_ceiling_c: 350.0,
        }
    }

    fn running_controller() -> Controller {
        let mut controller = Controller::new(config());
        controller.handle_input(InputEvent::Next);
        let started = controller.handle_input(InputEvent::Start);
        assert_eq!(started, Some(Notice::Started));
        controller
    }

    // Advance the profile clock by whole seconds at the display cadence.
    fn advance(controller: &mut Controller, seconds: u32) {
        for _ in 0..seconds * 2 {
            controller.presentation_tick(0.5);
        }
    }

    #[test]
    fn test_selection_wraps_forward() {
        let mut controller = Controller::new(config());
        for expected in [1, 2, 3, 0, 1] {
            controller.handle_input(InputEvent::Next);
            assert_eq!(controller.selected(), expected);
        }
    }

    #[test]
    fn test_selection_wraps_backward() {
        let mut controller = Controller::new(config());
        for expected in [3, 2, 1, 0, 3] {
            controller.handle_input(InputEvent::Prev);
            assert_eq!(controller.selected(), expected);
        }
    }

    #[test]
    fn test_start_without_selection_stays_idle() {
        let mut controller = Controller::new(config());
        assert_eq!(controller.handle_input(InputEvent::Start), None);
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_start_resets_run_state() {
        let mut controller = running_controller();
        advance(&mut controller, 10);
        controller.control_tick(50.0);
        assert!(controller.elapsed_s() > 0.0);

        controller.handle_input(InputEvent::Cancel);
        controller.handle_input(InputEvent::Next);
        controller.handle_input(InputEvent::Start);
        assert_eq!(controller.mode(), Mode::Running);
        assert_eq!(controller.elapsed_s(), 0.0);
        assert_eq!(controller.duty(), OFF_DUTY);

        // Accumulators were cleared, so the first tick is pure P+I+D of a
        // single error sample: error = 0 - 30 = -30, clamped to 0.
        let output = controller.control_tick(30.0);
        assert_eq!(output.duty, OFF_DUTY);
    }

    #[test]
    fn test_cancel_forces_off_and_clears_selection() {
        let mut controller = running_controller();
        advance(&mut controller, 30);
        controller.control_tick(20.0);
        assert!(controller.duty() < OFF_DUTY);

        let notice = controller.handle_input(InputEvent::Cancel);
        assert_eq!(notice, Some(Notice::Cancelled));
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(controller.selected(), 0);
        assert_eq!(controller.duty(), OFF_DUTY);

        // The very next actuator command is the off value
        let output = controller.control_tick(100.0);
        assert_eq!(output.duty, OFF_DUTY);
    }

    #[test]
    fn test_button_press_while_running_cancels() {
        let mut controller = running_controller();
        let notice = controller.handle_input(InputEvent::Start);
        assert_eq!(notice, Some(Notice::Cancelled));
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_invalid_profile_rejected_at_start() {
        let mut bad = profile();
        bad.peak_end_s = 300.0;
        let mut core = config();
        core.profiles[0] = Some(bad);

        let mut controller = Controller::new(core);
        controller.handle_input(InputEvent::Next);
        let notice = controller.handle_input(InputEvent::Start);
        assert_eq!(notice, Some(Notice::ProfileRejected));
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(controller.selected(), 1);
    }

    #[test]
    fn test_idle_tick_drives_off_value() {
        let mut controller = Controller::new(config());
        let output = controller.control_tick(24.0);
        assert_eq!(output.duty, OFF_DUTY);
        assert_eq!(output.notice, None);
    }

    #[test]
    fn test_proportional_duty_on_first_tick() {
        let mut controller = running_controller();
        advance(&mut controller, 60);

        // Setpoint 99.96, temperature 90: error = 9.96
        // P = 19.92, I = 0.0249, D = 89.64 -> output 109.5849
        let output = controller.control_tick(90.0);
        assert_eq!(output.duty, (255.0 - 109.5849_f32) as u8);
    }

    #[test]
    fn test_duty_clamped_at_maximum_drive() {
        let mut controller = running_controller();
        advance(&mut controller, 80);
        // Huge error saturates the correction at output_max = 180
        let output = controller.control_tick(1.0);
        assert_eq!(output.duty, 255 - 180);
    }

    #[test]
    fn test_duty_clamped_at_off_when_overshooting() {
        let mut controller = running_controller();
        advance(&mut controller, 80);
        // Far above every target: correction clamps at output_min = 0
        let output = controller.control_tick(340.0);
        assert_eq!(output.duty, OFF_DUTY);
    }

    #[test]
    fn test_integral_windup_is_preserved() {
        let mut core = config();
        core.pid = PidParameters {
            kp: 0.0,
            ki: 1.0,
            kd: 0.0,
            output_min: 0.0,
            output_max: 180.0,
        };
        let mut controller = Controller::new(core);
        controller.handle_input(InputEvent::Next);
        controller.handle_input(InputEvent::Start);
        advance(&mut controller, 50);

        // Hold a large error; the accumulator keeps growing past the
        // output clamp because only the sum is bounded.
        for _ in 0..100 {
            controller.control_tick(63.3);
        }
        let output = controller.control_tick(63.3);
        assert_eq!(output.duty, 255 - 180);
        // Error gone, yet the wound-up integral still saturates the drive
        let output = controller.control_tick(controller.setpoint_c());
        assert_eq!(output.duty, 255 - 180);
    }

    #[test]
    fn test_completion_at_duration_cutoff() {
        let mut controller = running_controller();
        advance(&mut controller, 131);

        let output = controller.control_tick(180.0);
        assert_eq!(output.notice, Some(Notice::Completed));
        assert_eq!(output.duty, OFF_DUTY);
        assert_eq!(controller.mode(), Mode::Completed);
        assert_eq!(controller.elapsed_s(), 0.0);
        assert_eq!(controller.setpoint_c(), 0.0);
    }

    #[test]
    fn test_completed_screen_shows_once_then_cooldown() {
        let mut controller = running_controller();
        advance(&mut controller, 131);
        controller.control_tick(180.0);

        let output = controller.presentation_tick(0.5);
        assert_eq!(output.frame.mode, Mode::Completed);
        assert_eq!(output.notice, None);
        assert_eq!(controller.mode(), Mode::Cooldown);

        let output = controller.presentation_tick(0.5);
        assert_eq!(output.frame.mode, Mode::Cooldown);
    }

    #[test]
    fn test_cooldown_holds_until_safe_to_touch() {
        let mut controller = running_controller();
        advance(&mut controller, 131);
        controller.control_tick(180.0);
        controller.presentation_tick(0.5);

        controller.control_tick(120.0);
        let output = controller.presentation_tick(0.5);
        assert_eq!(output.notice, None);
        assert_eq!(controller.mode(), Mode::Cooldown);

        controller.control_tick(39.0);
        let output = controller.presentation_tick(0.5);
        assert_eq!(output.notice, Some(Notice::CooledDown));
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_selection_survives_a_completed_run() {
        let mut controller = running_controller();
        advance(&mut controller, 131);
        controller.control_tick(180.0);
        controller.presentation_tick(0.5);
        controller.control_tick(30.0);
        controller.presentation_tick(0.5);
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(controller.selected(), 1);
    }

    #[test]
    fn test_implausible_reading_aborts_the_run() {
        let mut controller = running_controller();
        advance(&mut controller, 30);

        let output = controller.control_tick(371.4);
        assert_eq!(output.notice, Some(Notice::SensorFault));
        assert_eq!(output.duty, OFF_DUTY);
        assert_eq!(controller.mode(), Mode::Idle);
        assert!(controller.frame().fault);

        // The banner clears on the next user interaction
        controller.handle_input(InputEvent::Next);
        assert!(!controller.frame().fault);
    }

    #[test]
    fn test_time_only_advances_while_running() {
        let mut controller = Controller::new(config());
        controller.presentation_tick(0.5);
        assert_eq!(controller.elapsed_s(), 0.0);

        controller.handle_input(InputEvent::Next);
        controller.handle_input(InputEvent::Start);
        controller.presentation_tick(0.5);
        assert_eq!(controller.elapsed_s(), 0.5);
    }

    #[test]
    fn test_frame_reflects_run_state() {
        let mut controller = running_controller();
        advance(&mut controller, 80);
        controller.control_tick(145.0);

        let frame = controller.frame();
        assert_eq!(frame.mode, Mode::Running);
        assert_eq!(frame.temperature_c, 145.0);
        assert_eq!(frame.setpoint_c, 150.0);
        assert_eq!(frame.elapsed_s, 80.0);
        assert_eq!(frame.selected, 1);
        assert!(!frame.fault);
    }
}
