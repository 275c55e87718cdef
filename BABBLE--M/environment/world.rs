use indexmap::IndexMap;
use rand::{rngs::SmallRng, Rng};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    config::EnvironmentConfig,
    error::EnvironmentError,
    helper::{random_seed, seeded_rng, wrap_unit_angle, EnvironmentTelemetry},
    kinematics::{ArmKinematics, ArmPose, LinearVocalTract, PlanarArm, VocalTract},
    motor::{Effector, MotorCommand},
    objects::{Caregiver, Point, Tool, ToolGrip, Toy, ToyState},
    scenario::ScenarioGenerator,
    sensory::{SensoryOutcome, TrialBuffers},
    sound::{LabelRequest, Recognition, SoundRecognizer, SOUND_DIMS},
    stats::{EnvironmentSnapshot, ExperimentStats, TrialSummary},
    TIMESTEPS,
};

/// Arm, tool, toy, caregiver and voice of the agent's world.
///
/// Entities are only mutated by [`WorldState::advance`], [`WorldState::reset`]
/// and the explicit setters.
pub struct WorldState {
    config: EnvironmentConfig,
    arm: Box<dyn ArmKinematics>,
    vocal: Box<dyn VocalTract>,
    recognizer: SoundRecognizer,
    scenario: ScenarioGenerator,
    tool: Tool,
    toy: Toy,
    caregiver: Caregiver,
    stats: ExperimentStats,
    best_errors_evolution: Vec<IndexMap<String, f64>>,
    last_recognition: Option<Recognition>,
    t: u64,
    rng: SmallRng,
    telemetry: Option<EnvironmentTelemetry>,
}

impl WorldState {
    /// Creates a world with explicit trajectory generators.
    pub fn new(
        config: EnvironmentConfig,
        arm: Box<dyn ArmKinematics>,
        vocal: Box<dyn VocalTract>,
    ) -> Result<Self, EnvironmentError> {
        config.validate()?;
        let recognizer = SoundRecognizer::caregiver_words(config.sound_tol)?;
        let stats = ExperimentStats::new(&recognizer.names());
        let [tx, ty, ta] = config.initial_tool;
        let [ox, oy] = config.initial_toy;
        let [cx, cy] = config.initial_caregiver;
        let rng = seeded_rng(config.seed.unwrap_or_else(random_seed));
        Ok(Self {
            tool: Tool::new(Point::new(tx, ty), ta, config.tool_length),
            toy: Toy::new(Point::new(ox, oy)),
            caregiver: Caregiver::new(Point::new(cx, cy)),
            config,
            arm,
            vocal,
            recognizer,
            scenario: ScenarioGenerator,
            stats,
            best_errors_evolution: Vec::new(),
            last_recognition: None,
            t: 0,
            rng,
            telemetry: None,
        })
    }

    /// World driven by [`PlanarArm`] and [`LinearVocalTract`].
    pub fn with_defaults(config: EnvironmentConfig) -> Result<Self, EnvironmentError> {
        Self::new(
            config,
            Box::new(PlanarArm::default()),
            Box::new(LinearVocalTract::default()),
        )
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Option<EnvironmentTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Runs one trial and returns its sensory outcome.
    ///
    /// Fails without touching any state when both effector ranges are active
    /// or a trajectory generator returns the wrong number of steps.
    pub fn advance(&mut self, command: &MotorCommand) -> Result<SensoryOutcome, EnvironmentError> {
        let effector = command.active_effector()?;
        let arm_trajectory = self.arm.trajectory(command.arm());
        check_steps(arm_trajectory.len())?;
        let vocal_keyframes = match effector {
            Effector::Vocal => {
                let trajectory = self.vocal.trajectory(command.vocal());
                check_steps(trajectory.len())?;
                Some(SoundRecognizer::keyframes_of(&trajectory))
            }
            Effector::Arm => None,
        };

        let context = self.context();
        self.tool.grip = ToolGrip::Free;
        self.toy.state = ToyState::Free;
        let mut buffers = TrialBuffers::new();

        let recognition = vocal_keyframes
            .as_ref()
            .and_then(|keyframes| self.recognizer.recognize_keyframes(keyframes));
        let target_named = match (&recognition, self.recognizer.target()) {
            (Some(recognition), Some(target)) => recognition.sound == target.name,
            _ => false,
        };
        let (handle_sq, hand_sq, tool_sq) = self.config.squared_tolerances();

        for (step, pose) in arm_trajectory.iter().enumerate() {
            let hand = Point::new(pose.x, pose.y);
            if self.tool.is_held() {
                self.grip_tool(pose);
            } else if self.hand_free() && hand.distance_sq(self.tool.handle()) < handle_sq {
                self.grip_tool(pose);
                self.tool.grip = ToolGrip::Held;
            }
            match effector {
                Effector::Arm => self.move_toy(hand, hand_sq, tool_sq),
                Effector::Vocal => {
                    if target_named {
                        self.caregiver
                            .bring_closer(&mut self.toy, self.config.caregiver_gives_obj_factor);
                    }
                }
            }
            buffers.record(
                step,
                hand,
                self.tool.handle(),
                self.toy.position,
                self.caregiver.position,
            );
        }

        let sound = match vocal_keyframes {
            Some(keyframes) => keyframes,
            None => {
                let request = if self.toy.state == ToyState::HeldByHand {
                    LabelRequest::Toy
                } else {
                    LabelRequest::Random
                };
                self.give_label(request)?
            }
        };

        self.stats.record(&TrialSummary {
            effector,
            tool_held: self.tool.is_held(),
            toy_state: self.toy.state,
            produced_sound: recognition.as_ref().map(|r| r.sound.clone()),
            object_given: target_named,
        });
        self.t += 1;
        self.after_trial(effector, recognition.as_ref());
        self.last_recognition = recognition;

        Ok(SensoryOutcome::assemble(context, &buffers, &sound))
    }

    /// Prepares the next trial: re-places the toy every `toy_reset_period`
    /// trials, moves the caregiver, and releases every attachment.
    pub fn reset(&mut self) {
        if self.t % self.config.toy_reset_period == 0 {
            self.toy.position = self.scenario.toy(&mut self.rng);
        }
        self.tool.grip = ToolGrip::Free;
        self.toy.state = ToyState::Free;
        self.caregiver.position = self.scenario.caregiver(&mut self.rng);
    }

    /// Drops the tool somewhere within reach with a random orientation.
    pub fn reset_tool(&mut self) {
        let (position, angle) = self.scenario.tool(&mut self.rng);
        self.set_tool(position, angle);
    }

    /// Keyframes of the word the caregiver says for `request`.
    pub fn give_label(&mut self, request: LabelRequest) -> Result<[f64; SOUND_DIMS], EnvironmentError> {
        let template = match request {
            LabelRequest::Toy => self.recognizer.target(),
            LabelRequest::Random => {
                if self.recognizer.len() < 2 {
                    None
                } else {
                    let index = self.rng.gen_range(1..self.recognizer.len());
                    self.recognizer.get_index(index)
                }
            }
        };
        template.map(|t| t.keyframes).ok_or_else(|| {
            EnvironmentError::UnsupportedLabelRequest(format!("{request:?}").to_lowercase())
        })
    }

    /// [`WorldState::give_label`] for a textual request such as `toy1` or `random`.
    pub fn give_label_for(&mut self, request: &str) -> Result<[f64; SOUND_DIMS], EnvironmentError> {
        self.give_label(request.parse()?)
    }

    /// Tool, toy and caregiver positions, halved.
    #[must_use]
    pub fn context(&self) -> [f64; 6] {
        let p = [
            self.tool.position,
            self.toy.position,
            self.caregiver.position,
        ];
        [
            p[0].x / 2.0,
            p[0].y / 2.0,
            p[1].x / 2.0,
            p[1].y / 2.0,
            p[2].x / 2.0,
            p[2].y / 2.0,
        ]
    }

    /// Places the free tool.
    pub fn set_tool(&mut self, position: Point, angle: f64) {
        self.tool.position = position;
        self.tool.angle = wrap_unit_angle(angle);
        self.tool.grip = ToolGrip::Free;
    }

    /// Places the free toy.
    pub fn set_toy(&mut self, position: Point) {
        self.toy.position = position;
        self.toy.state = ToyState::Free;
    }

    /// Places the caregiver.
    pub fn set_caregiver(&mut self, position: Point) {
        self.caregiver.position = position;
    }

    /// Full snapshot for external persistence.
    #[must_use]
    pub fn save(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            t: self.t,
            human_sounds: self.recognizer.names(),
            best_vocal_errors: self.recognizer.best_errors(),
            best_vocal_errors_evolution: self.best_errors_evolution.clone(),
            stats: self.stats.clone(),
            saved_at: chrono::Utc::now(),
        }
    }

    /// Tool state.
    #[must_use]
    pub const fn tool(&self) -> &Tool {
        &self.tool
    }

    /// Toy state.
    #[must_use]
    pub const fn toy(&self) -> &Toy {
        &self.toy
    }

    /// Caregiver state.
    #[must_use]
    pub const fn caregiver(&self) -> &Caregiver {
        &self.caregiver
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> &ExperimentStats {
        &self.stats
    }

    /// Trials run so far.
    #[must_use]
    pub const fn t(&self) -> u64 {
        self.t
    }

    /// Sound recognizer with its best errors.
    #[must_use]
    pub const fn recognizer(&self) -> &SoundRecognizer {
        &self.recognizer
    }

    /// Recognition made during the last trial.
    #[must_use]
    pub const fn last_recognition(&self) -> Option<&Recognition> {
        self.last_recognition.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Shared RNG, also used for motor babbling.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    fn hand_free(&self) -> bool {
        !self.tool.is_held() && self.toy.state != ToyState::HeldByHand
    }

    fn tool_free(&self) -> bool {
        self.toy.state != ToyState::HeldByTool
    }

    fn grip_tool(&mut self, pose: &ArmPose) {
        let noise = if self.config.handle_noise > 0.0 {
            self.rng
                .gen_range(-self.config.handle_noise..self.config.handle_noise)
        } else {
            0.0
        };
        self.tool.position = Point::new(pose.x, pose.y);
        self.tool.angle = wrap_unit_angle(pose.angle + noise);
    }

    fn move_toy(&mut self, hand: Point, hand_sq: f64, tool_sq: f64) {
        if self.toy.state == ToyState::HeldByHand
            || (self.toy.state == ToyState::Free
                && self.hand_free()
                && hand.distance_sq(self.toy.position) < hand_sq)
        {
            self.toy.position = hand;
            self.toy.state = ToyState::HeldByHand;
        } else {
            let end = self.tool.working_end();
            if self.toy.state == ToyState::HeldByTool
                || (self.toy.state != ToyState::HeldByHand
                    && self.tool_free()
                    && end.distance_sq(self.toy.position) < tool_sq)
            {
                self.toy.position = end;
                self.toy.state = ToyState::HeldByTool;
            }
        }
    }

    fn after_trial(&mut self, effector: Effector, recognition: Option<&Recognition>) {
        if self.t % self.config.snapshot_period == 0 {
            self.best_errors_evolution
                .push(self.recognizer.best_errors());
        }
        let Some(tel) = &self.telemetry else {
            return;
        };
        let _ = tel.log(
            LogLevel::Debug,
            "environment.trial.completed",
            Some(self.t),
            json!({
                "effector": effector.label(),
                "tool_held": self.tool.is_held(),
                "toy_state": format!("{:?}", self.toy.state),
                "sound": recognition.map(|r| r.sound.clone()),
            }),
        );
        if self.t % self.config.report_period == 0 {
            let _ = tel.log(
                LogLevel::Info,
                "environment.best_vocal_errors",
                Some(self.t),
                json!(self.recognizer.best_errors()),
            );
        }
    }
}

fn check_steps(actual: usize) -> Result<(), EnvironmentError> {
    if actual == TIMESTEPS {
        Ok(())
    } else {
        Err(EnvironmentError::DimensionMismatch {
            expected: TIMESTEPS,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        kinematics::scripted::{ScriptedArm, ScriptedVocalTract},
        motor::{ARM_DIMS, MOTOR_DIMS, VOCAL_DIMS},
        sensory::SensoryBlock,
        sound::INITIAL_BEST_ERROR,
        KEYFRAMES,
    };
    use shared_logging::MemoryLogger;
    use std::sync::Arc;

    fn config() -> EnvironmentConfig {
        EnvironmentConfig {
            seed: Some(11),
            ..EnvironmentConfig::default()
        }
    }

    fn scripted_world(arm: ScriptedArm) -> WorldState {
        WorldState::new(config(), Box::new(arm), Box::new(LinearVocalTract::default())).unwrap()
    }

    fn arm_command() -> MotorCommand {
        MotorCommand::from_effector(Effector::Arm, &[0.1; ARM_DIMS]).unwrap()
    }

    fn vocal_command() -> MotorCommand {
        MotorCommand::from_effector(Effector::Vocal, &[0.1; VOCAL_DIMS]).unwrap()
    }

    #[test]
    fn both_effectors_active_is_rejected_without_side_effects() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        let mut values = vec![0.2; MOTOR_DIMS];
        values[0] = 0.5;
        let command = MotorCommand::new(values).unwrap();
        let before = world.save();
        assert!(matches!(
            world.advance(&command),
            Err(EnvironmentError::InvalidMotorCommand { .. })
        ));
        assert_eq!(world.t(), 0);
        assert_eq!(world.save().stats, before.stats);
        assert_eq!(world.save().best_vocal_errors, before.best_vocal_errors);
    }

    #[test]
    fn tool_reaches_toy() {
        // Hand starts on the handle and sweeps right; the working end sits
        // half a unit above the hand and passes over the toy.
        let mut world = scripted_world(ScriptedArm::line((-0.5, 0.0), (0.5, 0.0), 0.5));
        world.set_tool(Point::new(-0.5, 0.0), 0.5);
        world.set_toy(Point::new(0.5, 0.5));
        let outcome = world.advance(&arm_command()).unwrap();
        assert!(world.tool().is_held());
        assert_eq!(world.toy().state, ToyState::HeldByTool);
        assert_eq!(world.stats().count_tool, 1);
        assert_eq!(world.stats().count_toy_by_tool, 1);
        assert_eq!(world.stats().count_toy_by_hand, 0);
        let toy = outcome.block(SensoryBlock::Toy);
        assert!((toy[4] - 0.25).abs() < 1e-9);
        assert!((toy[9] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn tool_stays_held_once_grasped() {
        let mut world = scripted_world(ScriptedArm::line((-0.5, 0.0), (-1.8, -1.8), -0.25));
        world.set_tool(Point::new(-0.5, 0.0), 0.5);
        world.set_toy(Point::new(1.5, 1.5));
        let outcome = world.advance(&arm_command()).unwrap();
        assert!(world.tool().is_held());
        assert_eq!(outcome.block(SensoryBlock::Tool), outcome.block(SensoryBlock::Hand));
        assert!((world.tool().angle + 0.25).abs() < 1e-12);
    }

    #[test]
    fn toy_in_hand_never_switches_to_tool() {
        // The hand grabs the toy first, then passes the handle: the tool must
        // stay on the floor and the toy must stay in hand.
        let mut world = scripted_world(ScriptedArm::line((0.5, 0.5), (-0.5, 0.0), 0.0));
        world.set_toy(Point::new(0.5, 0.5));
        world.set_tool(Point::new(-0.5, 0.0), 0.5);
        let outcome = world.advance(&arm_command()).unwrap();
        assert_eq!(world.toy().state, ToyState::HeldByHand);
        assert!(!world.tool().is_held());
        assert_eq!(outcome.block(SensoryBlock::Toy), outcome.block(SensoryBlock::Hand));
        assert_eq!(world.stats().count_toy_by_hand, 1);
        assert_eq!(world.stats().count_parent_give_label, 1);
        let target = world.recognizer().target().unwrap().keyframes;
        let sound = outcome.block(SensoryBlock::Sound);
        assert!((sound[0] - (target[0] - 8.5)).abs() < 1e-12);
        assert!((sound[5] - (target[5] - 10.25)).abs() < 1e-12);
    }

    #[test]
    fn toy_on_tool_never_switches_to_hand() {
        // The lying tool's working end catches the toy at the first step;
        // the hand reaches the toy later without ever touching the handle.
        let mut world = scripted_world(ScriptedArm::line((1.0, 1.0), (0.5, 0.0), 0.0));
        world.set_tool(Point::new(0.0, 0.0), 0.0);
        world.set_toy(Point::new(0.5, 0.0));
        let outcome = world.advance(&arm_command()).unwrap();
        assert!(!world.tool().is_held());
        assert_eq!(world.toy().state, ToyState::HeldByTool);
        assert_eq!(world.stats().count_toy_by_hand, 0);
        assert_eq!(world.stats().count_parent_give_label, 0);
        let toy = outcome.block(SensoryBlock::Toy);
        assert!(toy[..KEYFRAMES.len()].iter().all(|x| (*x - 0.25).abs() < 1e-9));
        assert!(toy[KEYFRAMES.len()..].iter().all(|y| y.abs() < 1e-9));
    }

    #[test]
    fn toy_out_of_reach_gets_other_label() {
        let mut world = scripted_world(ScriptedArm::line((1.0, 0.0), (1.0, -0.5), 0.0));
        world.set_toy(Point::new(-1.5, 1.5));
        world.set_tool(Point::new(-1.5, -1.5), 0.0);
        let target = world.recognizer().target().unwrap().keyframes;
        for _ in 0..20 {
            let outcome = world.advance(&arm_command()).unwrap();
            assert_eq!(world.toy().state, ToyState::Free);
            let sound = outcome.block(SensoryBlock::Sound);
            assert!((sound[0] - (target[0] - 8.5)).abs() > 1e-9 || (sound[5] - (target[5] - 10.25)).abs() > 1e-9);
        }
    }

    #[test]
    fn exact_target_word_is_recognized_and_toy_given() {
        let target = SoundRecognizer::caregiver_words(0.4)
            .unwrap()
            .target()
            .unwrap()
            .clone();
        let mut world = WorldState::new(
            config(),
            Box::new(PlanarArm::default()),
            Box::new(ScriptedVocalTract {
                keyframes: target.keyframes,
            }),
        )
        .unwrap();
        world.set_toy(Point::new(1.0, 0.0));
        world.set_caregiver(Point::new(0.0, 2.0));
        let outcome = world.advance(&vocal_command()).unwrap();
        let recognition = world.last_recognition().unwrap();
        assert_eq!(recognition.sound, target.name);
        assert!(recognition.error.abs() < 1e-12);
        assert!(world.recognizer().template(&target.name).unwrap().best_error.abs() < 1e-12);
        assert_eq!(world.stats().count_parent_give_object, 1);
        assert_eq!(world.stats().count_produced_sounds[&target.name], 1);
        assert_eq!(world.toy().state, ToyState::Free);
        assert!(world.toy().position.x < 1.0);
        assert!(world.toy().position.y > 0.0);
        let sound = outcome.block(SensoryBlock::Sound);
        assert!((sound[0] - (target.keyframes[0] - 8.5)).abs() < 1e-12);
    }

    #[test]
    fn other_caregiver_word_leaves_toy_in_place() {
        let word = SoundRecognizer::caregiver_words(0.4)
            .unwrap()
            .get_index(1)
            .unwrap()
            .clone();
        let mut world = WorldState::new(
            config(),
            Box::new(PlanarArm::default()),
            Box::new(ScriptedVocalTract {
                keyframes: word.keyframes,
            }),
        )
        .unwrap();
        world.set_toy(Point::new(1.0, 0.0));
        world.set_caregiver(Point::new(0.0, 2.0));
        world.advance(&vocal_command()).unwrap();
        assert_eq!(world.last_recognition().unwrap().sound, word.name);
        assert_eq!(world.stats().count_produced_sounds[&word.name], 1);
        assert_eq!(world.stats().count_parent_give_object, 0);
        assert_eq!(world.toy().position, Point::new(1.0, 0.0));
    }

    #[test]
    fn vocal_trial_skips_hand_transitions() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        world.set_toy(Point::new(0.0, 1.0));
        world.set_tool(Point::new(1.5, -1.5), 0.0);
        world.advance(&vocal_command()).unwrap();
        assert_eq!(world.toy().state, ToyState::Free);
        assert_eq!(world.stats().count_vocal, 1);
    }

    #[test]
    fn best_errors_are_running_minimum() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        let mut previous = world.recognizer().best_errors();
        assert!(previous.values().all(|e| (*e - INITIAL_BEST_ERROR).abs() < f64::EPSILON));
        for _ in 0..30 {
            let command = MotorCommand::babble(Some(Effector::Vocal), world.rng());
            world.advance(&command).unwrap();
            let current = world.recognizer().best_errors();
            for (word, error) in &current {
                assert!(*error <= previous[word]);
            }
            previous = current;
        }
    }

    #[test]
    fn history_snapshot_every_hundred_trials() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        for _ in 0..250 {
            world.advance(&MotorCommand::zeros()).unwrap();
        }
        let snapshot = world.save();
        assert_eq!(snapshot.t, 250);
        assert_eq!(snapshot.best_vocal_errors_evolution.len(), 2);
        assert_eq!(snapshot.stats.count_vocal, 250);
    }

    #[test]
    fn outcome_is_bounded_and_sized() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        for _ in 0..20 {
            let command = MotorCommand::babble(None, world.rng());
            let outcome = world.advance(&command).unwrap();
            assert_eq!(outcome.as_slice().len(), crate::SENSORY_DIMS);
            assert!(outcome.as_slice().iter().all(|v| (-1.0..=1.0).contains(v)));
            world.reset();
        }
    }

    #[test]
    fn context_is_captured_at_trial_start() {
        let mut world = scripted_world(ScriptedArm::line((-0.5, 0.0), (0.5, 0.0), 0.5));
        world.set_tool(Point::new(-0.5, 0.0), 0.5);
        world.set_toy(Point::new(0.5, 0.5));
        world.set_caregiver(Point::new(0.4, 1.6));
        let outcome = world.advance(&arm_command()).unwrap();
        assert_eq!(
            outcome.block(SensoryBlock::Context),
            &[-0.25, 0.0, 0.25, 0.25, 0.2, 0.8]
        );
        let caregiver = outcome.block(SensoryBlock::Caregiver);
        assert!(caregiver[..KEYFRAMES.len()].iter().all(|v| (*v - 0.2).abs() < 1e-12));
    }

    #[test]
    fn reset_releases_attachments_and_moves_caregiver() {
        let mut world = scripted_world(ScriptedArm::line((-0.5, 0.0), (0.5, 0.0), 0.5));
        world.set_tool(Point::new(-0.5, 0.0), 0.5);
        world.set_toy(Point::new(0.5, 0.5));
        world.advance(&arm_command()).unwrap();
        let caregiver = world.caregiver().position;
        world.reset();
        assert!(!world.tool().is_held());
        assert_eq!(world.toy().state, ToyState::Free);
        assert_ne!(world.caregiver().position, caregiver);
    }

    #[test]
    fn reset_tool_places_free_tool_within_reach() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        world.reset_tool();
        assert!(!world.tool().is_held());
        let handle = world.tool().handle();
        assert!(handle.distance_sq(Point::default()) < 1.0);
    }

    #[test]
    fn unknown_label_request_is_not_supported() {
        let mut world = WorldState::with_defaults(config()).unwrap();
        assert!(matches!(
            world.give_label_for("ball"),
            Err(EnvironmentError::UnsupportedLabelRequest(_))
        ));
        let toy = world.give_label_for("toy1").unwrap();
        assert_eq!(toy, world.recognizer().target().unwrap().keyframes);
    }

    #[test]
    fn short_trajectory_is_rejected() {
        let mut world = scripted_world(ScriptedArm { poses: Vec::new() });
        assert!(matches!(
            world.advance(&arm_command()),
            Err(EnvironmentError::DimensionMismatch { expected: 50, actual: 0 })
        ));
        assert_eq!(world.t(), 0);
    }

    #[test]
    fn trials_are_logged() {
        let sink = Arc::new(MemoryLogger::new());
        let telemetry = EnvironmentTelemetry::builder("environment")
            .sink(sink.clone())
            .build()
            .unwrap();
        let mut world = WorldState::with_defaults(config())
            .unwrap()
            .with_telemetry(Some(telemetry));
        world.advance(&MotorCommand::zeros()).unwrap();
        let records = sink.find("environment.trial.completed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trial, Some(1));
        assert_eq!(records[0].metadata["effector"], "vocal");
    }

    #[test]
    fn best_errors_are_reported_every_report_period() {
        let sink = Arc::new(MemoryLogger::new());
        let telemetry = EnvironmentTelemetry::builder("environment")
            .sink(sink.clone())
            .build()
            .unwrap();
        let config = EnvironmentConfig {
            report_period: 3,
            ..config()
        };
        let mut world = WorldState::with_defaults(config)
            .unwrap()
            .with_telemetry(Some(telemetry));
        for _ in 0..7 {
            world.advance(&MotorCommand::zeros()).unwrap();
        }
        let reports = sink.find("environment.best_vocal_errors");
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].trial, Some(3));
        assert_eq!(reports[1].trial, Some(6));
        assert_eq!(reports[1].level, LogLevel::Info);
        let words = world.recognizer().names();
        for word in &words {
            assert!(reports[1].metadata[word.as_str()].is_number());
        }
    }
}
