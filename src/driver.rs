//! Driver - owns the engine and paces cascades between adapter messages
//!
//! The engine never waits. The driver applies inbound commands right away,
//! then releases one cascade step at a time once the previous step's
//! presentation delay has elapsed, broadcasting an observation after each.

use std::time::{Duration, Instant};

use log::{debug, info};

use crate::adapter::{
    build_observation, create_ack, ClientCommand, CommandOutcome, GameConfig, InboundCommand,
    InboundPayload, ObservationMessage, OutboundMessage, RejectionCode,
};
use crate::core::{BoardEngine, CascadeStep, EngineError};
use crate::types::SwapRejection;

pub struct Driver {
    config: GameConfig,
    engine: BoardEngine,
    /// When the next cascade step may run; `None` when no cascade is in flight
    next_step_at: Option<Instant>,
    last_step: Option<CascadeStep>,
    obs_seq: u64,
}

impl Driver {
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        let engine = BoardEngine::initialize(config.engine.clone())?;
        Ok(Self::with_engine(config, engine))
    }

    /// Drive an already-built engine (a restored or hand-made board)
    pub fn with_engine(config: GameConfig, engine: BoardEngine) -> Self {
        Self {
            config,
            engine,
            next_step_at: None,
            last_step: None,
            obs_seq: 0,
        }
    }

    pub fn engine(&self) -> &BoardEngine {
        &self.engine
    }

    pub fn last_step(&self) -> Option<&CascadeStep> {
        self.last_step.as_ref()
    }

    /// Apply one command to the engine, returning one outcome per tap or swap
    pub fn apply(
        &mut self,
        cmd: &ClientCommand,
        now: Instant,
    ) -> Result<Vec<CommandOutcome>, EngineError> {
        let outcomes: Vec<CommandOutcome> = match cmd {
            ClientCommand::Taps(taps) => taps
                .iter()
                .map(|&pos| CommandOutcome::from(self.engine.select_tile(pos)))
                .collect(),
            ClientCommand::Swap { a, b } => {
                let result = self.engine.attempt_swap(*a, *b);
                match result.reason {
                    None => vec![CommandOutcome::Swapped],
                    Some(reason) => vec![CommandOutcome::Rejected {
                        reason: RejectionCode::from(reason),
                    }],
                }
            }
            ClientCommand::Restart => {
                if self.engine.restart()? {
                    self.next_step_at = None;
                    self.last_step = None;
                    vec![CommandOutcome::Restarted {
                        episode_id: self.engine.episode_id(),
                    }]
                } else {
                    vec![CommandOutcome::Rejected {
                        reason: RejectionCode::from(SwapRejection::GateClosed),
                    }]
                }
            }
        };

        if self.engine.is_cascading() && self.next_step_at.is_none() {
            self.next_step_at = Some(now + Duration::from_millis(self.config.swap_ms as u64));
        }
        Ok(outcomes)
    }

    /// Turn one inbound message into the messages the adapter should send
    pub fn handle(
        &mut self,
        inbound: InboundCommand,
        now: Instant,
    ) -> Result<Vec<OutboundMessage>, EngineError> {
        let client_id = inbound.client_id;
        match inbound.payload {
            InboundPayload::SnapshotRequest => Ok(vec![OutboundMessage::ToClientObservation {
                client_id,
                obs: self.observation(),
            }]),
            InboundPayload::Command(cmd) => {
                let outcomes = self.apply(&cmd, now)?;
                debug!("client {} seq {}: {:?}", client_id, inbound.seq, outcomes);
                Ok(vec![
                    OutboundMessage::ToClientAck {
                        client_id,
                        ack: create_ack(inbound.seq, outcomes),
                    },
                    OutboundMessage::BroadcastObservation {
                        obs: self.observation(),
                    },
                ])
            }
        }
    }

    /// Time left before the next cascade step, if one is pending
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.next_step_at
            .map(|at| at.saturating_duration_since(now))
    }

    /// Run the pending cascade step if its delay has elapsed
    pub fn tick(&mut self, now: Instant) -> Result<Option<OutboundMessage>, EngineError> {
        match self.next_step_at {
            Some(at) if at <= now => {}
            _ => return Ok(None),
        }

        let step = self.engine.step_cascade()?;
        self.next_step_at = if step.quiescent {
            None
        } else {
            let pause = self.config.step_ms as u64 + self.config.settle_ms as u64;
            Some(now + Duration::from_millis(pause))
        };
        if step.game_won {
            info!(
                "target {} reached with {}",
                self.engine.target_score(),
                self.engine.score()
            );
        }
        self.last_step = Some(step);

        Ok(Some(OutboundMessage::BroadcastObservation {
            obs: self.observation(),
        }))
    }

    /// Build the next observation (sequence numbers increase per observation)
    pub fn observation(&mut self) -> ObservationMessage {
        self.obs_seq += 1;
        build_observation(&self.engine, self.obs_seq, self.last_step.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::types::Position;

    fn instant_config(seed: u32) -> GameConfig {
        GameConfig {
            engine: EngineConfig {
                seed: Some(seed),
                ..EngineConfig::default()
            },
            swap_ms: 0,
            step_ms: 0,
            settle_ms: 0,
        }
    }

    #[test]
    fn test_swap_schedules_cascade_until_quiescent() {
        let mut driver = Driver::new(instant_config(11)).unwrap();
        let now = Instant::now();

        let cmd = ClientCommand::Swap {
            a: Position::new(0, 0),
            b: Position::new(1, 0),
        };
        assert_eq!(driver.apply(&cmd, now).unwrap(), vec![CommandOutcome::Swapped]);
        assert_eq!(driver.due_in(now), Some(Duration::ZERO));

        let mut steps = 0;
        while driver.tick(now).unwrap().is_some() {
            steps += 1;
            assert!(steps < 1000, "cascade did not settle");
        }
        assert!(driver.last_step().unwrap().quiescent);
        assert!(driver.engine().is_accepting_moves());
        assert_eq!(driver.due_in(now), None);
    }

    #[test]
    fn test_paced_step_waits_for_delay() {
        let mut config = instant_config(11);
        config.swap_ms = 200;
        let mut driver = Driver::new(config).unwrap();
        let now = Instant::now();

        let cmd = ClientCommand::Swap {
            a: Position::new(0, 0),
            b: Position::new(0, 1),
        };
        driver.apply(&cmd, now).unwrap();
        assert!(driver.tick(now).unwrap().is_none());
        assert!(driver
            .tick(now + Duration::from_millis(200))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_snapshot_request_goes_to_requester_only() {
        let mut driver = Driver::new(instant_config(3)).unwrap();
        let out = driver
            .handle(
                InboundCommand {
                    client_id: 4,
                    seq: 1,
                    payload: InboundPayload::SnapshotRequest,
                },
                Instant::now(),
            )
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            OutboundMessage::ToClientObservation { client_id: 4, .. }
        ));
    }

    #[test]
    fn test_restart_waits_for_cascade_to_settle() {
        let mut driver = Driver::new(instant_config(3)).unwrap();
        let now = Instant::now();
        driver
            .apply(
                &ClientCommand::Swap {
                    a: Position::new(2, 2),
                    b: Position::new(2, 3),
                },
                now,
            )
            .unwrap();
        assert!(!driver.engine().is_accepting_moves());

        // Mid-cascade restarts bounce off the closed gate and keep the schedule
        let outcomes = driver.apply(&ClientCommand::Restart, now).unwrap();
        assert_eq!(
            outcomes,
            vec![CommandOutcome::Rejected {
                reason: RejectionCode::from(SwapRejection::GateClosed),
            }]
        );
        assert_eq!(driver.engine().episode_id(), 0);
        assert_eq!(driver.due_in(now), Some(Duration::ZERO));

        while driver.tick(now).unwrap().is_some() {}
        assert!(driver.engine().is_accepting_moves());

        let outcomes = driver.apply(&ClientCommand::Restart, now).unwrap();
        assert_eq!(outcomes, vec![CommandOutcome::Restarted { episode_id: 1 }]);
        assert_eq!(driver.due_in(now), None);
        assert!(driver.last_step().is_none());
        assert!(driver.engine().is_accepting_moves());
    }
}
