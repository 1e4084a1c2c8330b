//! Deployment FSM unit tests

use infradeck::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use infradeck::models::deployment::DeploymentStatus;

#[test]
fn test_fsm_happy_path() {
    let mut fsm = DeploymentFsm::new();
    assert_eq!(fsm.state(), DeploymentStatus::Pending);

    fsm.process(DeploymentEvent::Start).unwrap();
    assert_eq!(fsm.state(), DeploymentStatus::InProgress);

    fsm.process(DeploymentEvent::Progress).unwrap();
    fsm.process(DeploymentEvent::Progress).unwrap();
    assert_eq!(fsm.state(), DeploymentStatus::InProgress);

    fsm.process(DeploymentEvent::Complete).unwrap();
    assert_eq!(fsm.state(), DeploymentStatus::Completed);
}

#[test]
fn test_fsm_fails_from_pending_or_running() {
    for status in [DeploymentStatus::Pending, DeploymentStatus::InProgress] {
        let mut fsm = DeploymentFsm::from_status(status);
        fsm.process(DeploymentEvent::Fail).unwrap();
        assert_eq!(fsm.state(), DeploymentStatus::Failed);
    }
}

#[test]
fn test_fsm_final_states_reject_events() {
    for status in [DeploymentStatus::Completed, DeploymentStatus::Failed] {
        let mut fsm = DeploymentFsm::from_status(status);
        assert!(fsm.process(DeploymentEvent::Progress).is_err());
        assert!(fsm.process(DeploymentEvent::Complete).is_err());
        assert!(fsm.process(DeploymentEvent::Start).is_err());
        assert_eq!(fsm.state(), status);
    }
}

#[test]
fn test_fsm_cannot_complete_before_start() {
    let mut fsm = DeploymentFsm::new();
    let err = fsm.process(DeploymentEvent::Complete).unwrap_err();
    assert!(err.contains("Invalid transition"));
    assert_eq!(fsm.state(), DeploymentStatus::Pending);
}
