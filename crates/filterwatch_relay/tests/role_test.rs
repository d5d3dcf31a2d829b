//! Tests for the master/slave role state machine.

use filterwatch_config::RoleConfig;
use filterwatch_core::Nick;
use filterwatch_relay::{Role, RoleController, RoleOutcome, RoleTransition};

fn slave(auto_failover: bool) -> RoleController {
    RoleController::new(&RoleConfig::Slave {
        master: Nick::new("AbuseBot").expect("Valid nick"),
        auto_failover,
    })
}

#[test]
fn test_initial_roles() {
    assert_eq!(RoleController::new(&RoleConfig::Master).role(), Role::Master);
    assert_eq!(slave(true).role(), Role::Slave);
    assert!(RoleController::new(&RoleConfig::Master).may_post());
    assert!(!slave(true).may_post());
}

#[test]
fn test_posting_gate_is_a_function_of_role() {
    assert!(Role::Master.may_post());
    assert!(Role::SlaveActingMaster.may_post());
    assert!(!Role::Slave.may_post());
}

#[test]
fn test_master_quit_promotes_and_rejoin_reverts() {
    let mut role = slave(true);
    role.observe_join("AbuseBot");
    assert_eq!(role.role(), Role::Slave);

    assert_eq!(role.observe_quit("abusebot"), Some(RoleTransition::Promoted));
    assert_eq!(role.role(), Role::SlaveActingMaster);
    assert!(role.may_post());

    assert_eq!(
        role.observe_join("AbuseBot"),
        Some(RoleTransition::Reverted)
    );
    assert_eq!(role.role(), Role::Slave);
}

#[test]
fn test_master_parting_any_shared_channel_promotes() {
    let mut role = slave(true);
    role.observe_join("AbuseBot");

    assert_eq!(role.observe_part("AbuseBot"), Some(RoleTransition::Promoted));
    assert_eq!(role.role(), Role::SlaveActingMaster);
    assert!(role.may_post());

    assert_eq!(role.observe_part("AbuseBot"), None);
    assert_eq!(role.role(), Role::SlaveActingMaster);
}

#[test]
fn test_member_list_without_master_promotes() {
    let mut role = slave(true);
    let members = vec!["alice".to_string(), "carol".to_string()];
    assert_eq!(role.observe_members(&members), Some(RoleTransition::Promoted));
    assert_eq!(role.role(), Role::SlaveActingMaster);

    let members = vec!["alice".to_string(), "abusebot".to_string()];
    assert_eq!(role.observe_members(&members), Some(RoleTransition::Reverted));
    assert_eq!(role.role(), Role::Slave);
}

#[test]
fn test_member_list_with_master_keeps_slave() {
    let mut role = slave(true);
    assert_eq!(role.observe_members(&["AbuseBot".to_string()]), None);
    assert_eq!(role.role(), Role::Slave);

    let mut master = RoleController::new(&RoleConfig::Master);
    assert_eq!(master.observe_members(&[]), None);
    assert_eq!(master.role(), Role::Master);
}

#[test]
fn test_without_auto_failover_presence_changes_nothing() {
    let mut role = slave(false);
    assert_eq!(role.observe_quit("AbuseBot"), None);
    assert_eq!(role.role(), Role::Slave);

    role.start();
    assert_eq!(role.observe_join("AbuseBot"), None);
    assert_eq!(role.role(), Role::SlaveActingMaster);
}

#[test]
fn test_other_users_are_ignored() {
    let mut role = slave(true);
    assert_eq!(role.observe_quit("SomeoneElse"), None);
    assert_eq!(role.observe_part("SomeoneElse"), None);
    assert_eq!(role.role(), Role::Slave);

    let mut master = RoleController::new(&RoleConfig::Master);
    assert_eq!(master.observe_quit("AbuseBot"), None);
    assert_eq!(master.role(), Role::Master);
}

#[test]
fn test_operator_start_and_stop_on_slave() {
    let mut role = slave(true);
    let master = Nick::new("AbuseBot").expect("Valid nick");

    assert_eq!(role.start(), RoleOutcome::Promoted { master: master.clone() });
    assert_eq!(role.role(), Role::SlaveActingMaster);
    assert_eq!(role.start(), RoleOutcome::AlreadyMaster);

    assert_eq!(role.stop(), RoleOutcome::Demoted { master });
    assert_eq!(role.role(), Role::Slave);
}

#[test]
fn test_stop_on_plain_slave_is_rejected() {
    let mut role = slave(true);
    let outcome = role.stop();
    assert_eq!(outcome, RoleOutcome::AlreadySlave);
    assert!(!outcome.changed());
    assert_eq!(role.role(), Role::Slave);
    assert!(outcome.acknowledgement().contains("already operating in slave mode"));
}

#[test]
fn test_master_rejects_stop_and_start() {
    let mut role = RoleController::new(&RoleConfig::Master);
    assert_eq!(role.stop(), RoleOutcome::RejectedIsMaster);
    assert_eq!(role.start(), RoleOutcome::AlreadyMaster);
    assert_eq!(role.role(), Role::Master);
    assert_eq!(
        RoleOutcome::RejectedIsMaster.acknowledgement(),
        "wrong bot? I'm the master one."
    );
}
