use filterwatch_core::{ChannelName, Hostmask, Nick};
use filterwatch_interface::{Presence, TransportEvent};
use filterwatch_irc::{Action, IrcMessage, Session};

fn session(password: Option<&str>) -> Session {
    Session::new(Nick::new("AbuseBot").unwrap(), password.map(str::to_string))
}

fn feed(session: &mut Session, line: &str) -> Vec<Action> {
    session.handle(&IrcMessage::parse(line).unwrap())
}

fn channel(name: &str) -> ChannelName {
    ChannelName::new(name).unwrap()
}

fn sent(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Send(msg) => Some(msg.to_string()),
            _ => None,
        })
        .collect()
}

fn emitted(actions: Vec<Action>) -> Vec<TransportEvent> {
    actions
        .into_iter()
        .filter_map(|action| match action {
            Action::Emit(event) => Some(event),
            _ => None,
        })
        .collect()
}

#[test]
fn test_registration_lines() {
    let lines: Vec<String> = session(None)
        .registration("Abuse filter relay")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(lines, ["NICK AbuseBot", "USER AbuseBot 0 * :Abuse filter relay"]);

    let lines: Vec<String> = session(Some("hunter2"))
        .registration("relay")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(lines[0], "PASS hunter2");
}

#[test]
fn test_empty_password_is_ignored() {
    let lines = session(Some("")).registration("relay");
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_ping_is_answered_immediately() {
    let mut s = session(None);
    let actions = feed(&mut s, "PING :irc.example.org");
    assert_eq!(
        actions,
        vec![Action::Reply(IrcMessage::new("PONG", ["irc.example.org"]))]
    );
}

#[test]
fn test_welcome_reports_connected() {
    let mut s = session(None);
    let actions = feed(&mut s, ":irc.example.org 001 AbuseBot :Welcome to the network");
    assert!(s.is_registered());
    assert_eq!(emitted(actions), vec![TransportEvent::Connected]);
}

#[test]
fn test_nick_in_use_falls_back_to_underscore() {
    let mut s = session(None);
    let actions = feed(&mut s, ":irc.example.org 433 * AbuseBot :Nickname is already in use.");
    assert_eq!(sent(&actions), ["NICK AbuseBot_"]);
    assert_eq!(s.current().as_str(), "AbuseBot_");

    let actions = feed(&mut s, ":irc.example.org 433 * AbuseBot_ :Nickname is already in use.");
    assert_eq!(sent(&actions), ["NICK AbuseBot__"]);
}

#[test]
fn test_fallback_without_password_keeps_fallback() {
    let mut s = session(None);
    feed(&mut s, ":irc.example.org 433 * AbuseBot :in use");
    let actions = feed(&mut s, ":irc.example.org 001 AbuseBot_ :Welcome");
    assert!(sent(&actions).is_empty());
    assert_eq!(s.current().as_str(), "AbuseBot_");
    assert_eq!(s.desired().as_str(), "AbuseBot");
}

#[test]
fn test_fallback_with_password_ghosts_and_reclaims() {
    let mut s = session(Some("hunter2"));
    feed(&mut s, ":irc.example.org 433 * AbuseBot :in use");
    let actions = feed(&mut s, ":irc.example.org 001 AbuseBot_ :Welcome");
    assert_eq!(
        sent(&actions),
        ["PRIVMSG NickServ :GHOST AbuseBot hunter2", "NICK AbuseBot"]
    );
    assert_eq!(emitted(actions), vec![TransportEvent::Connected]);

    feed(&mut s, ":AbuseBot_!bot@host NICK :AbuseBot");
    assert_eq!(s.current().as_str(), "AbuseBot");
}

#[test]
fn test_nick_is_reclaimed_when_holder_quits() {
    let mut s = session(None);
    feed(&mut s, ":irc.example.org 433 * AbuseBot :in use");
    feed(&mut s, ":irc.example.org 001 AbuseBot_ :Welcome");

    let actions = feed(&mut s, ":AbuseBot!old@host QUIT :Ping timeout");
    assert_eq!(sent(&actions), ["NICK AbuseBot"]);
}

#[test]
fn test_own_join_and_part() {
    let mut s = session(None);
    feed(&mut s, ":irc.example.org 001 AbuseBot :Welcome");

    let actions = feed(&mut s, ":AbuseBot!bot@host JOIN #mod");
    assert_eq!(emitted(actions), vec![TransportEvent::JoinedChannel(channel("#mod"))]);

    let actions = feed(&mut s, ":abusebot!bot@host PART #mod :bye");
    assert_eq!(emitted(actions), vec![TransportEvent::LeftChannel(channel("#mod"))]);
}

#[test]
fn test_being_kicked_is_leaving() {
    let mut s = session(None);
    let actions = feed(&mut s, ":op!o@host KICK #mod AbuseBot :flood");
    assert_eq!(emitted(actions), vec![TransportEvent::LeftChannel(channel("#mod"))]);
}

#[test]
fn test_other_users_presence() {
    let mut s = session(None);
    let actions = feed(&mut s, ":AbuseBot2!b@host JOIN :#mod");
    assert_eq!(
        emitted(actions),
        vec![TransportEvent::UserPresence {
            nick: "AbuseBot2".to_string(),
            channel: channel("#mod"),
            presence: Presence::Joined,
        }]
    );

    let actions = feed(&mut s, ":op!o@host KICK #mod AbuseBot2 :test");
    assert_eq!(
        emitted(actions),
        vec![TransportEvent::UserPresence {
            nick: "AbuseBot2".to_string(),
            channel: channel("#mod"),
            presence: Presence::Left,
        }]
    );

    let actions = feed(&mut s, ":AbuseBot2!b@host QUIT :Quit: restarting");
    assert_eq!(
        emitted(actions),
        vec![TransportEvent::UserQuit {
            nick: "AbuseBot2".to_string(),
            message: "Quit: restarting".to_string(),
        }]
    );
}

#[test]
fn test_names_replies_are_reported_once_complete() {
    let mut s = session(None);
    assert!(feed(&mut s, ":irc.example.org 353 AbuseBot = #mod :@alice +AbuseBot2 AbuseBot").is_empty());
    assert!(feed(&mut s, ":irc.example.org 353 AbuseBot = #mod :carol!c@host").is_empty());
    assert_eq!(
        emitted(feed(&mut s, ":irc.example.org 366 AbuseBot #mod :End of /NAMES list.")),
        vec![TransportEvent::ChannelMembers {
            channel: channel("#mod"),
            nicks: vec!["alice".to_string(), "AbuseBot2".to_string(), "carol".to_string()],
        }]
    );
}

#[test]
fn test_end_of_names_for_empty_channel() {
    let mut s = session(None);
    assert_eq!(
        emitted(feed(&mut s, ":irc.example.org 366 AbuseBot #quiet :End of /NAMES list.")),
        vec![TransportEvent::ChannelMembers {
            channel: channel("#quiet"),
            nicks: Vec::new(),
        }]
    );
}

#[test]
fn test_privmsg_becomes_line() {
    let mut s = session(None);
    let actions = feed(&mut s, ":alice!~alice@wikimedia/alice PRIVMSG #mod :AbuseBot: rehash");
    assert_eq!(
        emitted(actions),
        vec![TransportEvent::Line {
            sender: Hostmask::parse("alice!~alice@wikimedia/alice").unwrap(),
            target: "#mod".to_string(),
            text: "AbuseBot: rehash".to_string(),
        }]
    );
}

#[test]
fn test_server_notices_are_ignored() {
    let mut s = session(None);
    assert!(feed(&mut s, ":irc.example.org PRIVMSG AbuseBot :hello").is_empty());
    assert!(feed(&mut s, ":irc.example.org NOTICE * :*** Looking up your hostname").is_empty());
}
