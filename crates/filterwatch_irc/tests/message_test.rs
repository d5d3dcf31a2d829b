use filterwatch_error::TransportErrorKind;
use filterwatch_irc::IrcMessage;

#[test]
fn test_parse_with_prefix_and_trailing() {
    let msg = IrcMessage::parse(":alice!~alice@wikimedia/alice PRIVMSG #mod :AbuseBot: rehash\r\n")
        .unwrap();
    assert_eq!(msg.prefix(), Some("alice!~alice@wikimedia/alice"));
    assert_eq!(msg.sender_nick(), Some("alice"));
    assert_eq!(msg.command(), "PRIVMSG");
    assert_eq!(msg.param(0), Some("#mod"));
    assert_eq!(msg.param(1), Some("AbuseBot: rehash"));
}

#[test]
fn test_parse_without_prefix() {
    let msg = IrcMessage::parse("PING :irc.example.org").unwrap();
    assert_eq!(msg.prefix(), None);
    assert_eq!(msg.sender_nick(), None);
    assert_eq!(msg.params(), ["irc.example.org"]);
}

#[test]
fn test_parse_numeric_with_middle_params() {
    let msg = IrcMessage::parse(":irc.example.org 353 AbuseBot = #mod :@alice +AbuseBot2 carol")
        .unwrap();
    assert_eq!(msg.command(), "353");
    assert_eq!(msg.params(), ["AbuseBot", "=", "#mod", "@alice +AbuseBot2 carol"]);
}

#[test]
fn test_parse_skips_tags_and_normalizes_case() {
    let msg = IrcMessage::parse("@time=2024-05-01T10:00:00Z :bob!b@host join #mod").unwrap();
    assert_eq!(msg.command(), "JOIN");
    assert_eq!(msg.sender_nick(), Some("bob"));
    assert_eq!(msg.param(0), Some("#mod"));
}

#[test]
fn test_server_prefix_is_its_own_nick() {
    let msg = IrcMessage::parse(":irc.example.org NOTICE * :Looking up your hostname").unwrap();
    assert_eq!(msg.sender_nick(), Some("irc.example.org"));
}

#[test]
fn test_empty_trailing_param_is_kept() {
    let msg = IrcMessage::parse(":bob!b@host QUIT :").unwrap();
    assert_eq!(msg.params(), [""]);
}

#[test]
fn test_parse_rejects_lines_without_command() {
    for line in ["", "\r\n", ":server.only"] {
        let err = IrcMessage::parse(line).unwrap_err();
        assert!(matches!(err.kind, TransportErrorKind::Protocol(_)), "{:?}", line);
    }
}

#[test]
fn test_format_outbound() {
    assert_eq!(IrcMessage::join("#mod").to_string(), "JOIN #mod");
    assert_eq!(
        IrcMessage::privmsg("#mod", "Vandal tripped filter 12").to_string(),
        "PRIVMSG #mod :Vandal tripped filter 12"
    );
    assert_eq!(IrcMessage::privmsg("alice", "ok").to_string(), "PRIVMSG alice ok");
    assert_eq!(
        IrcMessage::user("AbuseBot", "Abuse filter relay").to_string(),
        "USER AbuseBot 0 * :Abuse filter relay"
    );
    assert_eq!(IrcMessage::quit("").to_string(), "QUIT :");
    assert_eq!(IrcMessage::privmsg("#mod", ":-)").to_string(), "PRIVMSG #mod ::-)");
}

#[test]
fn test_formatted_line_parses_back_to_the_same_message() {
    let msg = IrcMessage::privmsg("#mod", "alice: configuration was reloaded successfully.");
    assert_eq!(IrcMessage::parse(&msg.to_string()).unwrap(), msg);
}
